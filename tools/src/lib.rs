pub mod config;
pub mod export;
pub mod scene_stats;

pub use config::ToolConfig;
pub use export::{write_index, write_weights};
pub use scene_stats::{collect_partition_stats, PartitionStats};

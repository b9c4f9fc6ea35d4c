//! Shared clap argument groups for the segmentation indexing tools.

pub mod common;

pub use common::{ArtifactFormat, DatasetArgs, DatasetOpts, ExportOutputArgs, ExportOutputOpts};

//! Error definitions and result alias for seg_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Configuration problems detected before or while building partitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration cardinality mismatch: {what} has {got} entries, expected {expected}")]
    CardinalityMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unsupported configuration: a sampling index is required for training (partition {partition})")]
    MissingSamplingIndex { partition: usize },
    #[error("partition {partition} disagrees with the composite on its {what}")]
    InconsistentPartition {
        partition: usize,
        what: &'static str,
    },
    #[error("no annotation sources provided")]
    NoPartitions,
    #[error("an output directory is required to show results")]
    MissingOutputDir,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("partition {partition}: sampling index value {value} at position {position} is out of range for {scene_count} scenes")]
    IndexOutOfRange {
        partition: usize,
        position: usize,
        value: i64,
        scene_count: usize,
    },
    #[error("label weight vector has {got} entries, expected {expected}")]
    WeightLength { expected: usize, got: usize },
    #[error("label weight at position {position} is invalid: {value}")]
    InvalidWeight { position: usize, value: f32 },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {path} could not be read: {msg}")]
    Artifact { path: PathBuf, msg: String },
    #[error("annotation contract violated: {0}")]
    Contract(#[from] data_contracts::ValidationError),
    #[error("render failed at {path}: {msg}")]
    Render { path: PathBuf, msg: String },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        DatasetError::Artifact {
            path: path.into(),
            msg: msg.into(),
        }
    }

    /// Attach the owning partition to an index-range error.
    pub(crate) fn in_partition(self, partition: usize) -> Self {
        match self {
            DatasetError::IndexOutOfRange {
                position,
                value,
                scene_count,
                ..
            } => DatasetError::IndexOutOfRange {
                partition,
                position,
                value,
                scene_count,
            },
            DatasetError::Config(ConfigError::MissingSamplingIndex { .. }) => {
                DatasetError::Config(ConfigError::MissingSamplingIndex { partition })
            }
            other => other,
        }
    }
}

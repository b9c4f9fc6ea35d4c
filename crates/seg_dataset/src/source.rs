//! Partition inputs that may be absent, shared by every partition, or given per partition.

use crate::types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A sampling index given inline or as a path to a precomputed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexSource {
    Artifact(PathBuf),
    Inline(Vec<i64>),
}

/// A label weight vector given inline or as a path to a precomputed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightSource {
    Artifact(PathBuf),
    Inline(Vec<f32>),
}

impl IndexSource {
    pub fn artifact_path(&self) -> Option<&PathBuf> {
        match self {
            IndexSource::Artifact(p) => Some(p),
            IndexSource::Inline(_) => None,
        }
    }
}

impl WeightSource {
    pub fn artifact_path(&self) -> Option<&PathBuf> {
        match self {
            WeightSource::Artifact(p) => Some(p),
            WeightSource::Inline(_) => None,
        }
    }
}

/// How a per-partition input was supplied.
///
/// In serialized configs `null`/missing is `Absent`, a list whose items are
/// themselves sources is `PerPartition`, and anything else (a single path or a
/// flat numeric list) is `Shared`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceSpec<T> {
    Absent,
    PerPartition(Vec<T>),
    Shared(T),
}

impl<T> Default for SourceSpec<T> {
    fn default() -> Self {
        SourceSpec::Absent
    }
}

impl<T: Clone> SourceSpec<T> {
    /// Expand to exactly `n` entries, one per partition.
    pub fn normalize(self, n: usize, what: &'static str) -> Result<Vec<Option<T>>, ConfigError> {
        match self {
            SourceSpec::Absent => Ok(vec![None; n]),
            SourceSpec::Shared(value) => Ok(vec![Some(value); n]),
            SourceSpec::PerPartition(values) => {
                if values.len() != n {
                    return Err(ConfigError::CardinalityMismatch {
                        what,
                        expected: n,
                        got: values.len(),
                    });
                }
                Ok(values.into_iter().map(Some).collect())
            }
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SourceSpec::Absent)
    }
}

impl<T> From<Option<T>> for SourceSpec<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(SourceSpec::Absent, SourceSpec::Shared)
    }
}

impl<T> From<Vec<T>> for SourceSpec<T> {
    fn from(values: Vec<T>) -> Self {
        SourceSpec::PerPartition(values)
    }
}

/// One annotation file or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationSources {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl AnnotationSources {
    pub fn into_vec(self) -> Vec<PathBuf> {
        match self {
            AnnotationSources::One(path) => vec![path],
            AnnotationSources::Many(paths) => paths,
        }
    }
}

impl From<Vec<PathBuf>> for AnnotationSources {
    fn from(paths: Vec<PathBuf>) -> Self {
        AnnotationSources::Many(paths)
    }
}

impl From<PathBuf> for AnnotationSources {
    fn from(path: PathBuf) -> Self {
        AnnotationSources::One(path)
    }
}

//! Shared data contracts for segmentation partitions: scene records, annotation files, class sets.

pub mod classes;
pub mod scene;

pub use classes::{ClassSet, Modality, S3DIS_CLASSES, S3DIS_PALETTE};
pub use scene::{AnnotationFile, SceneRecord, ValidationError};

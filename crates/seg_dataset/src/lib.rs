//! Partitioned point-cloud segmentation datasets and their composition.
//!
//! This crate provides utilities for:
//! - Resolving per-partition sampling indices and class weights (inline or from artifacts)
//! - Building single partitions from annotation files
//! - Merging partitions into one dataset with remapped sampling indices
//! - Rendering segmentation results as colored point files

pub mod annotation;
pub mod artifact;
pub mod composite;
pub mod dataset;
pub mod partition;
pub mod pipeline;
pub mod sampling;
pub mod scene_io;
pub mod show;
pub mod source;
pub mod types;
pub mod weights;

pub use annotation::{load_scene_records, save_scene_records};
pub use artifact::{load_float_array, load_int_array, save_json_array, save_npy_index, save_npy_weights};
pub use composite::{
    concat_sampling_indices, concat_scene_records, mean_label_weights, normalize_sources,
    CompositeConfig, CompositeDataset, NormalizedSources,
};
pub use dataset::SegmentationDataset;
pub use partition::{PartitionConfig, PartitionDataset};
pub use pipeline::{Pipeline, PipelineStep};
pub use sampling::{build_sampling_index, resolve_sampling_index, DEFAULT_NUM_POINTS};
pub use show::{ObjRenderer, RenderRequest, SceneRenderer, SegResult};
pub use source::{AnnotationSources, IndexSource, SourceSpec, WeightSource};
pub use types::*;
pub use weights::{class_histogram, compute_label_weights, resolve_label_weights};

pub use data_contracts::{ClassSet, Modality, SceneRecord};

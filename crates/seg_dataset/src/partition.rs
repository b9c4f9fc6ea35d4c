//! One independently indexed partition (e.g. one S3DIS area).

use crate::annotation::load_scene_records;
use crate::dataset::SegmentationDataset;
use crate::pipeline::Pipeline;
use crate::sampling::{resolve_sampling_index, storage_order};
use crate::source::{IndexSource, WeightSource};
use crate::types::{ConfigError, DatasetResult};
use crate::weights::{default_label_weights, resolve_label_weights};
use data_contracts::{ClassSet, Modality, SceneRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings shared by every partition of a dataset.
#[derive(Debug, Clone, Default)]
pub struct PartitionConfig {
    pub classes: ClassSet,
    pub modality: Modality,
    /// Evaluation mode: visit every scene once in storage order.
    pub test_mode: bool,
    /// Caller-supplied pipeline; the S3DIS default is used when `None`.
    pub pipeline: Option<Pipeline>,
}

impl PartitionConfig {
    pub fn resolved_pipeline(&self) -> Pipeline {
        self.pipeline
            .clone()
            .unwrap_or_else(|| Pipeline::s3dis_default(&self.classes))
    }
}

#[derive(Debug)]
pub struct PartitionDataset {
    data_root: PathBuf,
    ann_file: Option<PathBuf>,
    scenes: Vec<Arc<SceneRecord>>,
    sampling_index: Vec<usize>,
    label_weights: Vec<f32>,
    classes: ClassSet,
    modality: Modality,
    test_mode: bool,
    pipeline: Pipeline,
}

impl PartitionDataset {
    /// Load scene records from `ann_file` and resolve the index and weights against them.
    ///
    /// Training mode requires a sampling index source; this is checked before any I/O.
    pub fn new(
        data_root: &Path,
        ann_file: &Path,
        config: &PartitionConfig,
        scene_idxs: Option<&IndexSource>,
        label_weight: Option<&WeightSource>,
    ) -> DatasetResult<Self> {
        ensure_index_for_training(config, scene_idxs)?;
        let scenes = load_scene_records(data_root, ann_file)?;
        let mut partition = Self::from_records(data_root, scenes, config, scene_idxs, label_weight)?;
        partition.ann_file = Some(ann_file.to_path_buf());
        Ok(partition)
    }

    /// Build from scene records already in memory.
    pub fn from_records(
        data_root: &Path,
        scenes: Vec<SceneRecord>,
        config: &PartitionConfig,
        scene_idxs: Option<&IndexSource>,
        label_weight: Option<&WeightSource>,
    ) -> DatasetResult<Self> {
        let scene_count = scenes.len();
        let sampling_index = match (config.test_mode, scene_idxs) {
            (true, source) => {
                if source.is_some() {
                    log::debug!("evaluation mode: ignoring supplied sampling index");
                }
                storage_order(scene_count)
            }
            (false, Some(source)) => resolve_sampling_index(source, scene_count)?,
            (false, None) => return Err(ConfigError::MissingSamplingIndex { partition: 0 }.into()),
        };
        if !config.test_mode {
            if let Some(&max) = sampling_index.iter().max() {
                if max + 1 < scene_count {
                    log::warn!(
                        "sampling index never reaches scenes {}..{} of this partition",
                        max + 1,
                        scene_count
                    );
                }
            }
        }
        let num_classes = config.classes.num_classes();
        let label_weights = match (config.test_mode, label_weight) {
            (true, source) => {
                if source.is_some() {
                    log::debug!("evaluation mode: ignoring supplied label weights");
                }
                default_label_weights(num_classes)
            }
            (false, Some(source)) => resolve_label_weights(source, num_classes)?,
            (false, None) => default_label_weights(num_classes),
        };
        Ok(Self {
            data_root: data_root.to_path_buf(),
            ann_file: None,
            scenes: scenes.into_iter().map(Arc::new).collect(),
            sampling_index,
            label_weights,
            classes: config.classes.clone(),
            modality: config.modality,
            test_mode: config.test_mode,
            pipeline: config.resolved_pipeline(),
        })
    }

    pub fn ann_file(&self) -> Option<&Path> {
        self.ann_file.as_deref()
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub(crate) fn shared_scenes(&self) -> &[Arc<SceneRecord>] {
        &self.scenes
    }
}

fn ensure_index_for_training(
    config: &PartitionConfig,
    scene_idxs: Option<&IndexSource>,
) -> DatasetResult<()> {
    if !config.test_mode && scene_idxs.is_none() {
        return Err(ConfigError::MissingSamplingIndex { partition: 0 }.into());
    }
    Ok(())
}

impl SegmentationDataset for PartitionDataset {
    fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    fn scene_record(&self, index: usize) -> Option<&SceneRecord> {
        self.scenes.get(index).map(|s| s.as_ref())
    }

    fn sampling_index(&self) -> &[usize] {
        &self.sampling_index
    }

    fn label_weights(&self) -> &[f32] {
        &self.label_weights
    }

    fn class_set(&self) -> &ClassSet {
        &self.classes
    }

    fn test_mode(&self) -> bool {
        self.test_mode
    }

    fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

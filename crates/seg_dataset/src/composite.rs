//! Composition of independently indexed partitions into one dataset.
//!
//! Partitions are built in parallel, then merged in order:
//! - scene records are concatenated, each partition taking a contiguous range;
//! - sampling indices are shifted by a running offset and concatenated;
//! - label weight vectors are averaged element-wise.

use crate::dataset::SegmentationDataset;
use crate::partition::{PartitionConfig, PartitionDataset};
use crate::pipeline::Pipeline;
use crate::source::{AnnotationSources, IndexSource, SourceSpec, WeightSource};
use crate::types::{ConfigError, DatasetResult};
use data_contracts::{ClassSet, Modality, SceneRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything needed to build a composite dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeConfig {
    pub data_root: PathBuf,
    pub ann_files: AnnotationSources,
    #[serde(default)]
    pub pipeline: Option<Pipeline>,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
    #[serde(default)]
    pub palette: Option<Vec<[u8; 3]>>,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub ignore_index: Option<usize>,
    #[serde(default)]
    pub scene_idxs: SourceSpec<IndexSource>,
    #[serde(default)]
    pub label_weights: SourceSpec<WeightSource>,
}

impl CompositeConfig {
    pub fn new(data_root: impl Into<PathBuf>, ann_files: impl Into<AnnotationSources>) -> Self {
        Self {
            data_root: data_root.into(),
            ann_files: ann_files.into(),
            pipeline: None,
            classes: None,
            palette: None,
            modality: None,
            test_mode: false,
            ignore_index: None,
            scene_idxs: SourceSpec::Absent,
            label_weights: SourceSpec::Absent,
        }
    }

    pub fn partition_config(&self) -> DatasetResult<PartitionConfig> {
        Ok(PartitionConfig {
            classes: ClassSet::resolve(
                self.classes.clone(),
                self.palette.clone(),
                self.ignore_index,
            )?,
            modality: self.modality.unwrap_or_default(),
            test_mode: self.test_mode,
            pipeline: self.pipeline.clone(),
        })
    }
}

/// Per-partition inputs after normalization, all of length N.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSources {
    pub ann_files: Vec<PathBuf>,
    pub scene_idxs: Vec<Option<IndexSource>>,
    pub label_weights: Vec<Option<WeightSource>>,
}

/// Expand annotation, index and weight inputs to one entry per annotation file.
pub fn normalize_sources(
    ann_files: AnnotationSources,
    scene_idxs: SourceSpec<IndexSource>,
    label_weights: SourceSpec<WeightSource>,
) -> Result<NormalizedSources, ConfigError> {
    let ann_files = ann_files.into_vec();
    let n = ann_files.len();
    if n == 0 {
        return Err(ConfigError::NoPartitions);
    }
    if n > 1 {
        if let SourceSpec::Shared(IndexSource::Artifact(path)) = &scene_idxs {
            log::warn!(
                "all {n} partitions share sampling index artifact {}",
                path.display()
            );
        }
        if let SourceSpec::Shared(WeightSource::Artifact(path)) = &label_weights {
            log::warn!(
                "all {n} partitions share label weight artifact {}",
                path.display()
            );
        }
    }
    Ok(NormalizedSources {
        scene_idxs: scene_idxs.normalize(n, "scene_idxs")?,
        label_weights: label_weights.normalize(n, "label_weights")?,
        ann_files,
    })
}

/// Concatenate scene lists, returning the merged list and each partition's range in it.
pub fn concat_scene_records<'a>(
    parts: impl IntoIterator<Item = &'a [Arc<SceneRecord>]>,
) -> (Vec<Arc<SceneRecord>>, Vec<Range<usize>>) {
    let mut merged = Vec::new();
    let mut ranges = Vec::new();
    for part in parts {
        let start = merged.len();
        merged.extend(part.iter().cloned());
        ranges.push(start..merged.len());
    }
    (merged, ranges)
}

/// Concatenate local sampling indices into one global index.
///
/// Each partition's values are shifted by the current offset. After appending,
/// the offset becomes one plus the largest value in the merged index so far,
/// not the running scene count. A partition whose index never reaches its last
/// scene therefore shifts every later partition down. Existing index artifacts
/// depend on this rule.
pub fn concat_sampling_indices<'a>(indices: impl IntoIterator<Item = &'a [usize]>) -> Vec<usize> {
    let (merged, _) = indices
        .into_iter()
        .enumerate()
        .fold((Vec::new(), 0usize), |(mut merged, offset), (k, local)| {
            merged.extend(local.iter().map(|&i| i + offset));
            // merged max so far is offset - 1 (or nothing), so only the new values can raise it
            let next = local.iter().max().map_or(offset, |&m| m + offset + 1);
            log::debug!(
                "partition {k}: {} samples at offset {offset}, next offset {next}",
                local.len()
            );
            (merged, next)
        });
    merged
}

/// Element-wise arithmetic mean of per-partition weight vectors.
///
/// Partitions count equally regardless of their size. This is a known
/// simplification; published weight artifacts assume the unweighted mean.
pub fn mean_label_weights<'a>(weights: impl IntoIterator<Item = &'a [f32]>) -> Vec<f32> {
    let mut sum: Vec<f32> = Vec::new();
    let mut count = 0usize;
    for w in weights {
        if sum.is_empty() {
            sum = vec![0.0; w.len()];
        }
        for (acc, v) in sum.iter_mut().zip(w) {
            *acc += v;
        }
        count += 1;
    }
    if count > 0 {
        for acc in &mut sum {
            *acc /= count as f32;
        }
    }
    sum
}

/// Several partitions exposed as one dataset.
#[derive(Debug)]
pub struct CompositeDataset {
    data_root: PathBuf,
    partitions: Vec<Arc<PartitionDataset>>,
    ranges: Vec<Range<usize>>,
    scenes: Vec<Arc<SceneRecord>>,
    sampling_index: Vec<usize>,
    label_weights: Vec<f32>,
    classes: ClassSet,
    modality: Modality,
    test_mode: bool,
    pipeline: Pipeline,
    group_flag: Option<Vec<u8>>,
}

impl CompositeDataset {
    /// Normalize inputs, build every partition, and merge them.
    ///
    /// Fails without building anything on a cardinality mismatch or, in
    /// training mode, on any partition lacking a sampling index source.
    pub fn new(config: CompositeConfig) -> DatasetResult<Self> {
        let partition_config = config.partition_config()?;
        let sources = normalize_sources(config.ann_files, config.scene_idxs, config.label_weights)?;
        if !partition_config.test_mode {
            if let Some(partition) = sources.scene_idxs.iter().position(Option::is_none) {
                return Err(ConfigError::MissingSamplingIndex { partition }.into());
            }
        }

        let data_root = config.data_root;
        let partitions = sources
            .ann_files
            .par_iter()
            .zip(sources.scene_idxs.par_iter())
            .zip(sources.label_weights.par_iter())
            .enumerate()
            .map(|(k, ((ann_file, scene_idxs), label_weight))| {
                PartitionDataset::new(
                    &data_root,
                    ann_file,
                    &partition_config,
                    scene_idxs.as_ref(),
                    label_weight.as_ref(),
                )
                .map_err(|e| e.in_partition(k))
            })
            .collect::<DatasetResult<Vec<_>>>()?;

        Self::from_partitions(&data_root, partitions, &partition_config)
    }

    /// Merge partitions that were already built.
    pub fn from_partitions(
        data_root: &Path,
        partitions: Vec<PartitionDataset>,
        config: &PartitionConfig,
    ) -> DatasetResult<Self> {
        if partitions.is_empty() {
            return Err(ConfigError::NoPartitions.into());
        }
        for (k, p) in partitions.iter().enumerate() {
            if p.class_set() != &config.classes {
                return Err(ConfigError::InconsistentPartition {
                    partition: k,
                    what: "class set",
                }
                .into());
            }
            if p.test_mode() != config.test_mode {
                return Err(ConfigError::InconsistentPartition {
                    partition: k,
                    what: "evaluation mode",
                }
                .into());
            }
        }
        let partitions: Vec<Arc<PartitionDataset>> = partitions.into_iter().map(Arc::new).collect();

        let (scenes, ranges) = concat_scene_records(partitions.iter().map(|p| p.shared_scenes()));
        let sampling_index = concat_sampling_indices(partitions.iter().map(|p| p.sampling_index()));
        let label_weights = mean_label_weights(partitions.iter().map(|p| p.label_weights()));
        debug_assert!(sampling_index.iter().all(|&v| v < scenes.len()));

        let group_flag = (!config.test_mode).then(|| vec![0u8; scenes.len()]);
        log::info!(
            "composite dataset: {} partitions, {} scenes, {} samples{}",
            partitions.len(),
            scenes.len(),
            sampling_index.len(),
            if config.test_mode { " (evaluation)" } else { "" }
        );

        Ok(Self {
            data_root: data_root.to_path_buf(),
            partitions,
            ranges,
            scenes,
            sampling_index,
            label_weights,
            classes: config.classes.clone(),
            modality: config.modality,
            test_mode: config.test_mode,
            pipeline: config.resolved_pipeline(),
            group_flag,
        })
    }

    pub fn partitions(&self) -> &[Arc<PartitionDataset>] {
        &self.partitions
    }

    /// Range of merged scene positions owned by each partition, in order.
    pub fn partition_ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Map a merged scene position to `(partition, local scene)`.
    pub fn partition_of(&self, scene: usize) -> Option<(usize, usize)> {
        let k = self.ranges.partition_point(|r| r.end <= scene);
        let range = self.ranges.get(k)?;
        range.contains(&scene).then(|| (k, scene - range.start))
    }

    /// Batching group per merged scene; `None` in evaluation mode.
    pub fn group_flag(&self) -> Option<&[u8]> {
        self.group_flag.as_deref()
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }
}

impl SegmentationDataset for CompositeDataset {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatasetError;

    #[test]
    fn offsets_continue_from_max_seen() {
        let a: &[usize] = &[0, 0, 1, 2];
        let b: &[usize] = &[0, 1, 1];
        assert_eq!(concat_sampling_indices([a, b]), vec![0, 0, 1, 2, 3, 4, 4]);
    }

    #[test]
    fn unreached_tail_shifts_next_partition() {
        // partition A has 3 scenes but only samples 0 and 1
        let a: &[usize] = &[0, 1, 1];
        let b: &[usize] = &[0, 1];
        assert_eq!(concat_sampling_indices([a, b]), vec![0, 1, 1, 2, 3]);
    }

    #[test]
    fn empty_partition_index_keeps_offset() {
        let a: &[usize] = &[0, 1];
        let empty: &[usize] = &[];
        let c: &[usize] = &[0];
        assert_eq!(concat_sampling_indices([empty, a, empty, c]), vec![0, 1, 2]);
    }

    #[test]
    fn weights_are_plain_mean() {
        let a: &[f32] = &[1.0, 2.0];
        let b: &[f32] = &[3.0, 0.0];
        assert_eq!(mean_label_weights([a, b]), vec![2.0, 1.0]);
    }

    fn records(prefix: &str, n: usize) -> Vec<SceneRecord> {
        (0..n)
            .map(|i| {
                SceneRecord::new(
                    format!("points/{prefix}_{i}.bin"),
                    format!("semantic_mask/{prefix}_{i}.bin"),
                )
            })
            .collect()
    }

    fn partition(prefix: &str, n: usize, config: &PartitionConfig, idx: Vec<i64>) -> PartitionDataset {
        PartitionDataset::from_records(
            Path::new("/data"),
            records(prefix, n),
            config,
            Some(&IndexSource::Inline(idx)),
            None,
        )
        .unwrap()
    }

    #[test]
    fn prebuilt_partitions_merge() {
        let cfg = PartitionConfig::default();
        let parts = vec![
            partition("a", 3, &cfg, vec![0, 0, 1, 2]),
            partition("b", 2, &cfg, vec![0, 1, 1]),
        ];
        let ds = CompositeDataset::from_partitions(Path::new("/data"), parts, &cfg).unwrap();
        assert_eq!(ds.sampling_index(), &[0, 0, 1, 2, 3, 4, 4]);
        assert_eq!(ds.partition_ranges(), &[0..3, 3..5]);
        assert_eq!(ds.partition_of(3), Some((1, 0)));
        assert_eq!(ds.scene_record(4).unwrap().pts_path, "points/b_1.bin");
        assert_eq!(ds.group_flag(), Some(&[0u8; 5][..]));
    }

    #[test]
    fn partition_with_other_class_set_is_rejected() {
        let cfg = PartitionConfig::default();
        let other = PartitionConfig {
            classes: ClassSet::resolve(Some(vec!["wall".into(), "floor".into()]), None, None).unwrap(),
            ..Default::default()
        };
        let parts = vec![
            partition("a", 2, &cfg, vec![0, 1]),
            partition("b", 2, &other, vec![0, 1]),
        ];
        let err = CompositeDataset::from_partitions(Path::new("/data"), parts, &cfg).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Config(ConfigError::InconsistentPartition {
                partition: 1,
                what: "class set"
            })
        ));
    }

    #[test]
    fn partition_with_other_mode_is_rejected() {
        let cfg = PartitionConfig::default();
        let eval = PartitionConfig {
            test_mode: true,
            ..Default::default()
        };
        let parts = vec![
            partition("a", 2, &cfg, vec![0, 1]),
            partition("b", 2, &eval, vec![0, 1]),
        ];
        let err = CompositeDataset::from_partitions(Path::new("/data"), parts, &cfg).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Config(ConfigError::InconsistentPartition {
                partition: 1,
                what: "evaluation mode"
            })
        ));
    }

    #[test]
    fn normalization_rejects_empty_annotation_list() {
        let err = normalize_sources(
            AnnotationSources::Many(vec![]),
            SourceSpec::Absent,
            SourceSpec::Absent,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::NoPartitions);
    }
}

//! Per-partition point and label statistics read from semantic mask files.

use data_contracts::SceneRecord;
use rayon::prelude::*;
use seg_dataset::scene_io::read_mask;
use seg_dataset::{build_sampling_index, class_histogram, compute_label_weights, DatasetResult};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStats {
    /// Point count of each scene, in storage order.
    pub points_per_scene: Vec<usize>,
    /// Label histogram with `num_classes + 1` buckets; the last is the ignore bucket.
    pub class_counts: Vec<u64>,
}

impl PartitionStats {
    pub fn total_points(&self) -> usize {
        self.points_per_scene.iter().sum()
    }

    pub fn sampling_index(&self, num_points: usize) -> Vec<usize> {
        build_sampling_index(&self.points_per_scene, num_points)
    }

    /// Class weights computed without the ignore bucket.
    pub fn label_weights(&self) -> Vec<f32> {
        let classes = self.class_counts.len().saturating_sub(1);
        compute_label_weights(&self.class_counts[..classes])
    }
}

/// Read every scene's mask in parallel and accumulate point counts and a label histogram.
///
/// Mask files are the point counts of record: one label per point.
pub fn collect_partition_stats(
    data_root: &Path,
    scenes: &[SceneRecord],
    num_classes: usize,
) -> DatasetResult<PartitionStats> {
    let per_scene = scenes
        .par_iter()
        .map(|scene| {
            let mask = read_mask(&scene.mask_path(data_root))?;
            Ok((mask.len(), class_histogram(&mask, num_classes)))
        })
        .collect::<DatasetResult<Vec<_>>>()?;

    let mut class_counts = vec![0u64; num_classes + 1];
    let mut points_per_scene = Vec::with_capacity(per_scene.len());
    for (points, hist) in per_scene {
        points_per_scene.push(points);
        for (acc, c) in class_counts.iter_mut().zip(hist) {
            *acc += c;
        }
    }
    log::debug!(
        "collected {} scenes, {} points",
        points_per_scene.len(),
        points_per_scene.iter().sum::<usize>()
    );
    Ok(PartitionStats {
        points_per_scene,
        class_counts,
    })
}

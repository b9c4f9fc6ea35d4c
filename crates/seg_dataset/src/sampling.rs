//! Sampling index resolution and construction for a single partition.
//!
//! A sampling index is an ordered list of scene offsets local to one partition.
//! Duplicates are meaningful: a scene listed k times is visited k times per epoch.

use crate::artifact::load_int_array;
use crate::source::IndexSource;
use crate::types::{DatasetError, DatasetResult};

/// Points per training sample used when deriving how often a scene is revisited.
pub const DEFAULT_NUM_POINTS: usize = 4096;

/// Resolve an inline or precomputed index and check every value against `scene_count`.
pub fn resolve_sampling_index(source: &IndexSource, scene_count: usize) -> DatasetResult<Vec<usize>> {
    match source {
        IndexSource::Inline(values) => validate_index(values, scene_count),
        IndexSource::Artifact(path) => {
            let values = load_int_array(path)?;
            validate_index(&values, scene_count)
        }
    }
}

/// Convert raw values into offsets, failing on the first value outside `0..scene_count`.
pub fn validate_index(values: &[i64], scene_count: usize) -> DatasetResult<Vec<usize>> {
    values
        .iter()
        .enumerate()
        .map(|(position, &value)| {
            if value < 0 || value as u64 >= scene_count as u64 {
                Err(DatasetError::IndexOutOfRange {
                    partition: 0,
                    position,
                    value,
                    scene_count,
                })
            } else {
                Ok(value as usize)
            }
        })
        .collect()
}

/// Every scene once, in storage order.
pub fn storage_order(scene_count: usize) -> Vec<usize> {
    (0..scene_count).collect()
}

/// Build an index that revisits scenes in proportion to their point counts.
///
/// Scene `i` appears `round(n_i / N * floor(N / num_points))` times, where `N`
/// is the total point count. Rounding is half-to-even.
pub fn build_sampling_index(points_per_scene: &[usize], num_points: usize) -> Vec<usize> {
    let total: usize = points_per_scene.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let num_iter = (total as f64 / num_points.max(1) as f64).floor();
    let mut index = Vec::new();
    for (scene, &n) in points_per_scene.iter().enumerate() {
        let prob = n as f64 / total as f64;
        let repeats = (prob * num_iter).round_ties_even() as usize;
        index.extend(std::iter::repeat(scene).take(repeats));
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_index_validated() {
        let idx = resolve_sampling_index(&IndexSource::Inline(vec![0, 0, 1, 2]), 3).unwrap();
        assert_eq!(idx, vec![0, 0, 1, 2]);
    }

    #[test]
    fn out_of_range_is_rejected_not_clamped() {
        let err = validate_index(&[0, 3], 3).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::IndexOutOfRange {
                position: 1,
                value: 3,
                scene_count: 3,
                ..
            }
        ));
        assert!(validate_index(&[-1], 3).is_err());
    }

    #[test]
    fn larger_scenes_are_oversampled() {
        // 10 iterations: 7.5 -> 8, 2.0 -> 2, 0.5 -> 0
        let idx = build_sampling_index(&[30720, 8192, 2048], 4096);
        assert_eq!(idx.iter().filter(|&&s| s == 0).count(), 8);
        assert_eq!(idx.iter().filter(|&&s| s == 1).count(), 2);
        assert_eq!(idx.iter().filter(|&&s| s == 2).count(), 0);
        assert!(idx.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rounding_is_half_to_even() {
        // num_iter = 5; scene 0 gets 2.5 -> 2, scene 1 gets 2.5 -> 2
        let idx = build_sampling_index(&[10, 10], 4);
        assert_eq!(idx, vec![0, 0, 1, 1]);
    }

    #[test]
    fn empty_counts_give_empty_index() {
        assert!(build_sampling_index(&[], DEFAULT_NUM_POINTS).is_empty());
        assert!(build_sampling_index(&[0, 0], DEFAULT_NUM_POINTS).is_empty());
    }
}

//! Class-balance weight resolution for a single partition.

use crate::artifact::load_float_array;
use crate::source::WeightSource;
use crate::types::{DatasetError, DatasetResult};

/// Resolve an inline or precomputed weight vector and check it against the class count.
pub fn resolve_label_weights(source: &WeightSource, num_classes: usize) -> DatasetResult<Vec<f32>> {
    let weights = match source {
        WeightSource::Inline(values) => values.clone(),
        WeightSource::Artifact(path) => load_float_array(path)?,
    };
    validate_weights(weights, num_classes)
}

/// Uniform weights, used when no weight source is configured.
pub fn default_label_weights(num_classes: usize) -> Vec<f32> {
    vec![1.0; num_classes]
}

pub fn validate_weights(weights: Vec<f32>, num_classes: usize) -> DatasetResult<Vec<f32>> {
    if weights.len() != num_classes {
        return Err(DatasetError::WeightLength {
            expected: num_classes,
            got: weights.len(),
        });
    }
    if let Some((position, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(DatasetError::InvalidWeight { position, value });
    }
    Ok(weights)
}

/// Count labels per class. The result has `num_classes + 1` buckets; the last
/// one collects the ignore/unannotated label. Values outside `0..=num_classes` are skipped.
pub fn class_histogram(labels: &[i64], num_classes: usize) -> Vec<u64> {
    let mut hist = vec![0u64; num_classes + 1];
    for &label in labels {
        if label >= 0 && (label as usize) <= num_classes {
            hist[label as usize] += 1;
        }
    }
    hist
}

/// Weights inversely related to class frequency: `1 / ln(1.2 + freq)`.
///
/// `class_counts` holds one count per class; an ignore bucket must already be dropped.
pub fn compute_label_weights(class_counts: &[u64]) -> Vec<f32> {
    let total: u64 = class_counts.iter().sum();
    class_counts
        .iter()
        .map(|&c| {
            let freq = if total == 0 {
                0.0
            } else {
                c as f32 / total as f32
            };
            1.0 / (1.2f32 + freq).ln()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_weights_length_checked() {
        let err = resolve_label_weights(&WeightSource::Inline(vec![1.0]), 2).unwrap_err();
        assert!(matches!(err, DatasetError::WeightLength { expected: 2, got: 1 }));
    }

    #[test]
    fn negative_weight_rejected() {
        let err = validate_weights(vec![1.0, -0.5], 2).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidWeight { position: 1, .. }));
    }

    #[test]
    fn histogram_keeps_ignore_bucket() {
        let hist = class_histogram(&[0, 0, 1, 2, 2, 2, 7, -1], 2);
        assert_eq!(hist, vec![2, 1, 3]);
    }

    #[test]
    fn rare_classes_weigh_more() {
        let w = compute_label_weights(&[900, 100, 0]);
        assert!(w[2] > w[1] && w[1] > w[0]);
        assert!((w[2] - 1.0 / 1.2f32.ln()).abs() < 1e-6);
        assert!(w.iter().all(|v| *v > 0.0));
    }
}

//! Capabilities shared by a single partition and a composite of partitions.

use crate::pipeline::Pipeline;
use crate::show::{show_scenes, SceneRenderer, SegResult};
use crate::types::DatasetResult;
use data_contracts::{ClassSet, SceneRecord};
use std::path::{Path, PathBuf};

/// An indexed segmentation dataset.
///
/// Training iterates `sampling_index()`, never raw scene order; `len()` is the
/// number of samples per epoch. Implementations are read-only after construction.
pub trait SegmentationDataset: Send + Sync {
    fn scene_count(&self) -> usize;

    fn scene_record(&self, index: usize) -> Option<&SceneRecord>;

    /// Scene offsets in iteration order; every value is `< scene_count()`.
    fn sampling_index(&self) -> &[usize];

    /// One weight per class.
    fn label_weights(&self) -> &[f32];

    fn class_set(&self) -> &ClassSet;

    fn test_mode(&self) -> bool;

    fn data_root(&self) -> &Path;

    fn pipeline(&self) -> &Pipeline;

    fn len(&self) -> usize {
        self.sampling_index().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scene visited by sample `sample` of an epoch.
    fn scene_for_sample(&self, sample: usize) -> Option<&SceneRecord> {
        let scene = *self.sampling_index().get(sample)?;
        self.scene_record(scene)
    }

    /// Absolute semantic mask path of stored scene `index`.
    fn ann_info(&self, index: usize) -> Option<PathBuf> {
        self.scene_record(index)
            .map(|record| record.mask_path(self.data_root()))
    }

    fn show(
        &self,
        results: &[SegResult],
        out_dir: Option<&Path>,
        display: bool,
        renderer: &dyn SceneRenderer,
    ) -> DatasetResult<()> {
        show_scenes(self, results, out_dir, display, renderer)
    }
}

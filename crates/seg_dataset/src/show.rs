//! Visualization of segmentation results as colored OBJ point files.

use crate::dataset::SegmentationDataset;
use crate::scene_io::{read_mask, read_points, PointCloud};
use crate::types::{ConfigError, DatasetError, DatasetResult};
use data_contracts::ClassSet;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Predicted labels for one scene, aligned with the scene's points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegResult {
    pub semantic_mask: Vec<i64>,
}

/// Everything a renderer needs for one scene.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    pub name: &'a str,
    pub points: &'a PointCloud,
    pub gt_mask: &'a [i64],
    pub pred_mask: &'a [i64],
    pub classes: &'a ClassSet,
}

impl RenderRequest<'_> {
    /// Points need at least xyz per row; both label slices need one entry per point.
    pub fn check_lengths(&self, path: &Path) -> DatasetResult<()> {
        let points = self.points.len();
        if self.points.dim < 3
            || self.points.values.len() != points * self.points.dim
            || self.gt_mask.len() != points
            || self.pred_mask.len() != points
        {
            return Err(DatasetError::Render {
                path: path.to_path_buf(),
                msg: format!(
                    "{points} points, {} ground-truth labels, {} predicted labels",
                    self.gt_mask.len(),
                    self.pred_mask.len()
                ),
            });
        }
        Ok(())
    }
}

/// Writes rendered output for one scene. Must not depend on dataset state.
pub trait SceneRenderer {
    fn render(&self, request: &RenderRequest<'_>, out_dir: &Path, display: bool) -> DatasetResult<()>;
}

/// Writes `<out>/<name>/<name>_{points,gt,pred}.obj`, skipping ignored points.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjRenderer;

impl SceneRenderer for ObjRenderer {
    fn render(&self, request: &RenderRequest<'_>, out_dir: &Path, display: bool) -> DatasetResult<()> {
        let scene_dir = out_dir.join(request.name);
        request.check_lengths(&scene_dir)?;
        fs::create_dir_all(&scene_dir).map_err(|e| DatasetError::io(&scene_dir, e))?;

        let keep: Vec<usize> = request
            .gt_mask
            .iter()
            .enumerate()
            .filter(|(_, label)| **label < 0 || **label as usize != request.classes.ignore_index)
            .map(|(i, _)| i)
            .collect();

        let points_path = scene_dir.join(format!("{}_points.obj", request.name));
        write_obj(&points_path, &keep, request.points, |i| {
            let row = &request.points.values[i * request.points.dim..];
            if request.points.dim >= 6 {
                Ok([row[3] as u8, row[4] as u8, row[5] as u8])
            } else {
                Ok([255, 255, 255])
            }
        })?;
        for (suffix, mask) in [("gt", request.gt_mask), ("pred", request.pred_mask)] {
            let path = scene_dir.join(format!("{}_{suffix}.obj", request.name));
            write_obj(&path, &keep, request.points, |i| {
                request.classes.color(mask[i]).ok_or_else(|| DatasetError::Render {
                    path: path.clone(),
                    msg: format!("label {} at point {i} has no palette entry", mask[i]),
                })
            })?;
        }
        if display {
            log::info!(
                "no interactive viewer attached; wrote {} to {}",
                request.name,
                scene_dir.display()
            );
        }
        Ok(())
    }
}

fn write_obj(
    path: &Path,
    keep: &[usize],
    points: &PointCloud,
    color: impl Fn(usize) -> DatasetResult<[u8; 3]>,
) -> DatasetResult<()> {
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for &i in keep {
        let [x, y, z] = points.xyz(i);
        let [r, g, b] = color(i)?;
        writeln!(writer, "v {x} {y} {z} {r} {g} {b}").map_err(|e| DatasetError::io(path, e))?;
    }
    writer.flush().map_err(|e| DatasetError::io(path, e))
}

/// Render `results[i]` against stored scene `i` of `dataset`.
///
/// Scenes are read in storage order, not through the sampling index.
pub fn show_scenes<D: SegmentationDataset + ?Sized>(
    dataset: &D,
    results: &[SegResult],
    out_dir: Option<&Path>,
    display: bool,
    renderer: &dyn SceneRenderer,
) -> DatasetResult<()> {
    let out_dir = out_dir.ok_or(ConfigError::MissingOutputDir)?;
    let load_dim = dataset.pipeline().load_dim();
    for (i, result) in results.iter().enumerate() {
        let record = dataset.scene_record(i).ok_or_else(|| DatasetError::Render {
            path: out_dir.to_path_buf(),
            msg: format!(
                "result {i} has no matching scene ({} scenes)",
                dataset.scene_count()
            ),
        })?;
        let points = read_points(&record.points_path(dataset.data_root()), load_dim)?;
        let mask_path: PathBuf = record.mask_path(dataset.data_root());
        let gt_mask = read_mask(&mask_path)?;
        if gt_mask.len() != points.len() || result.semantic_mask.len() != points.len() {
            return Err(DatasetError::Render {
                path: mask_path,
                msg: format!(
                    "{} points, {} ground-truth labels, {} predicted labels",
                    points.len(),
                    gt_mask.len(),
                    result.semantic_mask.len()
                ),
            });
        }
        let name = record.scene_name();
        renderer.render(
            &RenderRequest {
                name: &name,
                points: &points,
                gt_mask: &gt_mask,
                pred_mask: &result.semantic_mask,
                classes: dataset.class_set(),
            },
            out_dir,
            display,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_request_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let points = PointCloud {
            values: vec![0.0; 12],
            dim: 6,
        };
        let classes = ClassSet::default();
        let request = RenderRequest {
            name: "office_1",
            points: &points,
            gt_mask: &[0, 1],
            pred_mask: &[0],
            classes: &classes,
        };
        let err = ObjRenderer.render(&request, dir.path(), false).unwrap_err();
        assert!(matches!(err, DatasetError::Render { .. }));
        assert!(!dir.path().join("office_1/office_1_gt.obj").exists());
    }

    #[test]
    fn matching_request_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let points = PointCloud {
            values: vec![0.0, 0.0, 0.0, 10.0, 20.0, 30.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            dim: 6,
        };
        let classes = ClassSet::default();
        let request = RenderRequest {
            name: "office_1",
            points: &points,
            gt_mask: &[0, 13],
            pred_mask: &[1, 2],
            classes: &classes,
        };
        ObjRenderer.render(&request, dir.path(), false).unwrap();
        let gt = fs::read_to_string(dir.path().join("office_1/office_1_gt.obj")).unwrap();
        // second point carries the ignore label
        assert_eq!(gt.lines().count(), 1);
        assert!(dir.path().join("office_1/office_1_points.obj").exists());
        assert!(dir.path().join("office_1/office_1_pred.obj").exists());
    }
}

//! Flat binary point and mask files as written by the S3DIS converter.
//!
//! Points are little-endian `f32` rows of `load_dim` values (xyz first, then
//! rgb when present). Masks are little-endian `i64` labels, one per point.

use crate::types::{DatasetError, DatasetResult};
use std::fs;
use std::path::Path;

/// xyz + rgb
pub const DEFAULT_LOAD_DIM: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    /// Row-major `[num_points, dim]`.
    pub values: Vec<f32>,
    pub dim: usize,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.values.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn xyz(&self, i: usize) -> [f32; 3] {
        let row = &self.values[i * self.dim..];
        [row[0], row[1], row[2]]
    }
}

pub fn read_points(path: &Path, load_dim: usize) -> DatasetResult<PointCloud> {
    if load_dim < 3 {
        return Err(DatasetError::artifact(
            path,
            format!("load_dim {load_dim} is smaller than xyz"),
        ));
    }
    let raw = fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    let row_bytes = load_dim * 4;
    if raw.len() % row_bytes != 0 {
        return Err(DatasetError::artifact(
            path,
            format!("{} bytes is not a multiple of {row_bytes}", raw.len()),
        ));
    }
    let values = raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(PointCloud {
        values,
        dim: load_dim,
    })
}

pub fn read_mask(path: &Path) -> DatasetResult<Vec<i64>> {
    let raw = fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    if raw.len() % 8 != 0 {
        return Err(DatasetError::artifact(
            path,
            format!("{} bytes is not a multiple of 8", raw.len()),
        ));
    }
    Ok(raw
        .chunks_exact(8)
        .map(|c| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(c);
            i64::from_le_bytes(buf)
        })
        .collect())
}

pub fn write_points(path: &Path, cloud: &PointCloud) -> DatasetResult<()> {
    let bytes: Vec<u8> = cloud.values.iter().flat_map(|v| v.to_le_bytes()).collect();
    write_file(path, &bytes)
}

pub fn write_mask(path: &Path, labels: &[i64]) -> DatasetResult<()> {
    let bytes: Vec<u8> = labels.iter().flat_map(|v| v.to_le_bytes()).collect();
    write_file(path, &bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> DatasetResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| DatasetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_and_mask_survive_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = PointCloud {
            values: vec![0.0, 1.0, 2.0, 10.0, 20.0, 30.0, 3.0, 4.0, 5.0, 40.0, 50.0, 60.0],
            dim: 6,
        };
        write_points(&dir.path().join("points/a.bin"), &cloud).unwrap();
        write_mask(&dir.path().join("mask/a.bin"), &[2, 13]).unwrap();

        let back = read_points(&dir.path().join("points/a.bin"), 6).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.xyz(1), [3.0, 4.0, 5.0]);
        assert_eq!(read_mask(&dir.path().join("mask/a.bin")).unwrap(), vec![2, 13]);
    }

    #[test]
    fn ragged_point_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        fs::write(&path, [0u8; 20]).unwrap();
        assert!(matches!(
            read_points(&path, 6),
            Err(DatasetError::Artifact { .. })
        ));
    }
}

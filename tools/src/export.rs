//! Writing index and weight artifacts in the format selected on the command line.

use cli_support::ArtifactFormat;
use seg_dataset::{save_json_array, save_npy_index, save_npy_weights, DatasetResult};
use std::path::{Path, PathBuf};

/// Write a sampling index to `<dir>/<stem>.<ext>` and return the path.
pub fn write_index(dir: &Path, stem: &str, format: ArtifactFormat, index: &[usize]) -> DatasetResult<PathBuf> {
    let path = dir.join(format!("{stem}.{}", format.extension()));
    match format {
        ArtifactFormat::Npy => save_npy_index(&path, index)?,
        ArtifactFormat::Json => save_json_array(&path, index)?,
    }
    Ok(path)
}

/// Write a label weight vector to `<dir>/<stem>.<ext>` and return the path.
pub fn write_weights(dir: &Path, stem: &str, format: ArtifactFormat, weights: &[f32]) -> DatasetResult<PathBuf> {
    let path = dir.join(format!("{stem}.{}", format.extension()));
    match format {
        ArtifactFormat::Npy => save_npy_weights(&path, weights)?,
        ArtifactFormat::Json => save_json_array(&path, weights)?,
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seg_dataset::{load_float_array, load_int_array};

    #[test]
    fn written_artifacts_load_back_as_sources() {
        let dir = tempfile::tempdir().unwrap();
        for format in [ArtifactFormat::Npy, ArtifactFormat::Json] {
            let idx = write_index(dir.path(), "area", format, &[0, 0, 2]).unwrap();
            assert_eq!(load_int_array(&idx).unwrap(), vec![0, 0, 2]);
            let w = write_weights(dir.path(), "area_w", format, &[1.5, 0.25]).unwrap();
            assert_eq!(load_float_array(&w).unwrap(), vec![1.5, 0.25]);
        }
    }
}

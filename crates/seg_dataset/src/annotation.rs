//! Loading a partition's scene records from its annotation file.

use crate::types::{DatasetError, DatasetResult};
use data_contracts::{AnnotationFile, SceneRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve an annotation path: absolute paths are used as-is, relative ones
/// are looked up under `data_root` first and then relative to the working directory.
pub fn resolve_annotation_path(data_root: &Path, ann_file: &Path) -> PathBuf {
    if ann_file.is_absolute() {
        return ann_file.to_path_buf();
    }
    let under_root = data_root.join(ann_file);
    if under_root.exists() {
        under_root
    } else {
        ann_file.to_path_buf()
    }
}

pub fn load_scene_records(data_root: &Path, ann_file: &Path) -> DatasetResult<Vec<SceneRecord>> {
    let path = resolve_annotation_path(data_root, ann_file);
    let raw = fs::read(&path).map_err(|e| DatasetError::io(&path, e))?;
    let file: AnnotationFile = serde_json::from_slice(&raw).map_err(|e| DatasetError::Json {
        path: path.clone(),
        source: e,
    })?;
    file.validate()?;
    Ok(file.into_scenes())
}

pub fn save_scene_records(path: &Path, scenes: &[SceneRecord]) -> DatasetResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    let file = AnnotationFile::Wrapped {
        scenes: scenes.to_vec(),
    };
    let data = serde_json::to_vec_pretty(&file).map_err(|e| DatasetError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, data).map_err(|e| DatasetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_annotation_found_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let scenes = vec![SceneRecord::new("points/a.bin", "semantic_mask/a.bin")];
        save_scene_records(&dir.path().join("s3dis_infos_Area_1.json"), &scenes).unwrap();
        let loaded = load_scene_records(dir.path(), Path::new("s3dis_infos_Area_1.json")).unwrap();
        assert_eq!(loaded, scenes);
    }

    #[test]
    fn missing_annotation_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_scene_records(dir.path(), Path::new("nope.json")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn invalid_record_is_contract_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"pts_path": "", "pts_semantic_mask_path": "m.bin"}]"#).unwrap();
        let err = load_scene_records(dir.path(), &path).unwrap_err();
        assert!(matches!(err, DatasetError::Contract(_)));
    }
}

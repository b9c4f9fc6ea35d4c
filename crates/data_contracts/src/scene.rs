use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Metadata for one point-cloud scene. Paths are relative to the dataset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub pts_path: String,
    pub pts_semantic_mask_path: String,
}

/// On-disk annotation file for one partition.
///
/// Accepts either `{"scenes": [...]}` or a bare array of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationFile {
    Wrapped { scenes: Vec<SceneRecord> },
    Bare(Vec<SceneRecord>),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("scene {index}: empty pts_path")]
    MissingPointsPath { index: usize },
    #[error("scene {index}: empty pts_semantic_mask_path")]
    MissingMaskPath { index: usize },
    #[error("palette has {palette} entries for {classes} classes")]
    PaletteLength { classes: usize, palette: usize },
    #[error("class list is empty")]
    NoClasses,
}

impl SceneRecord {
    pub fn new(pts_path: impl Into<String>, pts_semantic_mask_path: impl Into<String>) -> Self {
        Self {
            pts_path: pts_path.into(),
            pts_semantic_mask_path: pts_semantic_mask_path.into(),
        }
    }

    pub fn points_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.pts_path)
    }

    pub fn mask_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.pts_semantic_mask_path)
    }

    /// File stem of the point file, used to name rendered outputs.
    pub fn scene_name(&self) -> String {
        Path::new(&self.pts_path)
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.split('.').next())
            .unwrap_or("scene")
            .to_string()
    }

    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.pts_path.trim().is_empty() {
            return Err(ValidationError::MissingPointsPath { index });
        }
        if self.pts_semantic_mask_path.trim().is_empty() {
            return Err(ValidationError::MissingMaskPath { index });
        }
        Ok(())
    }
}

impl AnnotationFile {
    pub fn into_scenes(self) -> Vec<SceneRecord> {
        match self {
            AnnotationFile::Wrapped { scenes } => scenes,
            AnnotationFile::Bare(scenes) => scenes,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let scenes = match self {
            AnnotationFile::Wrapped { scenes } => scenes,
            AnnotationFile::Bare(scenes) => scenes,
        };
        for (i, scene) in scenes.iter().enumerate() {
            scene.validate(i)?;
        }
        Ok(())
    }
}

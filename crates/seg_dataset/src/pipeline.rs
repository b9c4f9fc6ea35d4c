//! Processing pipeline descriptions.
//!
//! Steps are opaque to this crate: a name plus free-form parameters that the
//! consuming loader interprets. Only `load_dim` is read back, to decode point
//! files when rendering.

use crate::scene_io::DEFAULT_LOAD_DIM;
use data_contracts::ClassSet;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// S3DIS label ids that map to training classes.
pub const VALID_CLASS_IDS: std::ops::Range<i64> = 0..13;
/// Largest raw label id, including the optional "stair" class.
pub const MAX_CLASS_ID: i64 = 13;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    pub steps: Vec<PipelineStep>,
}

impl PipelineStep {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            kind: kind.into(),
            params,
        }
    }
}

impl Pipeline {
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self { steps }
    }

    /// Load points with color, load semantic masks, remap ids, and collect.
    pub fn s3dis_default(classes: &ClassSet) -> Self {
        let valid: Vec<i64> = VALID_CLASS_IDS.collect();
        Self::new(vec![
            PipelineStep::new(
                "LoadPointsFromFile",
                json!({
                    "coord_type": "DEPTH",
                    "shift_height": false,
                    "use_color": true,
                    "load_dim": DEFAULT_LOAD_DIM,
                    "use_dim": (0..DEFAULT_LOAD_DIM).collect::<Vec<_>>(),
                }),
            ),
            PipelineStep::new(
                "LoadAnnotations3D",
                json!({
                    "with_bbox_3d": false,
                    "with_label_3d": false,
                    "with_mask_3d": false,
                    "with_seg_3d": true,
                }),
            ),
            PipelineStep::new(
                "PointSegClassMapping",
                json!({ "valid_cat_ids": valid, "max_cat_id": MAX_CLASS_ID }),
            ),
            PipelineStep::new(
                "DefaultFormatBundle3D",
                json!({ "with_label": false, "class_names": classes.names }),
            ),
            PipelineStep::new(
                "Collect3D",
                json!({ "keys": ["points", "pts_semantic_mask"] }),
            ),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.kind.as_str()).collect()
    }

    /// Row width of point files, from the first `LoadPointsFromFile` step.
    pub fn load_dim(&self) -> usize {
        self.steps
            .iter()
            .find(|s| s.kind == "LoadPointsFromFile")
            .and_then(|s| s.params.get("load_dim"))
            .and_then(Value::as_u64)
            .map(|d| d as usize)
            .unwrap_or(DEFAULT_LOAD_DIM)
    }

    pub fn describe(&self) -> String {
        if self.steps.is_empty() {
            return "<empty pipeline>".to_string();
        }
        self.step_names().join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_shape() {
        let p = Pipeline::s3dis_default(&ClassSet::default());
        assert_eq!(
            p.describe(),
            "LoadPointsFromFile -> LoadAnnotations3D -> PointSegClassMapping -> DefaultFormatBundle3D -> Collect3D"
        );
        assert_eq!(p.load_dim(), 6);
    }

    #[test]
    fn parses_config_steps() {
        let raw = r#"[{"type": "LoadPointsFromFile", "load_dim": 9, "use_dim": [0, 1, 2]}]"#;
        let p: Pipeline = serde_json::from_str(raw).unwrap();
        assert_eq!(p.step_names(), vec!["LoadPointsFromFile"]);
        assert_eq!(p.load_dim(), 9);
    }
}

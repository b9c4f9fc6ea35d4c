use std::fs;
use std::path::PathBuf;

use seg_dataset::{IndexSource, SourceSpec, WeightSource, DEFAULT_NUM_POINTS};
use seg_tools::ToolConfig;

fn write_temp_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("seg-tools.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn loads_minimal_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "data_root = \"data/s3dis\"\n");
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.data_root, PathBuf::from("data/s3dis"));
    assert!(cfg.scene_idxs.is_absent());
    assert_eq!(cfg.num_points, DEFAULT_NUM_POINTS);
}

#[test]
fn loads_per_partition_and_shared_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
data_root = "data/s3dis"
ann_files = ["s3dis_infos_Area_1.json", "s3dis_infos_Area_2.json"]
scene_idxs = ["seg_info/Area_1_resampled_scene_idxs.npy", "seg_info/Area_2_resampled_scene_idxs.npy"]
label_weights = [2.0, 1.0]

[classes]
names = ["wall", "floor"]
ignore_index = 2

[export]
output_root = "out"
num_points = 1024
"#,
    );
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.ann_files.len(), 2);
    assert_eq!(
        cfg.scene_idxs,
        SourceSpec::PerPartition(vec![
            IndexSource::Artifact(PathBuf::from("seg_info/Area_1_resampled_scene_idxs.npy")),
            IndexSource::Artifact(PathBuf::from("seg_info/Area_2_resampled_scene_idxs.npy")),
        ])
    );
    assert_eq!(
        cfg.label_weights,
        SourceSpec::Shared(WeightSource::Inline(vec![2.0, 1.0]))
    );
    assert_eq!(cfg.classes, Some(vec!["wall".to_string(), "floor".to_string()]));
    assert_eq!(cfg.ignore_index, Some(2));
    assert_eq!(cfg.output_root, PathBuf::from("out"));
    assert_eq!(cfg.num_points, 1024);

    let composite = cfg.composite_config();
    assert_eq!(composite.ann_files.into_vec().len(), 2);
}

#[test]
fn malformed_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "data_root = [\n");
    assert!(ToolConfig::from_path(&path).is_none());
}

#[test]
fn missing_config_file_is_none() {
    assert!(ToolConfig::from_path(std::path::Path::new("/nonexistent/seg-tools.toml")).is_none());
}

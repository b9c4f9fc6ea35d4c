use data_contracts::scene::{AnnotationFile, SceneRecord, ValidationError};
use std::path::Path;

#[test]
fn empty_mask_path_rejected() {
    let file = AnnotationFile::Bare(vec![
        SceneRecord::new("points/Area_1_office_1.bin", "semantic_mask/Area_1_office_1.bin"),
        SceneRecord::new("points/Area_1_office_2.bin", " "),
    ]);
    let err = file.validate().unwrap_err();
    assert!(matches!(err, ValidationError::MissingMaskPath { index: 1 }));
}

#[test]
fn wrapped_and_bare_files_parse() {
    let wrapped = r#"{"scenes": [{"pts_path": "p/a.bin", "pts_semantic_mask_path": "m/a.bin"}]}"#;
    let bare = r#"[{"pts_path": "p/a.bin", "pts_semantic_mask_path": "m/a.bin"}]"#;
    let a: AnnotationFile = serde_json::from_str(wrapped).unwrap();
    let b: AnnotationFile = serde_json::from_str(bare).unwrap();
    assert_eq!(a.into_scenes(), b.into_scenes());
}

#[test]
fn record_paths_join_data_root() {
    let rec = SceneRecord::new("points/Area_5_hallway_3.bin", "semantic_mask/Area_5_hallway_3.bin");
    let root = Path::new("/data/s3dis");
    assert_eq!(
        rec.mask_path(root),
        Path::new("/data/s3dis/semantic_mask/Area_5_hallway_3.bin")
    );
    assert_eq!(rec.scene_name(), "Area_5_hallway_3");
}

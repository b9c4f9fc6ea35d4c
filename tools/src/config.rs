use std::path::{Path, PathBuf};

use cli_support::DatasetOpts;
use seg_dataset::{
    AnnotationSources, CompositeConfig, IndexSource, SourceSpec, WeightSource, DEFAULT_NUM_POINTS,
};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "seg-tools.toml";
const CONFIG_ENV: &str = "SEG_TOOLS_CONFIG";

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub data_root: PathBuf,
    pub ann_files: Vec<PathBuf>,
    pub scene_idxs: SourceSpec<IndexSource>,
    pub label_weights: SourceSpec<WeightSource>,
    pub test_mode: bool,
    pub classes: Option<Vec<String>>,
    pub palette: Option<Vec<[u8; 3]>>,
    pub ignore_index: Option<usize>,
    pub output_root: PathBuf,
    pub num_points: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/s3dis"),
            ann_files: Vec::new(),
            scene_idxs: SourceSpec::Absent,
            label_weights: SourceSpec::Absent,
            test_mode: false,
            classes: None,
            palette: None,
            ignore_index: None,
            output_root: PathBuf::from("artifacts/seg_index"),
            num_points: DEFAULT_NUM_POINTS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ToolConfigFile {
    data_root: Option<String>,
    ann_files: Option<Vec<String>>,
    scene_idxs: Option<SourceSpec<IndexSource>>,
    label_weights: Option<SourceSpec<WeightSource>>,
    test_mode: Option<bool>,
    classes: Option<ClassSection>,
    export: Option<ExportSection>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassSection {
    names: Option<Vec<String>>,
    palette: Option<Vec<[u8; 3]>>,
    ignore_index: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ExportSection {
    output_root: Option<String>,
    num_points: Option<usize>,
}

impl ToolConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let cfg = Self::from_path(Path::new(&path)).unwrap_or_default();
            cfg.warn_if_invalid();
            return cfg;
        }
        let cfg = Self::from_path(Path::new(DEFAULT_CONFIG_NAME)).unwrap_or_default();
        cfg.warn_if_invalid();
        cfg
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let raw = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<ToolConfigFile>(&raw) {
            Ok(file) => Some(Self::from_file(file)),
            Err(err) => {
                log::warn!("tools config: failed to parse {}: {err}", path.display());
                None
            }
        }
    }

    fn from_file(file: ToolConfigFile) -> Self {
        let classes = file.classes.unwrap_or_default();
        let export = file.export.unwrap_or_default();
        ToolConfig {
            data_root: file
                .data_root
                .map(|v| expand_path(&v))
                .unwrap_or_else(|| PathBuf::from("data/s3dis")),
            ann_files: file
                .ann_files
                .map(|paths| paths.into_iter().map(|v| expand_path(&v)).collect())
                .unwrap_or_default(),
            scene_idxs: file
                .scene_idxs
                .map(expand_index_spec)
                .unwrap_or_default(),
            label_weights: file
                .label_weights
                .map(expand_weight_spec)
                .unwrap_or_default(),
            test_mode: file.test_mode.unwrap_or(false),
            classes: classes.names,
            palette: classes.palette,
            ignore_index: classes.ignore_index,
            output_root: export
                .output_root
                .map(|v| expand_path(&v))
                .unwrap_or_else(|| PathBuf::from("artifacts/seg_index")),
            num_points: export
                .num_points
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_NUM_POINTS),
        }
    }

    /// Apply command-line overrides. Non-empty path lists replace the configured ones.
    pub fn apply_dataset_opts(&mut self, opts: &DatasetOpts) {
        if let Some(root) = &opts.data_root {
            self.data_root = root.clone();
        }
        if !opts.ann_files.is_empty() {
            self.ann_files = opts.ann_files.clone();
        }
        if let Some(spec) = spec_from_paths(&opts.scene_idxs, IndexSource::Artifact) {
            self.scene_idxs = spec;
        }
        if let Some(spec) = spec_from_paths(&opts.label_weights, WeightSource::Artifact) {
            self.label_weights = spec;
        }
        self.test_mode |= opts.test_mode;
    }

    pub fn composite_config(&self) -> CompositeConfig {
        let mut cfg = CompositeConfig::new(
            self.data_root.clone(),
            AnnotationSources::Many(self.ann_files.clone()),
        );
        cfg.classes = self.classes.clone();
        cfg.palette = self.palette.clone();
        cfg.ignore_index = self.ignore_index;
        cfg.test_mode = self.test_mode;
        cfg.scene_idxs = self.scene_idxs.clone();
        cfg.label_weights = self.label_weights.clone();
        cfg
    }

    fn warn_if_invalid(&self) {
        if self.ann_files.is_empty() {
            log::warn!("tools config: ann_files is empty; pass --ann-file to select partitions");
        }
        if !self.test_mode && self.scene_idxs.is_absent() {
            log::warn!("tools config: scene_idxs is unset; training-mode composition will fail");
        }
        if !self.data_root.exists() {
            log::warn!(
                "tools config: data_root {} does not exist",
                self.data_root.display()
            );
        }
    }
}

/// One path is shared by every partition; several are matched to partitions in order.
fn spec_from_paths<T>(paths: &[PathBuf], wrap: impl Fn(PathBuf) -> T) -> Option<SourceSpec<T>> {
    match paths {
        [] => None,
        [one] => Some(SourceSpec::Shared(wrap(one.clone()))),
        many => Some(SourceSpec::PerPartition(
            many.iter().cloned().map(wrap).collect(),
        )),
    }
}

fn expand_index_spec(spec: SourceSpec<IndexSource>) -> SourceSpec<IndexSource> {
    let expand = |source: IndexSource| match source {
        IndexSource::Artifact(p) => IndexSource::Artifact(expand_path(&p.to_string_lossy())),
        inline => inline,
    };
    match spec {
        SourceSpec::Absent => SourceSpec::Absent,
        SourceSpec::Shared(s) => SourceSpec::Shared(expand(s)),
        SourceSpec::PerPartition(v) => SourceSpec::PerPartition(v.into_iter().map(expand).collect()),
    }
}

fn expand_weight_spec(spec: SourceSpec<WeightSource>) -> SourceSpec<WeightSource> {
    let expand = |source: WeightSource| match source {
        WeightSource::Artifact(p) => WeightSource::Artifact(expand_path(&p.to_string_lossy())),
        inline => inline,
    };
    match spec {
        SourceSpec::Absent => SourceSpec::Absent,
        SourceSpec::Shared(s) => SourceSpec::Shared(expand(s)),
        SourceSpec::PerPartition(v) => SourceSpec::PerPartition(v.into_iter().map(expand).collect()),
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

fn expand_env(input: &str) -> String {
    let mut out = String::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match std::env::var(key) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => out.push_str(&format!("${{{key}}}")),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_env_vars_are_kept_verbatim() {
        assert_eq!(
            expand_env("${SEG_TOOLS_SURELY_UNSET_VAR}/seg"),
            "${SEG_TOOLS_SURELY_UNSET_VAR}/seg"
        );
        assert_eq!(expand_env("plain/${unterminated"), "plain/${unterminated");
    }

    #[test]
    fn cli_paths_override_config_sources() {
        let mut cfg = ToolConfig::default();
        cfg.apply_dataset_opts(&DatasetOpts {
            data_root: Some(PathBuf::from("/data")),
            ann_files: vec![PathBuf::from("a.json"), PathBuf::from("b.json")],
            scene_idxs: vec![PathBuf::from("a.npy"), PathBuf::from("b.npy")],
            label_weights: vec![PathBuf::from("w.npy")],
            test_mode: false,
        });
        assert_eq!(cfg.data_root, PathBuf::from("/data"));
        assert!(matches!(cfg.scene_idxs, SourceSpec::PerPartition(ref v) if v.len() == 2));
        assert_eq!(
            cfg.label_weights,
            SourceSpec::Shared(WeightSource::Artifact(PathBuf::from("w.npy")))
        );
    }
}

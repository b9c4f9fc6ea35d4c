use clap::Args;
use std::path::PathBuf;

/// Dataset location and per-area inputs shared by the indexing tools.
///
/// Anything left unset falls back to the tools config file.
#[derive(Debug, Clone, Default, Args)]
pub struct DatasetArgs {
    /// Dataset root; scene and annotation paths are resolved against it.
    #[arg(long)]
    pub data_root: Option<PathBuf>,
    /// Annotation file per area (repeat for several areas).
    #[arg(long = "ann-file")]
    pub ann_files: Vec<PathBuf>,
    /// Sampling index artifact: once to share it, or once per area.
    #[arg(long = "scene-idxs")]
    pub scene_idxs: Vec<PathBuf>,
    /// Label weight artifact: once to share it, or once per area.
    #[arg(long = "label-weights")]
    pub label_weights: Vec<PathBuf>,
    /// Evaluation mode: each scene once, no resampling.
    #[arg(long, default_value_t = false)]
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct DatasetOpts {
    pub data_root: Option<PathBuf>,
    pub ann_files: Vec<PathBuf>,
    pub scene_idxs: Vec<PathBuf>,
    pub label_weights: Vec<PathBuf>,
    pub test_mode: bool,
}

impl From<&DatasetArgs> for DatasetOpts {
    fn from(args: &DatasetArgs) -> Self {
        DatasetOpts {
            data_root: args.data_root.clone(),
            ann_files: args.ann_files.clone(),
            scene_idxs: args.scene_idxs.clone(),
            label_weights: args.label_weights.clone(),
            test_mode: args.test_mode,
        }
    }
}

/// Output root shared across the indexing tools.
#[derive(Debug, Clone, Args)]
pub struct ExportOutputArgs {
    /// Directory for exported artifacts (defaults to the config's output_root).
    #[arg(long)]
    pub output_root: Option<PathBuf>,
    /// Artifact format: npy (default) or json.
    #[arg(long, value_parser = ["npy", "json"], default_value = "npy")]
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Npy,
    Json,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Npy => "npy",
            ArtifactFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOutputOpts {
    pub output_root: Option<PathBuf>,
    pub format: ArtifactFormat,
}

impl ExportOutputOpts {
    /// Resolve the output root, falling back to `default_root`.
    pub fn resolve_output_root(&self, default_root: &std::path::Path) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| default_root.to_path_buf())
    }
}

impl From<&ExportOutputArgs> for ExportOutputOpts {
    fn from(args: &ExportOutputArgs) -> Self {
        let format = match args.format.as_str() {
            "json" => ArtifactFormat::Json,
            _ => ArtifactFormat::Npy,
        };
        ExportOutputOpts {
            output_root: args.output_root.clone(),
            format,
        }
    }
}

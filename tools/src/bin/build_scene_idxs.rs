use anyhow::{bail, Context};
use clap::Parser;
use cli_support::{ExportOutputArgs, ExportOutputOpts};
use data_contracts::ClassSet;
use seg_dataset::load_scene_records;
use seg_tools::{collect_partition_stats, write_index, write_weights, ToolConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "build_scene_idxs",
    about = "Compute a partition's resampled scene index and class weights from its mask files"
)]
struct Args {
    /// Annotation file of the partition.
    #[arg(long)]
    ann_file: PathBuf,
    /// Dataset root (defaults to the config's data_root).
    #[arg(long)]
    data_root: Option<PathBuf>,
    /// Points drawn per training sample (defaults to the config's num_points).
    #[arg(long)]
    num_points: Option<usize>,
    /// Artifact name prefix (defaults to the annotation file stem).
    #[arg(long)]
    prefix: Option<String>,
    #[command(flatten)]
    output: ExportOutputArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = ToolConfig::load();
    let output = ExportOutputOpts::from(&args.output);
    let data_root = args.data_root.clone().unwrap_or_else(|| cfg.data_root.clone());
    let num_points = args.num_points.unwrap_or(cfg.num_points);
    if num_points == 0 {
        bail!("--num-points must be positive");
    }
    let classes = ClassSet::resolve(cfg.classes.clone(), cfg.palette.clone(), cfg.ignore_index)
        .context("resolve class set")?;

    let scenes = load_scene_records(&data_root, &args.ann_file)
        .with_context(|| format!("load annotations {}", args.ann_file.display()))?;
    let stats = collect_partition_stats(&data_root, &scenes, classes.num_classes())
        .with_context(|| format!("read masks under {}", data_root.display()))?;
    let index = stats.sampling_index(num_points);
    let weights = stats.label_weights();
    if index.is_empty() {
        log::warn!(
            "{} points total is fewer than {num_points} per sample; index is empty",
            stats.total_points()
        );
    }

    let prefix = args.prefix.clone().unwrap_or_else(|| {
        args.ann_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("partition")
            .to_string()
    });
    let out_root = output.resolve_output_root(&cfg.output_root);
    fs::create_dir_all(&out_root)
        .with_context(|| format!("create output root {}", out_root.display()))?;
    let index_path = write_index(
        &out_root,
        &format!("{prefix}_resampled_scene_idxs"),
        output.format,
        &index,
    )?;
    let weights_path = write_weights(
        &out_root,
        &format!("{prefix}_label_weight"),
        output.format,
        &weights,
    )?;

    println!(
        "{} scenes, {} points, {} samples of {num_points} points",
        scenes.len(),
        stats.total_points(),
        index.len()
    );
    println!("wrote {}", index_path.display());
    println!("wrote {}", weights_path.display());
    Ok(())
}

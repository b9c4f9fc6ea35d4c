use anyhow::Context;
use clap::Parser;
use cli_support::{DatasetArgs, DatasetOpts, ExportOutputArgs, ExportOutputOpts};
use seg_dataset::{save_scene_records, CompositeDataset, SceneRecord, SegmentationDataset};
use seg_tools::{write_index, write_weights, ToolConfig};
use std::fs;

#[derive(Parser, Debug)]
#[command(
    name = "seg_index",
    about = "Merge partitions into one dataset and export the merged sampling index and label weights"
)]
struct Args {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[command(flatten)]
    output: ExportOutputArgs,
    /// Print the merge summary without writing artifacts.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut cfg = ToolConfig::load();
    cfg.apply_dataset_opts(&DatasetOpts::from(&args.dataset));
    let output = ExportOutputOpts::from(&args.output);

    let dataset = CompositeDataset::new(cfg.composite_config()).with_context(|| {
        format!(
            "building dataset from {} partitions under {}",
            cfg.ann_files.len(),
            cfg.data_root.display()
        )
    })?;

    for (k, (partition, range)) in dataset
        .partitions()
        .iter()
        .zip(dataset.partition_ranges())
        .enumerate()
    {
        let name = partition
            .ann_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("partition {k}"));
        println!(
            "{name}: scenes {}..{} ({}), {} samples",
            range.start,
            range.end,
            partition.scene_count(),
            partition.len()
        );
    }
    println!(
        "merged: {} scenes, {} samples, {} classes{}",
        dataset.scene_count(),
        dataset.len(),
        dataset.class_set().num_classes(),
        if dataset.test_mode() { " (evaluation)" } else { "" }
    );
    println!("pipeline: {}", dataset.pipeline().describe());
    if args.dry_run {
        return Ok(());
    }

    let out_root = output.resolve_output_root(&cfg.output_root);
    fs::create_dir_all(&out_root)
        .with_context(|| format!("create output root {}", out_root.display()))?;
    let index_path = write_index(&out_root, "merged_scene_idxs", output.format, dataset.sampling_index())?;
    let weights_path = write_weights(&out_root, "merged_label_weight", output.format, dataset.label_weights())?;
    let records: Vec<SceneRecord> = (0..dataset.scene_count())
        .filter_map(|i| dataset.scene_record(i).cloned())
        .collect();
    let infos_path = out_root.join("merged_infos.json");
    save_scene_records(&infos_path, &records)?;

    println!("wrote {}", index_path.display());
    println!("wrote {}", weights_path.display());
    println!("wrote {}", infos_path.display());
    Ok(())
}

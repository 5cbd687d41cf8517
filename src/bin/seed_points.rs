use clap::Parser;
use sparse_point_seeder::config::SeedConfig;
use sparse_point_seeder::features::AkazeDetector;
use sparse_point_seeder::io::object_from_json;
use sparse_point_seeder::pipeline::{SeedOptions, seed_dataset};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct SeedCli {
    /// processed dataset folder containing transforms.json
    path: PathBuf,

    /// seeding parameters as JSON, missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// maximum reprojection error in pixels
    #[arg(long)]
    reprojection_error_pixels: Option<f64>,

    /// hold out every n-th frame for evaluation, 0 keeps all frames
    #[arg(long)]
    eval_interval: Option<usize>,

    /// compute without writing the point cloud or touching transforms.json
    #[arg(long, action)]
    dry_run: bool,

    /// save a rerun recording of keypoints, rejected matches and the cloud
    #[arg(long)]
    rerun: Option<PathBuf>,

    /// write a JSON summary of the run
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = SeedCli::parse();
    let mut config: SeedConfig = match &cli.config {
        Some(p) => object_from_json(p)?,
        None => SeedConfig::default(),
    };
    if let Some(px) = cli.reprojection_error_pixels {
        config.reprojection_error_pixels = px;
    }
    if let Some(n) = cli.eval_interval {
        config.eval_interval = n;
    }
    let recording = match &cli.rerun {
        Some(p) => Some(rerun::RecordingStreamBuilder::new("sparse_point_seeder").save(p)?),
        None => None,
    };
    let options = SeedOptions {
        dry_run: cli.dry_run,
        report_path: cli.report.clone(),
    };

    let now = Instant::now();
    let summary = seed_dataset(
        &cli.path,
        &config,
        AkazeDetector::new(config.detector_threshold),
        &options,
        recording.as_ref(),
    )?;
    println!(
        "Triangulated {} points from {} training frames ({} evaluation frames held out), {} rejected matches",
        summary.output.points.len(),
        summary.training_frames,
        summary.eval_frames,
        summary.output.rejected_count()
    );
    if let Some(p) = &summary.ply_path {
        println!("point cloud: {}", p.display());
    }
    println!("seeding took {:.3} sec", now.elapsed().as_secs_f64());
    Ok(())
}

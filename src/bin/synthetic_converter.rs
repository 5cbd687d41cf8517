use clap::{Parser, Subcommand};
use sparse_point_seeder::config::{DatasetVariant, SeedConfig};
use sparse_point_seeder::features::AkazeDetector;
use sparse_point_seeder::pipeline::{SeedOptions, seed_dataset};
use sparse_point_seeder::synthetic::{ConvertOptions, convert_synthetic};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one raw synthetic scene and seed its point cloud
    Convert {
        /// Raw scene folder holding raw_clear, raw_mb, ...
        scene: PathBuf,

        /// Output root, the scene lands in <output>/<variant output name>/<scene name>
        #[arg(short, long)]
        output: PathBuf,

        /// Dataset variant
        #[arg(short, long, value_enum)]
        variant: Vec<DatasetVariant>,

        /// Skip conversion and only seed already converted scenes
        #[arg(long, action)]
        points_only: bool,

        /// Actually perturb camera positions when adding pose noise
        #[arg(long, action)]
        apply_position_noise: bool,

        /// Compute without writing anything
        #[arg(long, action)]
        dry_run: bool,

        /// Maximum reprojection error in pixels
        #[arg(long, default_value = "10")]
        reprojection_error_pixels: f64,
    },
}

fn convert_scene(
    scene: &Path,
    output: &Path,
    variant: DatasetVariant,
    points_only: bool,
    apply_position_noise: bool,
    dry_run: bool,
    config: &SeedConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = variant.settings();
    let raw_dir = scene.join(settings.raw_subfolder);
    if !raw_dir.exists() {
        log::warn!("{:?} has no {}, skipped", scene, settings.raw_subfolder);
        return Ok(());
    }
    let scene_name = scene.file_name().ok_or("scene path has no folder name")?;
    let target = output.join(settings.output_name).join(scene_name);
    if !points_only && !dry_run {
        let options = ConvertOptions {
            apply_position_noise,
            ..ConvertOptions::from(settings)
        };
        convert_synthetic(&raw_dir, &target, &options)?;
    }
    if target.exists() {
        let summary = seed_dataset(
            &target,
            config,
            AkazeDetector::new(config.detector_threshold),
            &SeedOptions {
                dry_run,
                report_path: None,
            },
            None,
        )?;
        println!(
            "{}: triangulated {} points",
            target.display(),
            summary.output.points.len()
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Convert {
            scene,
            output,
            variant,
            points_only,
            apply_position_noise,
            dry_run,
            reprojection_error_pixels,
        } => {
            let config = SeedConfig {
                reprojection_error_pixels,
                ..SeedConfig::default()
            };
            let variants = if variant.is_empty() {
                DatasetVariant::ALL.to_vec()
            } else {
                variant
            };
            for v in variants {
                convert_scene(
                    &scene,
                    &output,
                    v,
                    points_only,
                    apply_position_noise,
                    dry_run,
                    &config,
                )?;
            }
        }
    }

    Ok(())
}

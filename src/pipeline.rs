use std::path::{Path, PathBuf};

use log::info;

use crate::config::SeedConfig;
use crate::data_loader::load_dataset;
use crate::error::SeedResult;
use crate::features::FeatureDetector;
use crate::ply::save_ply;
use crate::seeder::{SeedOutput, SparsePointSeeder};
use crate::visualization::log_seed_output;

#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    /// Compute everything but leave the dataset untouched.
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub output: SeedOutput,
    pub training_frames: usize,
    pub eval_frames: usize,
    pub ply_path: Option<PathBuf>,
}

/// Seeds a processed dataset in place.
///
/// Reads `<root>/transforms.json`, triangulates the training frames, then
/// writes the point cloud next to the pose file and records its path in it.
/// Nothing is written when the run fails.
pub fn seed_dataset<D: FeatureDetector>(
    dataset_root: &Path,
    config: &SeedConfig,
    detector: D,
    options: &SeedOptions,
    recording: Option<&rerun::RecordingStream>,
) -> SeedResult<SeedSummary> {
    let mut dataset = load_dataset(dataset_root, config.eval_interval)?;
    let seeder = SparsePointSeeder::new(detector, dataset.intrinsics, config.reprojection_error_pixels);
    let output = seeder.seed(&dataset.frames)?;

    if let Some(recording) = recording {
        log_seed_output(recording, &dataset.frames, &output, config.reprojection_error_pixels)?;
    }

    let ply_path = if options.dry_run {
        info!("dry run, {:?} left untouched", dataset_root);
        None
    } else {
        let ply_path = dataset_root.join(&config.ply_file_name);
        save_ply(&ply_path, &output.colored_points())?;
        dataset.pose_file.set_point_cloud(&config.ply_file_name);
        dataset.pose_file.save(&dataset.pose_file_path())?;
        info!("wrote {} points to {:?}", output.points.len(), ply_path);
        Some(ply_path)
    };

    if let Some(report_path) = &options.report_path {
        crate::io::write_seed_report(report_path, &output, config.reprojection_error_pixels)?;
    }

    Ok(SeedSummary {
        training_frames: dataset.frames.len(),
        eval_frames: dataset.eval_frame_count,
        output,
        ply_path,
    })
}

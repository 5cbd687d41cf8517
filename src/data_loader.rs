use std::path::{Path, PathBuf};

use image::ImageReader;
use indicatif::ParallelProgressIterator;
use log::{info, trace};
use rayon::prelude::*;

use crate::error::{SeedError, SeedResult};
use crate::pose_file::{POSE_FILE_NAME, PoseFile, PoseFrame};
use crate::seeder::SeedFrame;
use crate::types::Intrinsics;

/// A processed dataset: the pose file, its intrinsics and the decoded training frames.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub root: PathBuf,
    pub pose_file: PoseFile,
    pub intrinsics: Intrinsics,
    pub frames: Vec<SeedFrame>,
    pub eval_frame_count: usize,
}

impl Dataset {
    pub fn pose_file_path(&self) -> PathBuf {
        self.root.join(POSE_FILE_NAME)
    }
}

fn load_image(path: &Path) -> SeedResult<image::DynamicImage> {
    let img = ImageReader::open(path)
        .map_err(|e| SeedError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| SeedError::io(path, e))?
        .decode()
        .map_err(|source| SeedError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(img)
}

/// Decodes the images of `frames` in parallel, keeping their order.
///
/// A single unreadable image aborts the whole load.
pub fn load_frames(dataset_root: &Path, frames: &[&PoseFrame]) -> SeedResult<Vec<SeedFrame>> {
    frames
        .par_iter()
        .progress_count(frames.len() as u64)
        .map(|f| {
            let frame = f.camera_frame(dataset_root);
            trace!("loading {:?}", frame.image_path);
            let image = load_image(&frame.image_path)?;
            Ok(SeedFrame { frame, image })
        })
        .collect()
}

/// Loads `<root>/transforms.json` and the images of its training frames.
pub fn load_dataset(dataset_root: &Path, eval_interval: usize) -> SeedResult<Dataset> {
    let pose_file = PoseFile::load(&dataset_root.join(POSE_FILE_NAME))?;
    let intrinsics = pose_file.intrinsics()?;
    let (training, eval) = pose_file.split_frames(eval_interval)?;
    info!(
        "{:?}: {} training frames, {} evaluation frames",
        dataset_root,
        training.len(),
        eval.len()
    );
    let frames = load_frames(dataset_root, &training)?;
    let eval_frame_count = eval.len();
    Ok(Dataset {
        root: dataset_root.to_path_buf(),
        pose_file,
        intrinsics,
        frames,
        eval_frame_count,
    })
}

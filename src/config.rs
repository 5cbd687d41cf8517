use serde::{Deserialize, Serialize};

/// Parameters of one seeding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Largest accepted reprojection error in pixels, in both frames of a match.
    pub reprojection_error_pixels: f64,
    /// Every n-th frame (sorted by path) is held out for evaluation. 0 disables the split.
    pub eval_interval: usize,
    /// Point cloud file written next to the pose file.
    pub ply_file_name: String,
    /// AKAZE detector response threshold.
    pub detector_threshold: f64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            reprojection_error_pixels: 10.0,
            eval_interval: 8,
            ply_file_name: "sparse_pc.ply".to_string(),
            detector_threshold: 0.001,
        }
    }
}

/// Parameters of a synthetic dataset variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSettings {
    pub output_name: &'static str,
    pub raw_subfolder: &'static str,
    pub noisy_poses: bool,
    pub noisy_intrinsics: bool,
}

/// The processed variants of the synthetic benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DatasetVariant {
    Clear,
    Posenoise,
    Rs,
    Mb,
    MbPosenoise,
    Mbrs,
    MbrsPosenoise,
    MbrsPoseCalibNoise,
}

impl DatasetVariant {
    pub const ALL: [DatasetVariant; 8] = [
        DatasetVariant::Posenoise,
        DatasetVariant::Rs,
        DatasetVariant::Mb,
        DatasetVariant::MbPosenoise,
        DatasetVariant::Clear,
        DatasetVariant::Mbrs,
        DatasetVariant::MbrsPosenoise,
        DatasetVariant::MbrsPoseCalibNoise,
    ];

    pub fn settings(&self) -> VariantSettings {
        let (output_name, raw_subfolder, noisy_poses, noisy_intrinsics) = match self {
            DatasetVariant::Clear => ("synthetic-clear", "raw_clear", false, false),
            DatasetVariant::Posenoise => ("synthetic-posenoise", "raw_clear", true, false),
            DatasetVariant::Rs => ("synthetic-rs", "raw_rs", false, false),
            DatasetVariant::Mb => ("synthetic-mb", "raw_mb", false, false),
            DatasetVariant::MbPosenoise => ("synthetic-mb-posenoise", "raw_mb", true, false),
            DatasetVariant::Mbrs => ("synthetic-mbrs", "raw_mbrs", false, false),
            DatasetVariant::MbrsPosenoise => ("synthetic-mbrs-posenoise", "raw_mbrs", true, false),
            DatasetVariant::MbrsPoseCalibNoise => {
                ("synthetic-mbrs-pose-calib-noise", "raw_mbrs", true, true)
            }
        };
        VariantSettings {
            output_name,
            raw_subfolder,
            noisy_poses,
            noisy_intrinsics,
        }
    }
}

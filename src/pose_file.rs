use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SeedError, SeedResult};
use crate::io::{object_from_json, object_to_json};
use crate::types::{CameraFrame, CameraPose, Intrinsics};

pub const POSE_FILE_NAME: &str = "transforms.json";

/// One entry of `frames` in a `transforms.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_linear_velocity: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_angular_velocity: Option<[f64; 3]>,
    pub file_path: String,
    pub transform_matrix: [[f64; 4]; 4],
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PoseFrame {
    pub fn pose(&self) -> CameraPose {
        CameraPose::from_rows(&self.transform_matrix)
    }

    pub fn camera_frame(&self, dataset_root: &Path) -> CameraFrame {
        CameraFrame {
            pose: self.pose(),
            image_path: dataset_root.join(&self.file_path),
        }
    }

    /// Sum of linear and angular velocity norms, zero when the frame carries no velocities.
    pub fn velocity_norm(&self) -> f64 {
        let norm = |v: &Option<[f64; 3]>| {
            v.map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
                .unwrap_or(0.0)
        };
        norm(&self.camera_linear_velocity) + norm(&self.camera_angular_velocity)
    }
}

/// A `transforms.json` pose file.
///
/// Only the fields the seeder needs are typed. Everything else is kept in
/// `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFile {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub frames: Vec<PoseFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ply_file_path: Option<String>,
}

impl PoseFile {
    pub fn load(path: &Path) -> SeedResult<PoseFile> {
        object_from_json(path)
    }

    pub fn save(&self, path: &Path) -> SeedResult<()> {
        object_to_json(path, self)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(Value::as_f64)
    }

    /// Intrinsics from `fl_x`/`fl_y`/`cx`/`cy`, or from a horizontal field of view
    /// (`fov` or `camera_angle_x`) and the image size.
    pub fn intrinsics(&self) -> SeedResult<Intrinsics> {
        let w = self.number("w");
        let h = self.number("h");
        if let Some(fl_x) = self.number("fl_x") {
            let fl_y = self.number("fl_y").unwrap_or(fl_x);
            let cx = self
                .number("cx")
                .or(w.map(|w| w / 2.0))
                .ok_or(SeedError::MissingField("cx"))?;
            let cy = self
                .number("cy")
                .or(h.map(|h| h / 2.0))
                .ok_or(SeedError::MissingField("cy"))?;
            return Ok(Intrinsics::new(fl_x, fl_y, cx, cy));
        }
        let fov = self
            .number("fov")
            .or(self.number("camera_angle_x"))
            .ok_or(SeedError::MissingField("fl_x or fov"))?;
        let w = w.ok_or(SeedError::MissingField("w"))?;
        let h = h.ok_or(SeedError::MissingField("h"))?;
        debug!("intrinsics from fov {} rad for {}x{}", fov, w, h);
        Ok(Intrinsics::from_fov(fov, w, h))
    }

    /// Frames sorted by `file_path`, split into (training, evaluation).
    ///
    /// Every `eval_interval`-th frame, starting with the first, is an
    /// evaluation frame and must be static. `eval_interval == 0` keeps all
    /// frames for training.
    pub fn split_frames(&self, eval_interval: usize) -> SeedResult<(Vec<&PoseFrame>, Vec<&PoseFrame>)> {
        let mut sorted: Vec<&PoseFrame> = self.frames.iter().collect();
        sorted.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        let mut training = Vec::new();
        let mut eval = Vec::new();
        for (i, f) in sorted.into_iter().enumerate() {
            if eval_interval > 0 && i % eval_interval == 0 {
                let velocity = f.velocity_norm();
                if velocity != 0.0 {
                    return Err(SeedError::MovingEvalFrame {
                        file_path: f.file_path.clone(),
                        velocity,
                    });
                }
                eval.push(f);
            } else {
                training.push(f);
            }
        }
        Ok((training, eval))
    }

    /// Points the pose file at a point cloud stored next to it.
    pub fn set_point_cloud(&mut self, ply_file_name: &str) {
        self.ply_file_path = Some(format!("./{}", ply_file_name));
    }
}

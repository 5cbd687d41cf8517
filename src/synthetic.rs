use std::path::Path;

use log::{info, warn};
use nalgebra as na;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use crate::config::VariantSettings;
use crate::error::{SeedError, SeedResult};
use crate::io::object_from_json;
use crate::noise::{DeterministicUniform, random_small_rotation, rotation_matrix_to_rotvec};
use crate::pose_file::{POSE_FILE_NAME, PoseFile, PoseFrame};
use crate::types::CameraPose;

pub const POSE_POSITION_NOISE_REL: f64 = 0.05;
pub const POSE_ORIENTATION_NOISE_DEG: f64 = 1.0;
pub const INTRINSIC_NOISE_REL: f64 = 0.01;

/// Frame of a raw synthetic render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
    pub transform_matrix: [[f64; 4]; 4],
    pub filename: String,
    #[serde(default)]
    pub blurcount: usize,
    #[serde(default)]
    pub blur_matrices: Vec<[[f64; 4]; 4]>,
}

/// `transforms.json` of a raw synthetic render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPoseFile {
    pub frames: Vec<RawFrame>,
    pub fov: f64,
    pub h: u32,
    pub w: u32,
    pub exposure_time: f64,
    pub rolling_shutter_time: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub noisy_poses: bool,
    pub noisy_intrinsics: bool,
    /// Position noise is always drawn but only applied with this set, so
    /// existing benchmark datasets are reproduced by default.
    pub apply_position_noise: bool,
}

impl From<VariantSettings> for ConvertOptions {
    fn from(v: VariantSettings) -> Self {
        ConvertOptions {
            noisy_poses: v.noisy_poses,
            noisy_intrinsics: v.noisy_intrinsics,
            apply_position_noise: false,
        }
    }
}

/// `1 / |first column of R|`, undoes a uniform scale baked into the rotation block.
pub fn pose_scaling(m: &na::Matrix4<f64>) -> f64 {
    1.0 / m.fixed_view::<3, 1>(0, 0).norm()
}

/// Multiplies the top three rows (rotation and translation) by `scaling`.
pub fn scale_pose(rows: &[[f64; 4]; 4], scaling: f64) -> CameraPose {
    let mut m = *CameraPose::from_rows(rows).matrix();
    let mut top = m.fixed_view_mut::<3, 4>(0, 0);
    top *= scaling;
    CameraPose::from_matrix(m)
}

/// Linear and angular camera-frame velocity over the exposure of a blurred frame.
pub fn blur_velocities(
    pose: &CameraPose,
    blur_poses: &[CameraPose],
    exposure_time: f64,
    rolling_shutter_time: f64,
) -> (na::Vector3<f64>, na::Vector3<f64>) {
    let (Some(first), Some(last)) = (blur_poses.first(), blur_poses.last()) else {
        return (na::Vector3::zeros(), na::Vector3::zeros());
    };
    let duration = exposure_time + rolling_shutter_time;
    let velocity_w = (last.position() - first.position()) / duration;
    let rot = last.rotation() * first.rotation().transpose();
    let ang_vel_w = rotation_matrix_to_rotvec(&rot) / duration;
    let r_w2c = pose.rotation().transpose();
    (r_w2c * velocity_w, r_w2c * ang_vel_w)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Perturbs orientations (and optionally positions) with the deterministic generator.
pub fn add_pose_noise(frames: &mut [PoseFrame], rng: &mut DeterministicUniform, apply_position_noise: bool) {
    if frames.is_empty() {
        return;
    }
    let positions: Vec<na::Vector3<f64>> = frames.iter().map(|f| f.pose().position()).collect();
    let center = positions.iter().sum::<na::Vector3<f64>>() / positions.len() as f64;
    let scene_motion_scale = positions
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0, f64::max);
    let pos_noise_scale = POSE_POSITION_NOISE_REL * scene_motion_scale;
    info!(
        "center point of scene cameras {:?} scale {}, pose noise scale +-{}",
        center.as_slice(),
        scene_motion_scale,
        pos_noise_scale
    );
    if !apply_position_noise {
        warn!("position noise is drawn but not applied, pass apply_position_noise to perturb positions");
    }
    for f in frames.iter_mut() {
        let pose = f.pose();
        let position_noise = rng.rand3() * pos_noise_scale;
        let position = if apply_position_noise {
            pose.position() + position_noise
        } else {
            pose.position()
        };
        let noise_r = random_small_rotation(rng, POSE_ORIENTATION_NOISE_DEG);
        let mut m = *pose.matrix();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&(pose.rotation() * noise_r));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&position);
        f.transform_matrix = CameraPose::from_matrix(m).to_rows();
    }
}

/// Converts raw synthetic metadata to the benchmark pose file. Image paths become `./images/<name>`.
pub fn convert_pose_file(raw: &RawPoseFile, options: &ConvertOptions) -> SeedResult<PoseFile> {
    let focal_length = raw.w as f64 / 2.0 / (raw.fov / 2.0).tan();
    let (noise_x, noise_y) = if options.noisy_intrinsics {
        (1.0 + INTRINSIC_NOISE_REL, 1.0 - INTRINSIC_NOISE_REL)
    } else {
        (1.0, 1.0)
    };

    let mut extra = Map::new();
    extra.insert("aabb_scale".into(), json!(16));
    extra.insert("w".into(), json!(raw.w));
    extra.insert("h".into(), json!(raw.h));
    extra.insert("cx".into(), json!(raw.w as f64 / 2.0));
    extra.insert("cy".into(), json!(raw.h as f64 / 2.0));
    extra.insert("orientation_override".into(), json!("none"));
    extra.insert("exposure_time".into(), json!(raw.exposure_time));
    extra.insert("rolling_shutter_time".into(), json!(raw.rolling_shutter_time));
    extra.insert("fl_x".into(), json!(focal_length * noise_x));
    extra.insert("fl_y".into(), json!(focal_length * noise_y));
    for k in ["k1", "k2", "p1", "p2"] {
        extra.insert(k.into(), json!(0));
    }

    let mut scaling = None;
    let mut frames = Vec::with_capacity(raw.frames.len());
    for raw_frame in &raw.frames {
        let s = *scaling.get_or_insert_with(|| {
            pose_scaling(CameraPose::from_rows(&raw_frame.transform_matrix).matrix())
        });
        let pose = scale_pose(&raw_frame.transform_matrix, s);
        let (velocity, angular_velocity) = if raw_frame.blurcount == 0 {
            (na::Vector3::zeros(), na::Vector3::zeros())
        } else {
            if raw_frame.blur_matrices.len() < raw_frame.blurcount {
                return Err(SeedError::MissingField("blur_matrices"));
            }
            let blur_poses: Vec<CameraPose> = raw_frame.blur_matrices[..raw_frame.blurcount]
                .iter()
                .map(|m| scale_pose(m, s))
                .collect();
            blur_velocities(&pose, &blur_poses, raw.exposure_time, raw.rolling_shutter_time)
        };
        frames.push(PoseFrame {
            camera_linear_velocity: Some([velocity.x, velocity.y, velocity.z]),
            camera_angular_velocity: Some([angular_velocity.x, angular_velocity.y, angular_velocity.z]),
            file_path: format!("./images/{}", file_name(&raw_frame.filename)),
            transform_matrix: pose.to_rows(),
            extra: Map::new(),
        });
    }

    let mut rng = DeterministicUniform::default();
    if options.noisy_poses {
        add_pose_noise(&mut frames, &mut rng, options.apply_position_noise);
    }

    Ok(PoseFile {
        extra,
        frames,
        ply_file_path: None,
    })
}

/// Converts `<raw_dir>/transforms.json` and its images into `target`, replacing it.
pub fn convert_synthetic(raw_dir: &Path, target: &Path, options: &ConvertOptions) -> SeedResult<PoseFile> {
    info!("Processing: {:?} -> {:?}", raw_dir, target);
    if target.exists() {
        std::fs::remove_dir_all(target).map_err(|e| SeedError::io(target, e))?;
    }
    let images_dir = target.join("images");
    std::fs::create_dir_all(&images_dir).map_err(|e| SeedError::io(&images_dir, e))?;

    let raw: RawPoseFile = object_from_json(&raw_dir.join(POSE_FILE_NAME))?;
    let pose_file = convert_pose_file(&raw, options)?;
    for raw_frame in &raw.frames {
        let src = raw_dir.join(&raw_frame.filename);
        let name = file_name(&raw_frame.filename);
        let dst = images_dir.join(&name);
        std::fs::copy(&src, &dst).map_err(|e| SeedError::io(&src, e))?;
        log::debug!("frame {} saved!", name);
    }
    pose_file.save(&target.join(POSE_FILE_NAME))?;
    Ok(pose_file)
}

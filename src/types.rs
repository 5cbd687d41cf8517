use std::path::PathBuf;

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Depth below which a point counts as behind the camera.
pub const MIN_DEPTH: f64 = 1e-6;

/// Pinhole intrinsics shared by every frame of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fl_x: f64,
    pub fl_y: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    pub fn new(fl_x: f64, fl_y: f64, cx: f64, cy: f64) -> Intrinsics {
        Intrinsics { fl_x, fl_y, cx, cy }
    }

    /// Focal length from a horizontal field of view in radians, principal point at the center.
    pub fn from_fov(fov: f64, w: f64, h: f64) -> Intrinsics {
        let fl = w / 2.0 / (fov / 2.0).tan();
        Intrinsics::new(fl, fl, w / 2.0, h / 2.0)
    }

    /// Unit ray in camera space. The camera looks down -z with +y up, pixel y grows downwards.
    pub fn pixel_to_ray(&self, p2d: &na::Vector2<f64>) -> na::Vector3<f64> {
        let x = (p2d.x - self.cx) / self.fl_x;
        let y = -(p2d.y - self.cy) / self.fl_y;
        na::Vector3::new(x, y, -1.0).normalize()
    }

    /// Inverse of [`Intrinsics::pixel_to_ray`]. `None` when the point is not in front of the camera.
    pub fn camera_to_pixel(&self, p_cam: &na::Vector3<f64>) -> Option<na::Vector2<f64>> {
        if -p_cam.z <= MIN_DEPTH {
            return None;
        }
        let x = p_cam.x / -p_cam.z;
        let y = p_cam.y / -p_cam.z;
        Some(na::Vector2::new(
            x * self.fl_x + self.cx,
            -y * self.fl_y + self.cy,
        ))
    }
}

/// Camera-to-world transform, kept exactly as read from the pose file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    c2w: na::Matrix4<f64>,
}

impl CameraPose {
    pub fn from_matrix(c2w: na::Matrix4<f64>) -> CameraPose {
        CameraPose { c2w }
    }

    pub fn from_rows(rows: &[[f64; 4]; 4]) -> CameraPose {
        CameraPose {
            c2w: na::Matrix4::from_fn(|r, c| rows[r][c]),
        }
    }

    pub fn from_rotation_position(
        rotation: &na::Matrix3<f64>,
        position: &na::Vector3<f64>,
    ) -> CameraPose {
        let mut c2w = na::Matrix4::identity();
        c2w.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        c2w.fixed_view_mut::<3, 1>(0, 3).copy_from(position);
        CameraPose { c2w }
    }

    pub fn matrix(&self) -> &na::Matrix4<f64> {
        &self.c2w
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.c2w[(r, c)];
            }
        }
        rows
    }

    pub fn rotation(&self) -> na::Matrix3<f64> {
        self.c2w.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn position(&self) -> na::Vector3<f64> {
        self.c2w.fixed_view::<3, 1>(0, 3).into_owned()
    }

    pub fn world_to_camera(&self, p_world: &na::Vector3<f64>) -> na::Vector3<f64> {
        self.rotation().transpose() * (p_world - self.position())
    }

    /// World-space unit ray through a pixel.
    pub fn pixel_ray(&self, intrinsics: &Intrinsics, p2d: &na::Vector2<f64>) -> na::Vector3<f64> {
        self.rotation() * intrinsics.pixel_to_ray(p2d)
    }

    pub fn project(
        &self,
        intrinsics: &Intrinsics,
        p_world: &na::Vector3<f64>,
    ) -> Option<na::Vector2<f64>> {
        intrinsics.camera_to_pixel(&self.world_to_camera(p_world))
    }
}

/// A posed image. The intrinsics are held by the dataset, not by the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub pose: CameraPose,
    pub image_path: PathBuf,
}

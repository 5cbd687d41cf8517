#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use glam::Vec2;
use image::{DynamicImage, GenericImageView, RgbImage};
use nalgebra as na;
use sparse_point_seeder::detected_points::{Descriptor, FrameFeatures, Keypoint};
use sparse_point_seeder::features::FeatureDetector;
use sparse_point_seeder::seeder::SeedFrame;
use sparse_point_seeder::types::{CameraFrame, CameraPose, Intrinsics};

pub const W: u32 = 640;
pub const H: u32 = 480;

pub fn intrinsics() -> Intrinsics {
    Intrinsics::new(500.0, 500.0, 320.0, 240.0)
}

/// Camera at `position` looking down -z.
pub fn camera_at(x: f64, y: f64, z: f64) -> CameraPose {
    CameraPose::from_rotation_position(&na::Matrix3::identity(), &na::Vector3::new(x, y, z))
}

pub fn scene_points() -> Vec<na::Vector3<f64>> {
    let mut points = Vec::new();
    for i in 0..5 {
        for j in 0..4 {
            let z = if (i + j) % 2 == 0 { 0.3 } else { -0.4 };
            points.push(na::Vector3::new(-1.0 + 0.5 * i as f64, -0.8 + 0.5 * j as f64, z));
        }
    }
    points
}

pub fn pattern_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

/// Identifies frames by image width and returns precomputed features.
pub struct StubDetector {
    pub by_width: HashMap<u32, FrameFeatures>,
}

impl FeatureDetector for StubDetector {
    fn detect(&self, img: &DynamicImage) -> Result<FrameFeatures, String> {
        Ok(self.by_width.get(&img.width()).cloned().unwrap_or_default())
    }
}

/// Frames see every scene point; keypoint `k` describes point `k` with a unique float descriptor.
pub fn synthetic_scene(poses: &[CameraPose]) -> (Vec<SeedFrame>, StubDetector) {
    let points = scene_points();
    let intr = intrinsics();
    let mut by_width = HashMap::new();
    let frames = poses
        .iter()
        .enumerate()
        .map(|(idx, pose)| {
            let width = W + idx as u32;
            let keypoints = points
                .iter()
                .enumerate()
                .filter_map(|(id, p)| {
                    let p2d = pose.project(&intr, p)?;
                    Some(Keypoint::new(
                        Vec2::new(p2d.x as f32, p2d.y as f32),
                        Descriptor::Float(vec![id as f32 * 10.0, 1.0]),
                    ))
                })
                .collect();
            by_width.insert(width, FrameFeatures::new(keypoints));
            SeedFrame {
                frame: CameraFrame {
                    pose: *pose,
                    image_path: PathBuf::from(format!("frame_{:03}.png", idx)),
                },
                image: pattern_image(width, H),
            }
        })
        .collect();
    (frames, StubDetector { by_width })
}

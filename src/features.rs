use glam::Vec2;
use image::DynamicImage;
use log::trace;

use crate::detected_points::{Descriptor, FrameFeatures, Keypoint};

/// Keypoint detection and description of a single image.
///
/// Implementations must describe every image with the same descriptor layout,
/// otherwise matching between frames is rejected. An image without features
/// yields an empty [`FrameFeatures`], errors are reserved for broken input.
pub trait FeatureDetector: Sync {
    fn detect(&self, img: &DynamicImage) -> Result<FrameFeatures, String>;
}

const MIN_IMAGE_SIDE: u32 = 16;

/// AKAZE keypoints with binary M-LDB descriptors.
#[derive(Debug, Clone, Copy)]
pub struct AkazeDetector {
    akaze: akaze::Akaze,
}

impl AkazeDetector {
    /// `threshold` is the detector response threshold, lower values give denser features.
    pub fn new(threshold: f64) -> AkazeDetector {
        AkazeDetector {
            akaze: akaze::Akaze::new(threshold),
        }
    }
}

impl Default for AkazeDetector {
    fn default() -> Self {
        AkazeDetector {
            akaze: akaze::Akaze::default(),
        }
    }
}

impl FeatureDetector for AkazeDetector {
    fn detect(&self, img: &DynamicImage) -> Result<FrameFeatures, String> {
        // akaze is built against its own image version, hand the pixels over as a raw gray buffer
        let luma = img.to_luma8();
        let (w, h) = luma.dimensions();
        // the contrast factor is undefined without gradients
        let flat = luma.as_raw().windows(2).all(|p| p[0] == p[1]);
        if w < MIN_IMAGE_SIDE || h < MIN_IMAGE_SIDE || flat {
            trace!("{}x{} image without texture, no keypoints", w, h);
            return Ok(FrameFeatures::default());
        }
        let gray = akaze_image::GrayImage::from_raw(w, h, luma.into_raw())
            .ok_or_else(|| format!("gray buffer does not fit {}x{}", w, h))?;
        let (keypoints, descriptors) = self
            .akaze
            .extract(&akaze_image::DynamicImage::ImageLuma8(gray));
        trace!("akaze found {} keypoints", keypoints.len());
        let keypoints = keypoints
            .iter()
            .zip(descriptors.iter())
            .map(|(kp, d)| {
                Keypoint::new(
                    Vec2::new(kp.point.0, kp.point.1),
                    Descriptor::Binary(d.to_vec()),
                )
            })
            .collect();
        Ok(FrameFeatures::new(keypoints))
    }
}

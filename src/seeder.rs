use glam::Vec2;
use image::{DynamicImage, GenericImageView};
use indicatif::ParallelProgressIterator;
use log::{debug, info, trace};
use nalgebra as na;
use rayon::prelude::*;

use crate::detected_points::{DescriptorLayout, FrameFeatures};
use crate::error::{SeedError, SeedResult};
use crate::features::FeatureDetector;
use crate::matching::cross_check_match;
use crate::ply::ColoredPoint;
use crate::triangulation::{PairTriangulation, triangulate_matches};
use crate::types::{CameraFrame, Intrinsics};

/// A posed frame with its decoded image.
#[derive(Debug, Clone)]
pub struct SeedFrame {
    pub frame: CameraFrame,
    pub image: DynamicImage,
}

/// Which match produced a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    pub frame_i: usize,
    pub frame_j: usize,
    pub query_idx: usize,
    pub train_idx: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriangulatedPoint {
    pub position: na::Vector3<f64>,
    pub color: [u8; 3],
    pub provenance: Provenance,
}

/// Matching and triangulation of frames `i < j`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub i: usize,
    pub j: usize,
    pub triangulation: PairTriangulation,
}

#[derive(Debug, Clone, Default)]
pub struct SeedOutput {
    pub features: Vec<FrameFeatures>,
    pub pairs: Vec<PairResult>,
    pub points: Vec<TriangulatedPoint>,
}

impl SeedOutput {
    pub fn rejected_count(&self) -> usize {
        self.pairs.iter().map(|p| p.triangulation.rejected.len()).sum()
    }

    pub fn colored_points(&self) -> Vec<ColoredPoint> {
        self.points
            .iter()
            .map(|p| ColoredPoint::new(p.position, p.color))
            .collect()
    }
}

/// Nearest pixel to `p2d`, clamped to the image.
pub fn sample_color(img: &DynamicImage, p2d: Vec2) -> [u8; 3] {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return [0, 0, 0];
    }
    let x = (p2d.x.round().max(0.0) as u32).min(w - 1);
    let y = (p2d.y.round().max(0.0) as u32).min(h - 1);
    let px = img.get_pixel(x, y);
    [px[0], px[1], px[2]]
}

/// All unordered frame pairs `(i, j)` with `i < j`, in row order.
pub fn frame_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Every frame must describe its keypoints with the same descriptor layout.
pub fn check_descriptor_layouts(features: &[FrameFeatures]) -> SeedResult<Option<DescriptorLayout>> {
    let mut expected: Option<DescriptorLayout> = None;
    for (frame, f) in features.iter().enumerate() {
        let layout = f.layout().map_err(|(a, b)| SeedError::DescriptorMismatch {
            frame,
            expected: a.to_string(),
            found: b.to_string(),
        })?;
        match (expected, layout) {
            (Some(e), Some(l)) if e != l => {
                return Err(SeedError::DescriptorMismatch {
                    frame,
                    expected: e.to_string(),
                    found: l.to_string(),
                });
            }
            (None, Some(l)) => expected = Some(l),
            _ => {}
        }
    }
    Ok(expected)
}

/// Detect, match, triangulate, filter and colour.
///
/// Frame pairs are independent and processed in parallel; results are kept in
/// `(i, j)` order so the output is deterministic.
pub struct SparsePointSeeder<D: FeatureDetector> {
    detector: D,
    intrinsics: Intrinsics,
    reprojection_error_pixels: f64,
}

impl<D: FeatureDetector> SparsePointSeeder<D> {
    pub fn new(detector: D, intrinsics: Intrinsics, reprojection_error_pixels: f64) -> Self {
        SparsePointSeeder {
            detector,
            intrinsics,
            reprojection_error_pixels,
        }
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn detect(&self, frames: &[SeedFrame]) -> SeedResult<Vec<FrameFeatures>> {
        frames
            .par_iter()
            .enumerate()
            .progress_count(frames.len() as u64)
            .map(|(idx, f)| {
                let features = self
                    .detector
                    .detect(&f.image)
                    .map_err(|reason| SeedError::Detection { frame: idx, reason })?;
                trace!("frame {} {:?}: {} keypoints", idx, f.frame.image_path, features.len());
                Ok(features)
            })
            .collect()
    }

    pub fn match_and_triangulate(
        &self,
        frames: &[SeedFrame],
        features: &[FrameFeatures],
    ) -> SeedResult<Vec<PairResult>> {
        let pairs = frame_pairs(frames.len().min(features.len()));
        pairs
            .par_iter()
            .progress_count(pairs.len() as u64)
            .map(|&(i, j)| {
                let kps_i = &features[i].keypoints;
                let kps_j = &features[j].keypoints;
                let matches =
                    cross_check_match(kps_i, kps_j).map_err(|(a, b)| SeedError::DescriptorMismatch {
                        frame: j,
                        expected: a.to_string(),
                        found: b.to_string(),
                    })?;
                let triangulation = triangulate_matches(
                    kps_i,
                    kps_j,
                    &frames[i].frame.pose,
                    &frames[j].frame.pose,
                    &self.intrinsics,
                    &matches,
                    self.reprojection_error_pixels,
                );
                debug!(
                    "pair ({}, {}): {} matches, {} accepted",
                    i,
                    j,
                    matches.len(),
                    triangulation.accepted.len()
                );
                Ok(PairResult { i, j, triangulation })
            })
            .collect()
    }

    /// Colours the accepted matches with frame `i`'s pixel at the query keypoint.
    pub fn collect_points(
        frames: &[SeedFrame],
        features: &[FrameFeatures],
        pairs: &[PairResult],
    ) -> Vec<TriangulatedPoint> {
        pairs
            .iter()
            .flat_map(|pair| {
                pair.triangulation.accepted.iter().map(move |a| {
                    let m = a.feature_match;
                    let p2d = features[pair.i].keypoints[m.query_idx].p2d;
                    TriangulatedPoint {
                        position: a.point,
                        color: sample_color(&frames[pair.i].image, p2d),
                        provenance: Provenance {
                            frame_i: pair.i,
                            frame_j: pair.j,
                            query_idx: m.query_idx,
                            train_idx: m.train_idx,
                        },
                    }
                })
            })
            .collect()
    }

    pub fn seed(&self, frames: &[SeedFrame]) -> SeedResult<SeedOutput> {
        info!("finding keypoints and descriptors...");
        let features = self.detect(frames)?;
        check_descriptor_layouts(&features)?;
        info!("matching descriptors...");
        let pairs = self.match_and_triangulate(frames, &features)?;
        let points = Self::collect_points(frames, &features, &pairs);
        info!("triangulated {} points", points.len());
        Ok(SeedOutput {
            features,
            pairs,
            points,
        })
    }
}

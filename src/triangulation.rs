use nalgebra as na;

use crate::detected_points::Keypoint;
use crate::matching::Match;
use crate::types::{CameraPose, Intrinsics};

/// Midpoint of the closest approach of two rays `o + t * d`.
///
/// The ray parameters come from the least-squares solution of
/// `[d1, -d2] * [t1, t2]^T = o2 - o1`. Parallel rays give the minimum-norm
/// solution instead of failing.
pub fn triangulate_point(
    o1: &na::Vector3<f64>,
    d1: &na::Vector3<f64>,
    o2: &na::Vector3<f64>,
    d2: &na::Vector3<f64>,
) -> na::Vector3<f64> {
    let a = na::Matrix3x2::from_columns(&[*d1, -d2]);
    let b = o2 - o1;
    let svd = a.svd(true, true);
    let eps = svd.singular_values.max() * 3.0 * f64::EPSILON;
    let t = match svd.solve(&b, eps) {
        Ok(t) => t,
        Err(_) => na::Vector2::zeros(),
    };
    let p1 = o1 + d1 * t[0];
    let p2 = o2 + d2 * t[1];
    (p1 + p2) / 2.0
}

pub fn reproject_point(
    p: &na::Vector3<f64>,
    pose: &CameraPose,
    intrinsics: &Intrinsics,
) -> Option<na::Vector2<f64>> {
    pose.project(intrinsics, p)
}

/// Pixel distance, infinite when the point could not be reprojected.
pub fn reprojection_error(reprojected: Option<&na::Vector2<f64>>, observed: &na::Vector2<f64>) -> f64 {
    match reprojected {
        Some(p) => (p - observed).norm(),
        None => f64::INFINITY,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedMatch {
    pub feature_match: Match,
    pub point: na::Vector3<f64>,
    pub error: f64,
}

/// A match that failed the reprojection test, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedMatch {
    pub feature_match: Match,
    pub point: na::Vector3<f64>,
    pub reprojected: [Option<na::Vector2<f64>>; 2],
    pub error: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairTriangulation {
    pub accepted: Vec<AcceptedMatch>,
    pub rejected: Vec<RejectedMatch>,
}

/// Triangulates one match and checks it against `threshold` pixels.
///
/// The error is the larger of the two per-frame reprojection errors. A point
/// behind either camera has no reprojection and is rejected whatever the threshold.
pub fn evaluate_match(
    p_i: &na::Vector2<f64>,
    p_j: &na::Vector2<f64>,
    pose_i: &CameraPose,
    pose_j: &CameraPose,
    intrinsics: &Intrinsics,
    threshold: f64,
) -> Result<(na::Vector3<f64>, f64), (na::Vector3<f64>, [Option<na::Vector2<f64>>; 2], f64)> {
    let dir_i = pose_i.pixel_ray(intrinsics, p_i);
    let dir_j = pose_j.pixel_ray(intrinsics, p_j);
    let p = triangulate_point(&pose_i.position(), &dir_i, &pose_j.position(), &dir_j);

    let rp_i = reproject_point(&p, pose_i, intrinsics);
    let rp_j = reproject_point(&p, pose_j, intrinsics);
    let err = reprojection_error(rp_i.as_ref(), p_i).max(reprojection_error(rp_j.as_ref(), p_j));

    if rp_i.is_some() && rp_j.is_some() && err <= threshold {
        Ok((p, err))
    } else {
        Err((p, [rp_i, rp_j], err))
    }
}

/// Splits the matches of one frame pair into accepted points and rejections, in match order.
pub fn triangulate_matches(
    keypoints_i: &[Keypoint],
    keypoints_j: &[Keypoint],
    pose_i: &CameraPose,
    pose_j: &CameraPose,
    intrinsics: &Intrinsics,
    matches: &[Match],
    threshold: f64,
) -> PairTriangulation {
    let mut result = PairTriangulation::default();
    for m in matches {
        let p_i = keypoints_i[m.query_idx].na_p2d();
        let p_j = keypoints_j[m.train_idx].na_p2d();
        match evaluate_match(&p_i, &p_j, pose_i, pose_j, intrinsics, threshold) {
            Ok((point, error)) => result.accepted.push(AcceptedMatch {
                feature_match: *m,
                point,
                error,
            }),
            Err((point, reprojected, error)) => result.rejected.push(RejectedMatch {
                feature_match: *m,
                point,
                reprojected,
                error,
            }),
        }
    }
    result
}

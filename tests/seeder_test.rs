mod common;

use std::collections::HashMap;

use common::{StubDetector, camera_at, intrinsics, pattern_image, scene_points, synthetic_scene};
use glam::Vec2;
use image::GenericImageView;
use sparse_point_seeder::SeedError;
use sparse_point_seeder::detected_points::{Descriptor, FrameFeatures, Keypoint};
use sparse_point_seeder::seeder::{
    SparsePointSeeder, check_descriptor_layouts, frame_pairs, sample_color,
};

#[test]
fn test_empty_input() {
    let detector = StubDetector {
        by_width: HashMap::new(),
    };
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 10.0);
    let output = seeder.seed(&[]).unwrap();
    assert!(output.features.is_empty());
    assert!(output.pairs.is_empty());
    assert!(output.points.is_empty());
    assert_eq!(output.rejected_count(), 0);
}

#[test]
fn test_frame_pairs_order() {
    assert!(frame_pairs(0).is_empty());
    assert!(frame_pairs(1).is_empty());
    assert_eq!(frame_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
    assert_eq!(frame_pairs(10).len(), 45);
}

#[test]
fn test_seed_recovers_scene() {
    let poses = [
        camera_at(-0.6, 0.0, 5.0),
        camera_at(0.0, 0.3, 5.5),
        camera_at(0.7, -0.1, 4.8),
    ];
    let (frames, detector) = synthetic_scene(&poses);
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 10.0);
    let output = seeder.seed(&frames).unwrap();

    let points = scene_points();
    assert_eq!(output.pairs.len(), 3);
    assert_eq!(output.points.len(), 3 * points.len());
    assert_eq!(output.rejected_count(), 0);
    for p in &output.points {
        // keypoint k describes scene point k in every frame
        let expected = points[p.provenance.query_idx];
        assert_eq!(p.provenance.query_idx, p.provenance.train_idx);
        assert!((p.position - expected).norm() < 1e-3, "{:?} vs {:?}", p.position, expected);
    }

    // pair-then-match order
    let pair_order: Vec<_> = output
        .points
        .iter()
        .map(|p| (p.provenance.frame_i, p.provenance.frame_j))
        .collect();
    let mut sorted = pair_order.clone();
    sorted.sort();
    assert_eq!(pair_order, sorted);
}

#[test]
fn test_seed_is_deterministic() {
    let poses = [
        camera_at(-0.6, 0.0, 5.0),
        camera_at(0.0, 0.3, 5.5),
        camera_at(0.7, -0.1, 4.8),
        camera_at(0.2, 0.2, 6.0),
    ];
    let (frames, detector) = synthetic_scene(&poses);
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 10.0);
    let a = seeder.seed(&frames).unwrap();
    let b = seeder.seed(&frames).unwrap();
    assert_eq!(a.points, b.points);
    assert_eq!(a.pairs, b.pairs);
}

#[test]
fn test_color_sampling_matches_pixel() {
    let poses = [camera_at(-0.6, 0.0, 5.0), camera_at(0.7, -0.1, 4.8)];
    let (frames, detector) = synthetic_scene(&poses);
    let features_0 = detector.by_width[&frames[0].image.width()].clone();
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 10.0);
    let output = seeder.seed(&frames).unwrap();
    assert!(!output.points.is_empty());
    for p in &output.points {
        let kp = features_0.keypoints[p.provenance.query_idx].p2d;
        let px = frames[0]
            .image
            .get_pixel(kp.x.round() as u32, kp.y.round() as u32);
        assert_eq!(p.color, [px[0], px[1], px[2]]);
    }
}

#[test]
fn test_sample_color_rounds_and_clamps() {
    let img = pattern_image(20, 10);
    assert_eq!(sample_color(&img, Vec2::new(3.4, 5.6)), [3, 6, 9]);
    assert_eq!(sample_color(&img, Vec2::new(3.5, 5.0)), [4, 5, 9]);
    assert_eq!(sample_color(&img, Vec2::new(-2.0, 50.0)), [0, 9, 9]);
}

#[test]
fn test_strict_threshold_rejects_everything_but_keeps_diagnostics() {
    let poses = [camera_at(-0.6, 0.0, 5.0), camera_at(0.7, -0.1, 4.8)];
    let (frames, mut detector) = synthetic_scene(&poses);
    // shift every keypoint of the second frame vertically
    let width = frames[1].image.width();
    for k in &mut detector.by_width.get_mut(&width).unwrap().keypoints {
        k.p2d.y += 30.0;
    }
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 1.0);
    let output = seeder.seed(&frames).unwrap();
    assert!(output.points.is_empty());
    assert_eq!(output.rejected_count(), scene_points().len());
    for r in &output.pairs[0].triangulation.rejected {
        assert!(r.error > 1.0);
    }
}

#[test]
fn test_frame_without_features_contributes_nothing() {
    let poses = [camera_at(-0.6, 0.0, 5.0), camera_at(0.7, -0.1, 4.8)];
    let (frames, mut detector) = synthetic_scene(&poses);
    detector
        .by_width
        .insert(frames[1].image.width(), FrameFeatures::default());
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 10.0);
    let output = seeder.seed(&frames).unwrap();
    assert_eq!(output.pairs.len(), 1);
    assert!(output.points.is_empty());
}

#[test]
fn test_descriptor_mismatch_is_fatal() {
    let poses = [camera_at(-0.6, 0.0, 5.0), camera_at(0.7, -0.1, 4.8)];
    let (frames, mut detector) = synthetic_scene(&poses);
    detector.by_width.insert(
        frames[1].image.width(),
        FrameFeatures::new(vec![Keypoint::new(
            Vec2::new(10.0, 10.0),
            Descriptor::Binary(vec![0; 64]),
        )]),
    );
    let seeder = SparsePointSeeder::new(detector, intrinsics(), 10.0);
    let err = seeder.seed(&frames).unwrap_err();
    assert!(matches!(err, SeedError::DescriptorMismatch { frame: 1, .. }));
}

#[test]
fn test_check_descriptor_layouts() {
    let float = FrameFeatures::new(vec![Keypoint::new(
        Vec2::ZERO,
        Descriptor::Float(vec![0.0; 4]),
    )]);
    let empty = FrameFeatures::default();
    assert!(check_descriptor_layouts(&[]).unwrap().is_none());
    assert!(check_descriptor_layouts(&[empty.clone(), float.clone(), empty]).is_ok());
    let longer = FrameFeatures::new(vec![Keypoint::new(
        Vec2::ZERO,
        Descriptor::Float(vec![0.0; 5]),
    )]);
    assert!(check_descriptor_layouts(&[float, longer]).is_err());
}

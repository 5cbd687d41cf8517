use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec2;
use nalgebra as na;
use sparse_point_seeder::detected_points::{Descriptor, Keypoint};
use sparse_point_seeder::matching::cross_check_match;
use sparse_point_seeder::triangulation::triangulate_point;

fn bench_triangulate_point(c: &mut Criterion) {
    let o1 = na::Vector3::new(-0.5, 0.0, 5.0);
    let o2 = na::Vector3::new(0.5, 0.1, 5.0);
    let target = na::Vector3::new(0.2, -0.3, 0.4);
    let d1 = (target - o1).normalize();
    let d2 = (target - o2).normalize();

    c.bench_function("triangulate_point", |b| {
        b.iter(|| triangulate_point(black_box(&o1), black_box(&d1), black_box(&o2), black_box(&d2)))
    });
}

fn binary_keypoints(n: usize, salt: u8) -> Vec<Keypoint> {
    (0..n)
        .map(|i| {
            let bytes = (0..64)
                .map(|b| (i as u8).wrapping_mul(31).wrapping_add(b as u8 ^ salt))
                .collect();
            Keypoint::new(Vec2::new(i as f32, 0.0), Descriptor::Binary(bytes))
        })
        .collect()
}

fn bench_cross_check_match(c: &mut Criterion) {
    let query = binary_keypoints(500, 0);
    let train = binary_keypoints(500, 3);

    c.bench_function("cross_check_match_500", |b| {
        b.iter(|| cross_check_match(black_box(&query), black_box(&train)))
    });
}

criterion_group!(benches, bench_triangulate_point, bench_cross_check_match);
criterion_main!(benches);

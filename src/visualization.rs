use image::DynamicImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::RecordingStream;
use std::io::Cursor;

use crate::error::SeedResult;
use crate::detected_points::FrameFeatures;
use crate::seeder::{PairResult, SeedFrame, SeedOutput};
use crate::triangulation::RejectedMatch;

pub fn log_image_as_compressed(
    recording: &RecordingStream,
    topic: &str,
    img: &DynamicImage,
    format: image::ImageFormat,
) -> SeedResult<()> {
    let mut bytes: Vec<u8> = Vec::new();
    if let Err(e) = img.to_rgb8().write_to(&mut Cursor::new(&mut bytes), format) {
        log::warn!("skip logging {}: {}", topic, e);
        return Ok(());
    }
    recording.log(
        format!("{}/image", topic),
        &rerun::EncodedImage::from_file_contents(bytes),
    )?;
    Ok(())
}

pub fn id_to_color(id: usize) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

/// Colour of a rejected match, from yellow at the threshold to dark red at ten times it.
fn rejection_color(error: f64, threshold: f64) -> rerun::Color {
    let t = if error.is_finite() && threshold > 0.0 {
        1.0 - ((error / threshold - 1.0) / 9.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let c = colorous::YELLOW_ORANGE_RED.eval_continuous(0.35 + 0.65 * (1.0 - t));
    rerun::Color::from_rgb(c.r, c.g, c.b)
}

pub fn log_frames(
    recording: &RecordingStream,
    frames: &[SeedFrame],
    features: &[FrameFeatures],
) -> SeedResult<()> {
    for (idx, (f, feat)) in frames.iter().zip(features).enumerate() {
        let topic = format!("cam{}", idx);
        log_image_as_compressed(recording, &topic, &f.image, image::ImageFormat::Png)?;
        let pts: Vec<(f32, f32)> = feat.keypoints.iter().map(|k| (k.p2d.x, k.p2d.y)).collect();
        let (r, g, b, _) = id_to_color(idx);
        recording.log(
            format!("{}/keypoints", topic),
            &rerun::Points2D::new(rerun_shift(&pts))
                .with_colors([rerun::Color::from_rgb(r, g, b)])
                .with_radii([rerun::Radius::new_ui_points(2.0)]),
        )?;
        let p = f.frame.pose.position();
        recording.log(
            format!("world/cameras/{}", topic),
            &rerun::Points3D::new([[p.x as f32, p.y as f32, p.z as f32]])
                .with_colors([rerun::Color::from_rgb(r, g, b)])
                .with_radii([rerun::Radius::new_ui_points(6.0)]),
        )?;
    }
    Ok(())
}

/// Rejected matches as segments from the observed keypoint to its reprojection, in both images.
pub fn log_pair(
    recording: &RecordingStream,
    pair: &PairResult,
    features: &[FrameFeatures],
    threshold: f64,
) -> SeedResult<()> {
    let topic = format!("pairs/{}_{}", pair.i, pair.j);
    for (side, frame_idx) in [pair.i, pair.j].into_iter().enumerate() {
        let keypoints = &features[frame_idx].keypoints;
        let observed = |r: &RejectedMatch| {
            let m = r.feature_match;
            let k = if side == 0 { m.query_idx } else { m.train_idx };
            keypoints[k].p2d
        };
        let (segments, colors): (Vec<Vec<[f32; 2]>>, Vec<rerun::Color>) = pair
            .triangulation
            .rejected
            .iter()
            .filter_map(|r| {
                let rp = r.reprojected[side]?;
                let p = observed(r);
                Some((
                    vec![[p.x + 0.5, p.y + 0.5], [rp.x as f32 + 0.5, rp.y as f32 + 0.5]],
                    rejection_color(r.error, threshold),
                ))
            })
            .unzip();
        recording.log(
            format!("{}/cam{}/rejected", topic, frame_idx),
            &rerun::LineStrips2D::new(segments).with_colors(colors),
        )?;
        let accepted: Vec<(f32, f32)> = pair
            .triangulation
            .accepted
            .iter()
            .map(|a| {
                let m = a.feature_match;
                let k = if side == 0 { m.query_idx } else { m.train_idx };
                (keypoints[k].p2d.x, keypoints[k].p2d.y)
            })
            .collect();
        recording.log(
            format!("{}/cam{}/accepted", topic, frame_idx),
            &rerun::Points2D::new(rerun_shift(&accepted))
                .with_colors([rerun::Color::from_rgb(0, 255, 0)])
                .with_radii([rerun::Radius::new_ui_points(3.0)]),
        )?;
    }
    Ok(())
}

pub fn log_point_cloud(recording: &RecordingStream, output: &SeedOutput) -> SeedResult<()> {
    let (positions, colors): (Vec<[f32; 3]>, Vec<rerun::Color>) = output
        .points
        .iter()
        .map(|p| {
            (
                [p.position.x as f32, p.position.y as f32, p.position.z as f32],
                rerun::Color::from_rgb(p.color[0], p.color[1], p.color[2]),
            )
        })
        .unzip();
    recording.log(
        "world/sparse_pc",
        &rerun::Points3D::new(positions).with_colors(colors),
    )?;
    Ok(())
}

/// Logs the whole run: frames with keypoints, per-pair diagnostics and the final cloud.
pub fn log_seed_output(
    recording: &RecordingStream,
    frames: &[SeedFrame],
    output: &SeedOutput,
    threshold: f64,
) -> SeedResult<()> {
    log_frames(recording, frames, &output.features)?;
    for pair in &output.pairs {
        log_pair(recording, pair, &output.features, threshold)?;
    }
    log_point_cloud(recording, output)
}

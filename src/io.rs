use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{SeedError, SeedResult};

/// Serializes an object to a JSON file, pretty printed with four-space indentation.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> SeedResult<()> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    object
        .serialize(&mut ser)
        .map_err(|e| SeedError::json(output_path, e))?;
    std::fs::write(output_path, bytes).map_err(|e| SeedError::io(output_path, e))
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> SeedResult<T> {
    let contents = std::fs::read_to_string(file_path).map_err(|e| SeedError::io(file_path, e))?;
    serde_json::from_str(&contents).map_err(|e| SeedError::json(file_path, e))
}

#[derive(Debug, Serialize)]
struct SeedReport {
    timestamp: String,
    frames: usize,
    pairs: usize,
    accepted: usize,
    rejected: usize,
    mean_reprojection_error: f64,
    max_reprojection_error: f64,
    reprojection_error_pixels: f64,
    per_frame_keypoints: Vec<usize>,
}

fn local_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// Writes a JSON summary of a seeding run.
pub fn write_seed_report(
    output_path: &Path,
    result: &crate::seeder::SeedOutput,
    reprojection_error_pixels: f64,
) -> SeedResult<()> {
    let errors: Vec<f64> = result
        .pairs
        .iter()
        .flat_map(|p| p.triangulation.accepted.iter().map(|a| a.error))
        .collect();
    let mean = if errors.is_empty() {
        0.0
    } else {
        errors.iter().sum::<f64>() / errors.len() as f64
    };
    let report = SeedReport {
        timestamp: local_timestamp(),
        frames: result.features.len(),
        pairs: result.pairs.len(),
        accepted: result.points.len(),
        rejected: result.rejected_count(),
        mean_reprojection_error: mean,
        max_reprojection_error: errors.iter().cloned().fold(0.0, f64::max),
        reprojection_error_pixels,
        per_frame_keypoints: result.features.iter().map(|f| f.len()).collect(),
    };
    object_to_json(output_path, &report)
}

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a seeding or conversion run.
///
/// Per-match rejections are not errors; they are reported through
/// [`crate::triangulation::RejectedMatch`].
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("pose file is missing {0}")]
    MissingField(&'static str),
    #[error("feature detection failed on frame {frame}: {reason}")]
    Detection { frame: usize, reason: String },
    #[error(
        "descriptor mismatch: frame {frame} has {found} descriptors, expected {expected} (all frames must share one detector configuration)"
    )]
    DescriptorMismatch {
        frame: usize,
        expected: String,
        found: String,
    },
    #[error("evaluation frame {file_path} is not static (velocity norm {velocity})")]
    MovingEvalFrame { file_path: String, velocity: f64 },
    #[error("ply format error on line {line}: {reason}")]
    PlyFormat { line: usize, reason: String },
    #[error("{0}")]
    Visualization(#[from] rerun::RecordingStreamError),
}

impl SeedError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> SeedError {
        SeedError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> SeedError {
        SeedError::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn ply(line: usize, reason: impl Into<String>) -> SeedError {
        SeedError::PlyFormat {
            line,
            reason: reason.into(),
        }
    }
}

pub type SeedResult<T> = Result<T, SeedError>;

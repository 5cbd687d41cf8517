pub mod config;
pub mod data_loader;
pub mod detected_points;
pub mod error;
pub mod features;
pub mod io;
pub mod matching;
pub mod noise;
pub mod pipeline;
pub mod ply;
pub mod pose_file;
pub mod seeder;
pub mod synthetic;
pub mod triangulation;
pub mod types;
pub mod visualization;

pub use error::{SeedError, SeedResult};

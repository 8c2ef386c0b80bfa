//! PawHaven pet recommender.
//!
//! A user's adoption preferences and every candidate pet are encoded into the
//! same feature space (one-hot species, size, temperament and energy plus
//! age), optionally standardised with a pre-fitted scaler, and ranked by
//! Euclidean distance. There is no training step here; the scaler artifact is
//! produced offline.

pub mod features;
pub mod knn;

pub use features::{Candidate, FeatureSpace, Preference};
pub use knn::Recommender;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RecommenderError {
    #[error("failed to read recommender artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed recommender artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("artifact has {columns} columns but {mean} means and {scale} scales")]
    Shape {
        columns: usize,
        mean: usize,
        scale: usize,
    },
}

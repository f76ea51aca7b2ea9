//! Model artifacts and the scoring seam
//!
//! The pipeline only sees [`Scorer`]. The production implementation is the
//! LightGBM text-dump evaluator in [`lightgbm`].

pub mod lightgbm;

use std::path::PathBuf;
use thiserror::Error;

pub use lightgbm::LightGbmModel;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported model: {0}")]
    Unsupported(String),

    #[error("feature count mismatch: model expected {expected} columns, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("model produced a non-finite score: {0}")]
    NonFinite(f64),
}

/// A trained regression model that scores one row at a time
///
/// Implementations must be safe to call concurrently through `&self`.
pub trait Scorer: Send + Sync {
    /// Number of input columns the model was trained on
    fn num_features(&self) -> usize;

    /// Column names recorded in the artifact, if any
    fn feature_names(&self) -> &[String];

    /// Number of trees (or other sub-models) summed into the score
    fn num_trees(&self) -> usize;

    /// Training objective recorded in the artifact
    fn objective(&self) -> &str;

    /// Score a single row laid out in the model's column order
    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError>;
}

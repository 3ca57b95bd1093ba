//! Text classification building blocks: vectorization, TF-IDF weighting,
//! random forests, the three-stage pipeline, evaluation metrics, and model
//! persistence.

pub mod forest;
pub mod metrics;
pub mod persist;
pub mod pipeline;
pub mod tfidf;
pub mod vectorize;

use thiserror::Error;

/// Sparse feature row: `(feature index, value)` pairs sorted by index.
pub type SparseRow = Vec<(u32, f32)>;

/// Look up a feature value in a sparse row, treating absent entries as zero.
pub fn sparse_value(row: &[(u32, f32)], feature: u32) -> f32 {
    row.binary_search_by_key(&feature, |&(index, _)| index)
        .map(|pos| row[pos].1)
        .unwrap_or(0.0)
}

/// Errors raised while fitting or applying a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A stage was used before it was fitted.
    #[error("{0} is not fitted")]
    NotFitted(&'static str),
    /// The pipeline was already fitted; fitted pipelines are immutable.
    #[error("pipeline is already fitted")]
    AlreadyFitted,
    /// Training documents produced no terms.
    #[error("empty vocabulary; the training documents contain no tokens")]
    EmptyVocabulary,
    /// No training rows were supplied.
    #[error("empty training set")]
    EmptyTrainingSet,
    /// Inputs that must align row-for-row or column-for-column do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Label values are outside `{0, 1}`.
    #[error("invalid labels: {0}")]
    InvalidLabels(String),
    /// Hyper-parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// A sparse row references a feature outside the fitted dimensionality.
    #[error("feature index {index} out of range for {n_features} features")]
    FeatureOutOfRange { index: u32, n_features: usize },
}

//! Library exports for the training and classification tools, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// Training configuration loaded from TOML.
pub mod config;
/// Corpus loading and train/test splitting.
pub mod dataset;
/// Tracing subscriber setup.
pub mod logging;
/// Vectorization, random forests, metrics and model persistence.
pub mod ml;
/// Word tokenization and lemmatization.
pub mod text;
/// End-to-end training runs.
pub mod training;

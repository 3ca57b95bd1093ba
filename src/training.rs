//! End-to-end training run: load, split, build, fit, evaluate, save.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use ndarray::{ArrayView2, Axis};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, TrainConfig};
use crate::dataset::{LoadError, SplitError, load_corpus, train_test_split};
use crate::ml::ModelError;
use crate::ml::metrics::{ClassificationReport, MetricsError, classification_report};
use crate::ml::persist::{PersistError, TrainingMetadata, save_model_with_metadata};
use crate::ml::pipeline::{Pipeline, build_model};

/// Any failure that aborts a training run.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("failed to write progress output: {0}")]
    Output(#[from] std::io::Error),
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub model_path: PathBuf,
    pub categories: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub split_seed: u64,
    pub forest_seed: Option<u64>,
    pub corpus_fingerprint: String,
    pub report: ClassificationReport,
}

/// Predict on held-out messages and score every category column.
pub fn evaluate_model<S: AsRef<str>>(
    model: &Pipeline,
    messages: &[S],
    labels: ArrayView2<'_, u8>,
    category_names: &[String],
) -> Result<ClassificationReport, TrainError> {
    let predicted = model.predict(messages)?;
    Ok(classification_report(labels, predicted.view(), category_names)?)
}

/// Train on the corpus at `database`, print progress and the evaluation
/// report to stdout, and save the fitted pipeline to `model_path`.
pub fn run_training(
    database: &Path,
    model_path: &Path,
    config: &TrainConfig,
) -> Result<TrainingSummary, TrainError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_training_with_output(database, model_path, config, &mut out)
}

/// [`run_training`] with progress written to `out`.
pub fn run_training_with_output<W: Write>(
    database: &Path,
    model_path: &Path,
    config: &TrainConfig,
    out: &mut W,
) -> Result<TrainingSummary, TrainError> {
    config.validate()?;
    let started = Instant::now();

    writeln!(out, "Loading data...\n    DATABASE: {}", database.display())?;
    info!(stage = "load", database = %database.display(), "Training stage");
    let corpus = load_corpus(database, &config.data.table)?;
    let corpus_fingerprint = corpus.fingerprint();

    info!(stage = "split", "Training stage");
    let split = train_test_split(corpus.len(), config.split.test_size, config.split.seed)?;
    let train_messages: Vec<&str> = split
        .train
        .iter()
        .map(|&idx| corpus.messages[idx].as_str())
        .collect();
    let test_messages: Vec<&str> = split
        .test
        .iter()
        .map(|&idx| corpus.messages[idx].as_str())
        .collect();
    let train_labels = corpus.labels.select(Axis(0), &split.train);
    let test_labels = corpus.labels.select(Axis(0), &split.test);

    writeln!(out, "Building model...")?;
    info!(stage = "build", "Training stage");
    let mut model = build_model(&config.model);

    writeln!(out, "Training model...")?;
    info!(stage = "fit", rows = train_messages.len(), "Training stage");
    model.fit(&train_messages, train_labels.view(), &corpus.categories)?;

    writeln!(out, "Evaluating model...")?;
    info!(stage = "evaluate", rows = test_messages.len(), "Training stage");
    let report = evaluate_model(&model, &test_messages, test_labels.view(), &corpus.categories)?;
    writeln!(out, "{report}")?;
    info!(
        micro_f1 = report.micro.f1,
        subset_accuracy = report.subset_accuracy,
        "Evaluation finished"
    );

    writeln!(out, "Saving model...\n    MODEL: {}", model_path.display())?;
    info!(stage = "save", model = %model_path.display(), "Training stage");
    let metadata = TrainingMetadata {
        corpus_fingerprint: corpus_fingerprint.clone(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        split_seed: split.seed,
        created_at: unix_now(),
    };
    save_model_with_metadata(&model, Some(&metadata), model_path)?;

    writeln!(out, "Trained model saved!")?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Training run complete"
    );
    Ok(TrainingSummary {
        model_path: model_path.to_path_buf(),
        categories: corpus.categories.clone(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        split_seed: split.seed,
        forest_seed: model.clf.seed(),
        corpus_fingerprint,
        report,
    })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

//! Saving and loading fitted pipelines as versioned JSON.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use super::pipeline::Pipeline;

/// Current model file format.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Errors raised while saving or loading a model file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("model file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("refusing to save an unfitted pipeline")]
    NotFitted,
    #[error("unsupported model format version {found} (expected {})", MODEL_FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error("invalid model file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Provenance recorded alongside a trained pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// BLAKE3 hash of the training corpus contents.
    pub corpus_fingerprint: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub split_seed: u64,
    /// Unix timestamp, seconds.
    pub created_at: i64,
}

/// A model file as read back from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedModel {
    pub format_version: u32,
    pub crate_version: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub training: Option<TrainingMetadata>,
    pub pipeline: Pipeline,
}

#[derive(Serialize)]
struct SavedModelRef<'a> {
    format_version: u32,
    crate_version: &'a str,
    categories: &'a [String],
    training: Option<&'a TrainingMetadata>,
    pipeline: &'a Pipeline,
}

/// Serialize a fitted pipeline to `path`, replacing any existing file.
pub fn save_model(pipeline: &Pipeline, path: &Path) -> Result<(), PersistError> {
    save_model_with_metadata(pipeline, None, path)
}

/// Serialize a fitted pipeline with training provenance.
///
/// The file is written next to `path` and renamed into place, so readers
/// never observe a partial model.
pub fn save_model_with_metadata(
    pipeline: &Pipeline,
    training: Option<&TrainingMetadata>,
    path: &Path,
) -> Result<(), PersistError> {
    if !pipeline.is_fitted() {
        return Err(PersistError::NotFitted);
    }
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(io_err)?;

    let envelope = SavedModelRef {
        format_version: MODEL_FORMAT_VERSION,
        crate_version: env!("CARGO_PKG_VERSION"),
        categories: pipeline.categories(),
        training,
        pipeline,
    };
    let mut temp = NamedTempFile::new_in(&parent).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer(&mut writer, &envelope).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
    }
    temp.persist(path).map_err(|err| io_err(err.error))?;
    info!(
        path = %path.display(),
        categories = pipeline.categories().len(),
        "Saved model"
    );
    Ok(())
}

/// Load a pipeline saved by [`save_model`].
pub fn load_model(path: &Path) -> Result<Pipeline, PersistError> {
    Ok(load_saved_model(path)?.pipeline)
}

/// Load a model file with its envelope and provenance.
pub fn load_saved_model(path: &Path) -> Result<SavedModel, PersistError> {
    let file = File::open(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let saved: SavedModel =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if saved.format_version != MODEL_FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: saved.format_version,
        });
    }
    let invalid = |message: String| PersistError::Invalid {
        path: path.to_path_buf(),
        message,
    };
    saved.pipeline.validate().map_err(invalid)?;
    if saved.categories != saved.pipeline.categories() {
        return Err(invalid(
            "envelope categories differ from pipeline categories".to_string(),
        ));
    }
    Ok(saved)
}

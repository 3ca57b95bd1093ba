//! TOML training configuration.
//!
//! Every field has a default, so an absent or partial file still yields a
//! complete configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::app_dirs;
use crate::dataset::loader::DEFAULT_TABLE;
use crate::ml::ModelError;
use crate::ml::pipeline::ModelConfig;

/// Config file looked up in the app root when no path is given.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level tables a config file may contain.
pub const CONFIG_SECTIONS: [&str; 5] = ["data", "split", "vectorizer", "tfidf", "forest"];

/// Errors that may occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A top-level table or key that no setting reads.
    #[error("Unknown config section `{section}` in {path}")]
    UnknownSection { path: PathBuf, section: String },
    /// A value is out of range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl From<ModelError> for ConfigError {
    fn from(error: ModelError) -> Self {
        Self::Invalid(error.to_string())
    }
}

/// Where the corpus is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSettings {
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Train/test split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitSettings {
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    pub seed: Option<u64>,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: None,
        }
    }
}

/// Complete training configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data: DataSettings,
    pub split: SplitSettings,
    #[serde(flatten)]
    pub model: ModelConfig,
}

impl TrainConfig {
    /// Parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        };
        let table: toml::Table = toml::from_str(&text).map_err(parse_error)?;
        if let Some(section) = table
            .keys()
            .find(|key| !CONFIG_SECTIONS.contains(&key.as_str()))
        {
            return Err(ConfigError::UnknownSection {
                path: path.to_path_buf(),
                section: section.clone(),
            });
        }
        let config: Self = toml::from_str(&text).map_err(parse_error)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded training config");
        Ok(config)
    }

    /// Load `explicit` when given, else `config.toml` from the app root when
    /// present, else defaults.
    ///
    /// The app root is only looked up, never created. An unresolvable root
    /// falls back to defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match app_dirs::app_root_path() {
            Ok(dir) => Self::load_from_dir_or_default(&dir),
            Err(err) => {
                warn!("App config lookup skipped: {err}");
                Ok(Self::default())
            }
        }
    }

    fn load_from_dir_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Pin both the split and the forest to `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = Some(seed);
        self.model.forest.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.table.trim().is_empty() {
            return Err(ConfigError::Invalid("data.table must not be empty".to_string()));
        }
        let test_size = self.split.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "split.test_size must be in (0, 1), got {test_size}"
            )));
        }
        self.model.vectorizer.validate()?;
        self.model.forest.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_dirs::base_override::ConfigBaseGuard;
    use crate::ml::forest::MaxFeatures;
    use tempfile::tempdir;

    #[test]
    fn empty_file_yields_defaults() {
        let config: TrainConfig = toml::from_str("").unwrap();
        assert_eq!(config, TrainConfig::default());
        assert_eq!(config.data.table, "messages");
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.model.forest.n_estimators, 200);
        assert_eq!(config.model.vectorizer.ngram_max, 2);
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.toml");
        std::fs::write(
            &path,
            r#"
[split]
seed = 42

[forest]
n_estimators = 25
max_depth = 12
max_features = { count = 64 }
"#,
        )
        .unwrap();
        let config = TrainConfig::load(&path).unwrap();
        assert_eq!(config.split.seed, Some(42));
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.model.forest.n_estimators, 25);
        assert_eq!(config.model.forest.max_depth, Some(12));
        assert_eq!(config.model.forest.max_features, MaxFeatures::Count(64));
        assert!(config.model.forest.bootstrap);
        assert!(config.model.tfidf.use_idf);
    }

    #[test]
    fn named_max_features_presets_parse() {
        let config: TrainConfig = toml::from_str("[forest]\nmax_features = \"log2\"\n").unwrap();
        assert_eq!(config.model.forest.max_features, MaxFeatures::Log2);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        for body in [
            "[split]\ntest_size = 1.5\n",
            "[vectorizer]\nngram_min = 3\nngram_max = 2\n",
            "[forest]\nn_estimators = 0\n",
            "[forest]\nmin_samples_split = 1\n",
        ] {
            std::fs::write(&path, body).unwrap();
            assert!(
                matches!(TrainConfig::load(&path), Err(ConfigError::Invalid(_))),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn malformed_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[split\n").unwrap();
        match TrainConfig::load(&path) {
            Err(ConfigError::ParseToml { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn app_root_config_is_optional() {
        let dir = tempdir().unwrap();
        assert_eq!(
            TrainConfig::load_from_dir_or_default(dir.path()).unwrap(),
            TrainConfig::default()
        );
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[data]\ntable = \"tweets\"\n").unwrap();
        let config = TrainConfig::load_from_dir_or_default(dir.path()).unwrap();
        assert_eq!(config.data.table, "tweets");
    }

    #[test]
    fn misspelled_sections_and_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        std::fs::write(&path, "[forrest]\nn_estimators = 10\n").unwrap();
        match TrainConfig::load(&path) {
            Err(ConfigError::UnknownSection { section, .. }) => assert_eq!(section, "forrest"),
            other => panic!("expected unknown section, got {other:?}"),
        }

        for body in [
            "[forest]\nn_estimator = 10\n",
            "[split]\ntest_fraction = 0.3\n",
            "[vectorizer]\nngram = 3\n",
            "[tfidf]\nidf = false\n",
            "[data]\ntabel = \"x\"\n",
        ] {
            std::fs::write(&path, body).unwrap();
            assert!(
                matches!(TrainConfig::load(&path), Err(ConfigError::ParseToml { .. })),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn unresolvable_app_root_falls_back_to_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let _guard = ConfigBaseGuard::set(file.path().join("config"));
        assert_eq!(
            TrainConfig::load_or_default(None).unwrap(),
            TrainConfig::default()
        );
        assert!(!file.path().join("config").exists());
    }

    #[test]
    fn seed_override_pins_split_and_forest() {
        let config = TrainConfig::default().with_seed(5);
        assert_eq!(config.split.seed, Some(5));
        assert_eq!(config.model.forest.seed, Some(5));
    }
}

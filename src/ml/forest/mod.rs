//! Random-forest classification over sparse rows.
//!
//! - Bagged CART trees with Gini impurity and per-node feature sampling.
//! - Binary labels only; one forest per label column via
//!   [`MultiOutputClassifier`].
//! - Seeded, reproducible training and JSON-serializable fitted state.

mod ensemble;
mod multi_output;
mod train;
mod tree;

pub use ensemble::RandomForest;
pub use multi_output::MultiOutputClassifier;
pub use tree::{DecisionTree, TreeNode};

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Number of features examined when searching for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`.
    Sqrt,
    /// `floor(log2(n_features))`.
    Log2,
    /// Every feature.
    All,
    /// A fixed count, capped at `n_features`.
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count (at least one) for `n_features` features.
    pub fn resolve(self, n_features: usize) -> usize {
        let count = match self {
            Self::Sqrt => (n_features as f64).sqrt().floor() as usize,
            Self::Log2 => {
                if n_features == 0 {
                    0
                } else {
                    (n_features as f64).log2().floor() as usize
                }
            }
            Self::All => n_features,
            Self::Count(count) => count.min(n_features),
        };
        count.max(1)
    }
}

/// Random forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForestParams {
    /// Trees per forest.
    pub n_estimators: usize,
    /// Maximum tree depth; unbounded when unset.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples in each child of a split.
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample per tree instead of using every row.
    pub bootstrap: bool,
    /// Master seed; drawn from OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: None,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParams(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParams(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ModelError::InvalidParams(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(ModelError::InvalidParams(
                "max_features count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_features_resolves_like_common_presets() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10_000), 100);
        assert_eq!(MaxFeatures::Sqrt.resolve(15), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(0), 1);
        assert_eq!(MaxFeatures::Log2.resolve(1024), 10);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
        assert_eq!(MaxFeatures::Count(50).resolve(7), 7);
    }

    #[test]
    fn default_params_validate() {
        let params = ForestParams::default();
        assert_eq!(params.n_estimators, 200);
        params.validate().unwrap();
        let bad = ForestParams {
            min_samples_split: 1,
            ..ForestParams::default()
        };
        assert!(bad.validate().is_err());
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::ForestParams;
use super::train::{GrowOptions, grow_tree};
use super::tree::DecisionTree;
use crate::ml::{ModelError, SparseRow};

/// Bagged ensemble of decision trees for one binary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Feature dimensionality the trees were grown on.
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on sparse rows and 0/1 labels.
    pub fn fit(
        rows: &[SparseRow],
        n_features: usize,
        labels: &[u8],
        params: &ForestParams,
        seed: u64,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&label| label > 1) {
            return Err(ModelError::InvalidLabels(format!(
                "expected 0/1 labels, found {bad}"
            )));
        }
        let options = GrowOptions {
            max_features: params.max_features.resolve(n_features),
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        };

        let n = rows.len();
        let mut master = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.random());
            let weights = if params.bootstrap {
                let mut counts = vec![0.0f64; n];
                for _ in 0..n {
                    counts[rng.random_range(0..n)] += 1.0;
                }
                counts
            } else {
                vec![1.0f64; n]
            };
            trees.push(grow_tree(rows, labels, &weights, &options, &mut rng));
        }
        Ok(Self { n_features, trees })
    }

    /// Mean positive-class probability across trees.
    pub fn predict_proba(&self, row: &[(u32, f32)]) -> f32 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.trees.iter().map(|tree| tree.predict_positive(row)).sum();
        sum / self.trees.len() as f32
    }

    /// Predicted label: 1 when the mean probability exceeds one half.
    pub fn predict(&self, row: &[(u32, f32)]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|err| format!("tree {idx}: {err}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_rows() -> (Vec<SparseRow>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            if i % 2 == 0 {
                rows.push(vec![(0, 0.5 + i as f32 / 100.0), (2, 0.1)]);
                labels.push(1);
            } else {
                rows.push(vec![(1, 0.5 + i as f32 / 100.0), (2, 0.1)]);
                labels.push(0);
            }
        }
        (rows, labels)
    }

    fn params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            seed: Some(11),
            ..ForestParams::default()
        }
    }

    #[test]
    fn learns_a_separable_label() {
        let (rows, labels) = toy_rows();
        let forest = RandomForest::fit(&rows, 3, &labels, &params(25), 5).unwrap();
        assert_eq!(forest.trees.len(), 25);
        forest.validate().unwrap();
        assert_eq!(forest.predict(&[(0, 0.7)]), 1);
        assert_eq!(forest.predict(&[(1, 0.7)]), 0);
    }

    #[test]
    fn same_seed_grows_the_same_forest() {
        let (rows, labels) = toy_rows();
        let a = RandomForest::fit(&rows, 3, &labels, &params(5), 99).unwrap();
        let b = RandomForest::fit(&rows, 3, &labels, &params(5), 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_label_predicts_that_label() {
        let (rows, _) = toy_rows();
        let zeros = vec![0u8; rows.len()];
        let forest = RandomForest::fit(&rows, 3, &zeros, &params(3), 1).unwrap();
        assert!(rows.iter().all(|row| forest.predict(row) == 0));
        assert_eq!(forest.predict_proba(&rows[0]), 0.0);
    }

    #[test]
    fn rejects_misaligned_or_non_binary_labels() {
        let (rows, labels) = toy_rows();
        assert!(matches!(
            RandomForest::fit(&rows, 3, &labels[..3], &params(1), 0),
            Err(ModelError::ShapeMismatch(_))
        ));
        let mut bad = labels.clone();
        bad[0] = 2;
        assert!(matches!(
            RandomForest::fit(&rows, 3, &bad, &params(1), 0),
            Err(ModelError::InvalidLabels(_))
        ));
    }
}

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ForestParams;
use super::ensemble::RandomForest;
use crate::ml::{ModelError, SparseRow};

/// One independent random forest per label column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiOutputClassifier {
    pub params: ForestParams,
    /// Seed the estimators were fitted with.
    seed: Option<u64>,
    estimators: Option<Vec<RandomForest>>,
}

impl MultiOutputClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            seed: None,
            estimators: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.estimators.is_some()
    }

    /// Fitted per-column forests, in label column order.
    pub fn estimators(&self) -> Option<&[RandomForest]> {
        self.estimators.as_deref()
    }

    /// Master seed used during fitting.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn n_outputs(&self) -> usize {
        self.estimators.as_ref().map_or(0, Vec::len)
    }

    /// Fit one forest per column of `labels`.
    pub fn fit(
        &mut self,
        rows: &[SparseRow],
        n_features: usize,
        labels: ArrayView2<'_, u8>,
    ) -> Result<(), ModelError> {
        self.params.validate()?;
        if rows.len() != labels.nrows() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} feature rows but {} label rows",
                rows.len(),
                labels.nrows()
            )));
        }
        if labels.ncols() == 0 {
            return Err(ModelError::ShapeMismatch(
                "label matrix has no columns".to_string(),
            ));
        }
        let seed = self.params.seed.unwrap_or_else(|| rand::rng().random());
        info!(
            seed,
            outputs = labels.ncols(),
            trees = self.params.n_estimators,
            "Fitting multi-output random forest"
        );

        let mut master = StdRng::seed_from_u64(seed);
        let mut estimators = Vec::with_capacity(labels.ncols());
        for column_idx in 0..labels.ncols() {
            let column = labels.column(column_idx).to_vec();
            let positives = column.iter().filter(|&&label| label == 1).count();
            if positives == 0 || positives == column.len() {
                warn!(
                    column = column_idx,
                    positives,
                    rows = column.len(),
                    "Label column has a single class in training data"
                );
            }
            let forest = RandomForest::fit(rows, n_features, &column, &self.params, master.random())?;
            debug!(
                column = column_idx,
                positives,
                leaves = forest.trees.iter().map(|tree| tree.leaf_count()).sum::<usize>(),
                "Fitted forest"
            );
            estimators.push(forest);
        }
        self.seed = Some(seed);
        self.estimators = Some(estimators);
        Ok(())
    }

    /// Predicted 0/1 labels, one row per input row and one column per output.
    pub fn predict(&self, rows: &[SparseRow]) -> Result<Array2<u8>, ModelError> {
        let estimators = self.fitted()?;
        Ok(Array2::from_shape_fn(
            (rows.len(), estimators.len()),
            |(row, column)| estimators[column].predict(&rows[row]),
        ))
    }

    /// Positive-class probabilities, same shape as [`Self::predict`].
    pub fn predict_proba(&self, rows: &[SparseRow]) -> Result<Array2<f32>, ModelError> {
        let estimators = self.fitted()?;
        Ok(Array2::from_shape_fn(
            (rows.len(), estimators.len()),
            |(row, column)| estimators[column].predict_proba(&rows[row]),
        ))
    }

    fn fitted(&self) -> Result<&[RandomForest], ModelError> {
        self.estimators
            .as_deref()
            .ok_or(ModelError::NotFitted("multi-output classifier"))
    }
}

//! The three-stage message classification pipeline.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::forest::{ForestParams, MultiOutputClassifier};
use super::tfidf::{TfidfParams, TfidfTransformer};
use super::vectorize::{CountVectorizer, VectorizerParams};
use super::{ModelError, SparseRow};

/// Stage names, in execution order.
pub const STEP_NAMES: [&str; 3] = ["vect", "tfidf", "clf"];

/// Hyper-parameters for every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub vectorizer: VectorizerParams,
    pub tfidf: TfidfParams,
    pub forest: ForestParams,
}

/// Count vectorization, then TF-IDF weighting, then one random forest per
/// category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub vect: CountVectorizer,
    pub tfidf: TfidfTransformer,
    pub clf: MultiOutputClassifier,
    categories: Vec<String>,
}

/// Build an unfitted pipeline from stage parameters.
pub fn build_model(config: &ModelConfig) -> Pipeline {
    Pipeline {
        vect: CountVectorizer::new(config.vectorizer.clone()),
        tfidf: TfidfTransformer::new(config.tfidf.clone()),
        clf: MultiOutputClassifier::new(config.forest.clone()),
        categories: Vec::new(),
    }
}

impl Pipeline {
    pub fn step_names(&self) -> [&'static str; 3] {
        STEP_NAMES
    }

    pub fn is_fitted(&self) -> bool {
        self.vect.is_fitted() && self.tfidf.is_fitted() && self.clf.is_fitted()
    }

    /// Category names in label column order; empty before fitting.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Fit every stage on training messages and their label matrix.
    ///
    /// A pipeline is fitted once; later calls fail with
    /// [`ModelError::AlreadyFitted`].
    pub fn fit<S: AsRef<str>>(
        &mut self,
        messages: &[S],
        labels: ArrayView2<'_, u8>,
        categories: &[String],
    ) -> Result<(), ModelError> {
        if self.is_fitted() {
            return Err(ModelError::AlreadyFitted);
        }
        if messages.len() != labels.nrows() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} messages but {} label rows",
                messages.len(),
                labels.nrows()
            )));
        }
        if categories.len() != labels.ncols() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} category names but {} label columns",
                categories.len(),
                labels.ncols()
            )));
        }
        self.clf.params.validate()?;

        let counts = self.vect.fit_transform(messages)?;
        let n_features = self.vect.n_features();
        info!(n_features, documents = messages.len(), "Fitted count vectorizer");
        self.tfidf.fit(&counts, n_features)?;
        let features = self.tfidf.transform(counts)?;
        self.clf.fit(&features, n_features, labels)?;
        self.categories = categories.to_vec();
        Ok(())
    }

    /// TF-IDF feature rows for new messages.
    pub fn transform<S: AsRef<str>>(&self, messages: &[S]) -> Result<Vec<SparseRow>, ModelError> {
        let counts = self.vect.transform(messages)?;
        self.tfidf.transform(counts)
    }

    /// Predicted 0/1 labels, shape `messages.len() x categories.len()`.
    pub fn predict<S: AsRef<str>>(&self, messages: &[S]) -> Result<Array2<u8>, ModelError> {
        let features = self.transform(messages)?;
        self.clf.predict(&features)
    }

    /// Positive-class probabilities, same shape as [`Self::predict`].
    pub fn predict_proba<S: AsRef<str>>(&self, messages: &[S]) -> Result<Array2<f32>, ModelError> {
        let features = self.transform(messages)?;
        self.clf.predict_proba(&features)
    }

    /// Check that fitted stages agree with one another.
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_fitted() {
            return Err("pipeline is not fitted".to_string());
        }
        let n_features = self.vect.n_features();
        if self.tfidf.n_features() != n_features {
            return Err(format!(
                "tf-idf expects {} features but vocabulary has {n_features}",
                self.tfidf.n_features()
            ));
        }
        if let Some(idf) = self.tfidf.idf() {
            if idf.len() != n_features {
                return Err("idf length mismatch".to_string());
            }
        }
        if self.clf.n_outputs() != self.categories.len() {
            return Err(format!(
                "{} estimators for {} categories",
                self.clf.n_outputs(),
                self.categories.len()
            ));
        }
        for (category, forest) in self
            .categories
            .iter()
            .zip(self.clf.estimators().unwrap_or_default())
        {
            if forest.n_features != n_features {
                return Err(format!(
                    "forest for {category} expects {} features but vocabulary has {n_features}",
                    forest.n_features
                ));
            }
            forest
                .validate()
                .map_err(|err| format!("forest for {category}: {err}"))?;
        }
        Ok(())
    }
}

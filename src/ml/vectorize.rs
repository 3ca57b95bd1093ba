//! Count vectorization over word n-grams.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{ModelError, SparseRow};
use crate::text::tokenize;

/// Count vectorizer hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorizerParams {
    /// Smallest n-gram length.
    pub ngram_min: usize,
    /// Largest n-gram length.
    pub ngram_max: usize,
    /// Lowercase documents before tokenizing.
    pub lowercase: bool,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_min: 1,
            ngram_max: 2,
            lowercase: true,
        }
    }
}

impl VectorizerParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            return Err(ModelError::InvalidParams(format!(
                "invalid n-gram range ({}, {})",
                self.ngram_min, self.ngram_max
            )));
        }
        Ok(())
    }
}

/// Maps documents to term-count rows over a vocabulary learned at fit time.
///
/// Terms are the tokenizer's tokens and the space-joined n-grams built from
/// them. Vocabulary indices follow lexicographic term order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    pub params: VectorizerParams,
    vocabulary: Option<BTreeMap<String, u32>>,
}

impl CountVectorizer {
    pub fn new(params: VectorizerParams) -> Self {
        Self {
            params,
            vocabulary: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Fitted term-to-index map.
    pub fn vocabulary(&self) -> Option<&BTreeMap<String, u32>> {
        self.vocabulary.as_ref()
    }

    /// Number of features, or zero before fitting.
    pub fn n_features(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, BTreeMap::len)
    }

    /// Turn one document into its terms, unigrams first.
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let tokens = if self.params.lowercase {
            tokenize(&doc.to_lowercase())
        } else {
            tokenize(doc)
        };
        word_ngrams(tokens, self.params.ngram_min, self.params.ngram_max)
    }

    /// Learn the vocabulary from `docs` and return their count rows.
    pub fn fit_transform<S: AsRef<str>>(&mut self, docs: &[S]) -> Result<Vec<SparseRow>, ModelError> {
        self.params.validate()?;
        if docs.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let counted: Vec<HashMap<String, u32>> = docs
            .iter()
            .map(|doc| count_terms(self.analyze(doc.as_ref())))
            .collect();
        let terms: BTreeSet<&String> = counted.iter().flat_map(|counts| counts.keys()).collect();
        if terms.is_empty() {
            return Err(ModelError::EmptyVocabulary);
        }
        let vocabulary: BTreeMap<String, u32> = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term.clone(), index as u32))
            .collect();
        let rows = counted
            .iter()
            .map(|counts| to_row(counts, &vocabulary))
            .collect();
        self.vocabulary = Some(vocabulary);
        Ok(rows)
    }

    /// Count rows for `docs`; terms outside the vocabulary are dropped.
    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<Vec<SparseRow>, ModelError> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or(ModelError::NotFitted("count vectorizer"))?;
        Ok(docs
            .iter()
            .map(|doc| to_row(&count_terms(self.analyze(doc.as_ref())), vocabulary))
            .collect())
    }
}

fn word_ngrams(tokens: Vec<String>, min_n: usize, max_n: usize) -> Vec<String> {
    if min_n == 1 && max_n == 1 {
        return tokens;
    }
    let mut terms = Vec::new();
    let mut start = min_n;
    if min_n == 1 {
        terms.extend(tokens.iter().cloned());
        start = 2;
    }
    for n in start..=max_n.min(tokens.len()) {
        terms.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    terms
}

fn count_terms(terms: Vec<String>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn to_row(counts: &HashMap<String, u32>, vocabulary: &BTreeMap<String, u32>) -> SparseRow {
    let mut row: SparseRow = counts
        .iter()
        .filter_map(|(term, &count)| vocabulary.get(term).map(|&index| (index, count as f32)))
        .collect();
    row.sort_unstable_by_key(|&(index, _)| index);
    row
}

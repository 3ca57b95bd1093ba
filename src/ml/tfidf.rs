//! TF-IDF weighting of term-count rows.

use serde::{Deserialize, Serialize};

use super::{ModelError, SparseRow};

/// TF-IDF transformer hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TfidfParams {
    /// Enable inverse-document-frequency reweighting.
    pub use_idf: bool,
    /// Add one to document frequencies, as if an extra document held every term.
    pub smooth_idf: bool,
    /// Replace `tf` with `1 + ln(tf)`.
    pub sublinear_tf: bool,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            use_idf: true,
            smooth_idf: true,
            sublinear_tf: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TfidfState {
    n_features: usize,
    /// Per-feature IDF weights; absent when `use_idf` is off.
    idf: Option<Vec<f32>>,
}

/// Reweights count rows by `tf * idf` and L2-normalizes each row.
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1` with smoothing, or
/// `ln(n / df(t)) + 1` without.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfTransformer {
    pub params: TfidfParams,
    state: Option<TfidfState>,
}

impl TfidfTransformer {
    pub fn new(params: TfidfParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    pub fn n_features(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.n_features)
    }

    /// Fitted IDF weights, when IDF is enabled.
    pub fn idf(&self) -> Option<&[f32]> {
        self.state.as_ref().and_then(|state| state.idf.as_deref())
    }

    /// Learn document frequencies from count rows over `n_features` terms.
    pub fn fit(&mut self, rows: &[SparseRow], n_features: usize) -> Result<(), ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let mut df = vec![0u32; n_features];
        for row in rows {
            for &(index, value) in row {
                let slot = df.get_mut(index as usize).ok_or(ModelError::FeatureOutOfRange {
                    index,
                    n_features,
                })?;
                if value != 0.0 {
                    *slot += 1;
                }
            }
        }
        let idf = self.params.use_idf.then(|| {
            let smooth = if self.params.smooth_idf { 1.0 } else { 0.0 };
            let n_docs = rows.len() as f64 + smooth;
            df.iter()
                .map(|&count| ((n_docs / (count as f64 + smooth)).ln() + 1.0) as f32)
                .collect()
        });
        self.state = Some(TfidfState { n_features, idf });
        Ok(())
    }

    /// Weight and normalize count rows.
    pub fn transform(&self, rows: Vec<SparseRow>) -> Result<Vec<SparseRow>, ModelError> {
        let state = self
            .state
            .as_ref()
            .ok_or(ModelError::NotFitted("tf-idf transformer"))?;
        rows.into_iter()
            .map(|row| self.weight_row(state, row))
            .collect()
    }

    fn weight_row(&self, state: &TfidfState, mut row: SparseRow) -> Result<SparseRow, ModelError> {
        for (index, value) in row.iter_mut() {
            if *index as usize >= state.n_features {
                return Err(ModelError::FeatureOutOfRange {
                    index: *index,
                    n_features: state.n_features,
                });
            }
            let mut tf = *value as f64;
            if self.params.sublinear_tf && tf > 0.0 {
                tf = tf.ln() + 1.0;
            }
            let idf = state
                .idf
                .as_ref()
                .map_or(1.0, |idf| idf[*index as usize] as f64);
            *value = (tf * idf) as f32;
        }
        let norm = row
            .iter()
            .map(|&(_, value)| (value as f64) * (value as f64))
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for (_, value) in row.iter_mut() {
                *value = (*value as f64 / norm) as f32;
            }
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn smoothed_idf_matches_closed_form() {
        let rows = vec![vec![(0, 1.0), (1, 1.0)], vec![(0, 2.0)], vec![(0, 1.0)]];
        let mut tfidf = TfidfTransformer::new(TfidfParams::default());
        tfidf.fit(&rows, 2).unwrap();
        let idf = tfidf.idf().unwrap();
        // term 0 appears in all 3 docs, term 1 in one.
        assert!(approx(idf[0], 1.0));
        assert!(approx(idf[1], ((4.0f64 / 2.0).ln() + 1.0) as f32));
    }

    #[test]
    fn rows_are_l2_normalized() {
        let rows = vec![vec![(0, 1.0), (1, 3.0)], vec![(1, 1.0)]];
        let mut tfidf = TfidfTransformer::new(TfidfParams::default());
        tfidf.fit(&rows, 2).unwrap();
        for row in tfidf.transform(rows).unwrap() {
            let norm: f32 = row.iter().map(|(_, v)| v * v).sum();
            assert!(approx(norm, 1.0));
        }
    }

    #[test]
    fn empty_rows_stay_empty() {
        let mut tfidf = TfidfTransformer::new(TfidfParams::default());
        tfidf.fit(&[vec![(0, 1.0)]], 1).unwrap();
        let out = tfidf.transform(vec![Vec::new()]).unwrap();
        assert!(out[0].is_empty());
    }

    #[test]
    fn without_idf_only_normalizes() {
        let params = TfidfParams {
            use_idf: false,
            ..TfidfParams::default()
        };
        let mut tfidf = TfidfTransformer::new(params);
        tfidf.fit(&[vec![(0, 3.0), (1, 4.0)]], 2).unwrap();
        assert!(tfidf.idf().is_none());
        let out = tfidf.transform(vec![vec![(0, 3.0), (1, 4.0)]]).unwrap();
        assert!(approx(out[0][0].1, 0.6));
        assert!(approx(out[0][1].1, 0.8));
    }

    #[test]
    fn out_of_range_features_are_rejected() {
        let mut tfidf = TfidfTransformer::new(TfidfParams::default());
        assert!(matches!(
            tfidf.fit(&[vec![(5, 1.0)]], 2),
            Err(ModelError::FeatureOutOfRange { index: 5, .. })
        ));
        tfidf.fit(&[vec![(0, 1.0)]], 1).unwrap();
        assert!(tfidf.transform(vec![vec![(3, 1.0)]]).is_err());
    }

    #[test]
    fn transform_requires_fit() {
        let tfidf = TfidfTransformer::new(TfidfParams::default());
        assert!(matches!(
            tfidf.transform(vec![vec![(0, 1.0)]]),
            Err(ModelError::NotFitted(_))
        ));
    }
}

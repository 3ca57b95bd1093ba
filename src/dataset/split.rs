//! Seeded random train/test split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),
    #[error("cannot split {rows} rows into non-empty train and test sets with test_size {test_size}")]
    TooFewRows { rows: usize, test_size: f64 },
}

/// Row indices for each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    /// Seed the permutation was drawn with.
    pub seed: u64,
}

/// Shuffle `0..n` and cut it into `ceil(test_size * n)` test rows and the
/// remaining train rows.
///
/// Without a seed one is drawn from OS entropy and logged.
pub fn train_test_split(
    n: usize,
    test_size: f64,
    seed: Option<u64>,
) -> Result<SplitIndices, SplitError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SplitError::InvalidTestSize(test_size));
    }
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SplitError::TooFewRows { rows: n, test_size });
    }
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = permutation.split_off(n_test);
    info!(
        seed,
        train = train.len(),
        test = permutation.len(),
        "Split corpus"
    );
    Ok(SplitIndices {
        train,
        test: permutation,
        seed,
    })
}

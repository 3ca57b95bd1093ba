//! Evaluation metrics for multi-label classification.

use std::fmt;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Averages reported below the per-category rows, in print order.
pub const AVERAGE_NAMES: [&str; 4] = ["micro avg", "macro avg", "weighted avg", "samples avg"];

/// Errors raised while scoring predictions.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("truth is {truth:?} but predictions are {predicted:?}")]
    ShapeMismatch {
        truth: (usize, usize),
        predicted: (usize, usize),
    },
    #[error("{names} category names for {columns} label columns")]
    NameCount { names: usize, columns: usize },
    #[error("cannot score an empty test set")]
    Empty,
    #[error("non-binary value {value} at row {row}, column {column}")]
    NonBinary { row: usize, column: usize, value: u8 },
}

/// Confusion counts for one binary label column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryConfusion {
    pub true_positive: u32,
    pub false_positive: u32,
    pub false_negative: u32,
    pub true_negative: u32,
}

impl BinaryConfusion {
    pub fn add(&mut self, truth: u8, predicted: u8) {
        let slot = match (truth, predicted) {
            (1, 1) => &mut self.true_positive,
            (0, 1) => &mut self.false_positive,
            (1, 0) => &mut self.false_negative,
            _ => &mut self.true_negative,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn merge(&mut self, other: &Self) {
        self.true_positive += other.true_positive;
        self.false_positive += other.false_positive;
        self.false_negative += other.false_negative;
        self.true_negative += other.true_negative;
    }

    /// Number of true examples for the label.
    pub fn support(&self) -> u32 {
        self.true_positive + self.false_negative
    }

    /// Precision, recall and F1 for the positive class. Undefined ratios are 0.
    pub fn stats(&self) -> PerClassStats {
        let tp = self.true_positive as f64;
        let precision = ratio(tp, tp + self.false_positive as f64);
        let recall = ratio(tp, tp + self.false_negative as f64);
        PerClassStats {
            precision,
            recall,
            f1: f1_score(precision, recall),
            support: self.support(),
        }
    }
}

/// Precision/recall statistics for a single category or average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    pub f1: f64,
    /// Total number of true examples.
    pub support: u32,
}

/// Harmonic mean of precision and recall; 0 when both are 0.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Per-category report row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub name: String,
    pub stats: PerClassStats,
}

/// Precision, recall and F1 for every category plus the usual averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub categories: Vec<CategoryReport>,
    pub micro: PerClassStats,
    pub macro_avg: PerClassStats,
    pub weighted: PerClassStats,
    pub samples: PerClassStats,
    /// Fraction of rows whose whole label vector was predicted exactly.
    pub subset_accuracy: f64,
    pub n_samples: usize,
}

impl ClassificationReport {
    pub fn category(&self, name: &str) -> Option<&PerClassStats> {
        self.categories
            .iter()
            .find(|row| row.name == name)
            .map(|row| &row.stats)
    }

    fn averages(&self) -> [(&'static str, &PerClassStats); 4] {
        [
            (AVERAGE_NAMES[0], &self.micro),
            (AVERAGE_NAMES[1], &self.macro_avg),
            (AVERAGE_NAMES[2], &self.weighted),
            (AVERAGE_NAMES[3], &self.samples),
        ]
    }
}

/// Score predicted labels against the truth, column by column.
///
/// Both matrices are rows x categories with 0/1 entries, and `names` labels
/// every column.
pub fn classification_report(
    truth: ArrayView2<'_, u8>,
    predicted: ArrayView2<'_, u8>,
    names: &[String],
) -> Result<ClassificationReport, MetricsError> {
    if truth.dim() != predicted.dim() {
        return Err(MetricsError::ShapeMismatch {
            truth: truth.dim(),
            predicted: predicted.dim(),
        });
    }
    if names.len() != truth.ncols() {
        return Err(MetricsError::NameCount {
            names: names.len(),
            columns: truth.ncols(),
        });
    }
    let (n_samples, n_labels) = truth.dim();
    if n_samples == 0 {
        return Err(MetricsError::Empty);
    }
    for ((row, column), &value) in truth.indexed_iter().chain(predicted.indexed_iter()) {
        if value > 1 {
            return Err(MetricsError::NonBinary { row, column, value });
        }
    }

    let mut confusions = vec![BinaryConfusion::default(); n_labels];
    let mut sample_precision = 0.0;
    let mut sample_recall = 0.0;
    let mut sample_f1 = 0.0;
    let mut exact = 0usize;
    for (truth_row, predicted_row) in truth.rows().into_iter().zip(predicted.rows()) {
        let mut row_confusion = BinaryConfusion::default();
        for (column, (&t, &p)) in truth_row.iter().zip(predicted_row.iter()).enumerate() {
            confusions[column].add(t, p);
            row_confusion.add(t, p);
        }
        let stats = row_confusion.stats();
        sample_precision += stats.precision;
        sample_recall += stats.recall;
        sample_f1 += stats.f1;
        if row_confusion.false_positive == 0 && row_confusion.false_negative == 0 {
            exact += 1;
        }
    }

    let categories: Vec<CategoryReport> = names
        .iter()
        .zip(&confusions)
        .map(|(name, confusion)| CategoryReport {
            name: name.clone(),
            stats: confusion.stats(),
        })
        .collect();
    let total_support: u32 = categories.iter().map(|row| row.stats.support).sum();

    let mut pooled = BinaryConfusion::default();
    for confusion in &confusions {
        pooled.merge(confusion);
    }
    let micro = pooled.stats();

    let label_count = n_labels.max(1) as f64;
    let macro_avg = PerClassStats {
        precision: categories.iter().map(|row| row.stats.precision).sum::<f64>() / label_count,
        recall: categories.iter().map(|row| row.stats.recall).sum::<f64>() / label_count,
        f1: categories.iter().map(|row| row.stats.f1).sum::<f64>() / label_count,
        support: total_support,
    };

    let weighted_mean = |pick: fn(&PerClassStats) -> f64| {
        if total_support == 0 {
            return 0.0;
        }
        categories
            .iter()
            .map(|row| pick(&row.stats) * row.stats.support as f64)
            .sum::<f64>()
            / total_support as f64
    };
    let weighted = PerClassStats {
        precision: weighted_mean(|stats| stats.precision),
        recall: weighted_mean(|stats| stats.recall),
        f1: weighted_mean(|stats| stats.f1),
        support: total_support,
    };

    let rows = n_samples as f64;
    let samples = PerClassStats {
        precision: sample_precision / rows,
        recall: sample_recall / rows,
        f1: sample_f1 / rows,
        support: total_support,
    };

    Ok(ClassificationReport {
        categories,
        micro,
        macro_avg,
        weighted,
        samples,
        subset_accuracy: exact as f64 / rows,
        n_samples,
    })
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .categories
            .iter()
            .map(|row| row.name.chars().count())
            .chain(AVERAGE_NAMES.iter().map(|name| name.len()))
            .max()
            .unwrap_or(0);
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for row in &self.categories {
            write_row(f, &row.name, &row.stats, width)?;
        }
        writeln!(f)?;
        for (name, stats) in self.averages() {
            write_row(f, name, stats, width)?;
        }
        Ok(())
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    stats: &PerClassStats,
    width: usize,
) -> fmt::Result {
    writeln!(
        f,
        "{name:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        stats.precision, stats.recall, stats.f1, stats.support
    )
}

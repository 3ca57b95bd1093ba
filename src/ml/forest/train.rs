use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::tree::{DecisionTree, TreeNode};
use crate::ml::{SparseRow, sparse_value};

const IMPURITY_EPSILON: f64 = 1e-7;

/// Stopping and sampling rules for growing one tree.
#[derive(Debug, Clone)]
pub(crate) struct GrowOptions {
    /// Non-constant features examined per node.
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

struct PendingNode {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: u32,
    threshold: f32,
    /// Weighted child impurity; lower is better.
    score: f64,
}

enum FeatureSplit {
    Constant,
    NoValidSplit,
    Found(SplitCandidate),
}

/// Value group used while scanning thresholds for one feature.
#[derive(Debug, Clone, Copy)]
struct ValueGroup {
    value: f32,
    negative: f64,
    positive: f64,
    count: usize,
}

/// Grow a CART tree with Gini impurity over binary labels.
///
/// `weights` holds per-row sample weights (bootstrap counts); rows with zero
/// weight are left out entirely.
pub(crate) fn grow_tree(
    rows: &[SparseRow],
    labels: &[u8],
    weights: &[f64],
    options: &GrowOptions,
    rng: &mut StdRng,
) -> DecisionTree {
    let mut samples: Vec<u32> = (0..rows.len() as u32)
        .filter(|&idx| weights[idx as usize] > 0.0)
        .collect();
    let mut nodes = vec![TreeNode::Leaf { positive: 0.0 }];
    let mut stack = vec![PendingNode {
        node: 0,
        start: 0,
        end: samples.len(),
        depth: 0,
    }];

    while let Some(task) = stack.pop() {
        let members = &samples[task.start..task.end];
        let (negative, positive) = class_weights(members, labels, weights);
        let total = negative + positive;
        let leaf = TreeNode::Leaf {
            positive: if total > 0.0 {
                (positive / total) as f32
            } else {
                0.0
            },
        };
        let n = members.len();
        let depth_reached = options.max_depth.is_some_and(|max| task.depth >= max);
        if n < options.min_samples_split
            || n < 2 * options.min_samples_leaf
            || depth_reached
            || gini(negative, positive) <= IMPURITY_EPSILON
        {
            nodes[task.node] = leaf;
            continue;
        }
        let Some(split) = best_split(rows, labels, weights, members, negative, positive, options, rng)
        else {
            nodes[task.node] = leaf;
            continue;
        };

        let (left_samples, right_samples): (Vec<u32>, Vec<u32>) = samples[task.start..task.end]
            .iter()
            .partition(|&&idx| sparse_value(&rows[idx as usize], split.feature) <= split.threshold);
        let mid = task.start + left_samples.len();
        samples[task.start..mid].copy_from_slice(&left_samples);
        samples[mid..task.end].copy_from_slice(&right_samples);

        let left = nodes.len();
        let right = left + 1;
        nodes.push(TreeNode::Leaf { positive: 0.0 });
        nodes.push(TreeNode::Leaf { positive: 0.0 });
        nodes[task.node] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left as u32,
            right: right as u32,
        };
        stack.push(PendingNode {
            node: right,
            start: mid,
            end: task.end,
            depth: task.depth + 1,
        });
        stack.push(PendingNode {
            node: left,
            start: task.start,
            end: mid,
            depth: task.depth + 1,
        });
    }

    DecisionTree { nodes }
}

fn class_weights(members: &[u32], labels: &[u8], weights: &[f64]) -> (f64, f64) {
    let mut negative = 0.0;
    let mut positive = 0.0;
    for &idx in members {
        let weight = weights[idx as usize];
        if labels[idx as usize] == 1 {
            positive += weight;
        } else {
            negative += weight;
        }
    }
    (negative, positive)
}

fn gini(negative: f64, positive: f64) -> f64 {
    let total = negative + positive;
    if total <= 0.0 {
        return 0.0;
    }
    let p_neg = negative / total;
    let p_pos = positive / total;
    1.0 - p_neg * p_neg - p_pos * p_pos
}

#[allow(clippy::too_many_arguments)]
fn best_split(
    rows: &[SparseRow],
    labels: &[u8],
    weights: &[f64],
    members: &[u32],
    negative: f64,
    positive: f64,
    options: &GrowOptions,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    // Features absent from every member are constant (all zero) at this node,
    // so only features present in some member row are candidates.
    let mut by_feature: HashMap<u32, Vec<(f32, u32)>> = HashMap::new();
    for &idx in members {
        for &(feature, value) in &rows[idx as usize] {
            if value != 0.0 {
                by_feature.entry(feature).or_default().push((value, idx));
            }
        }
    }
    let mut features: Vec<u32> = by_feature.keys().copied().collect();
    features.sort_unstable();
    features.shuffle(rng);

    let mut visited = 0usize;
    let mut best: Option<SplitCandidate> = None;
    for feature in features {
        if visited >= options.max_features {
            break;
        }
        let entries = &by_feature[&feature];
        match evaluate_feature(
            feature,
            entries,
            members.len(),
            negative,
            positive,
            labels,
            weights,
            options.min_samples_leaf,
        ) {
            FeatureSplit::Constant => {}
            FeatureSplit::NoValidSplit => visited += 1,
            FeatureSplit::Found(candidate) => {
                visited += 1;
                if best.as_ref().is_none_or(|current| candidate.score < current.score) {
                    best = Some(candidate);
                }
            }
        }
    }
    best
}

#[allow(clippy::too_many_arguments)]
fn evaluate_feature(
    feature: u32,
    entries: &[(f32, u32)],
    n_members: usize,
    negative: f64,
    positive: f64,
    labels: &[u8],
    weights: &[f64],
    min_samples_leaf: usize,
) -> FeatureSplit {
    let mut groups: Vec<ValueGroup> = Vec::with_capacity(entries.len() + 1);
    let mut nonzero_negative = 0.0;
    let mut nonzero_positive = 0.0;
    for &(value, idx) in entries {
        let weight = weights[idx as usize];
        let is_positive = labels[idx as usize] == 1;
        if is_positive {
            nonzero_positive += weight;
        } else {
            nonzero_negative += weight;
        }
        groups.push(ValueGroup {
            value,
            negative: if is_positive { 0.0 } else { weight },
            positive: if is_positive { weight } else { 0.0 },
            count: 1,
        });
    }
    let zero_count = n_members - entries.len();
    if zero_count > 0 {
        groups.push(ValueGroup {
            value: 0.0,
            negative: (negative - nonzero_negative).max(0.0),
            positive: (positive - nonzero_positive).max(0.0),
            count: zero_count,
        });
    }
    groups.sort_by(|a, b| a.value.total_cmp(&b.value));
    let (Some(first), Some(last)) = (groups.first(), groups.last()) else {
        return FeatureSplit::Constant;
    };
    if first.value == last.value {
        return FeatureSplit::Constant;
    }

    let mut best: Option<SplitCandidate> = None;
    let mut left = ValueGroup {
        value: 0.0,
        negative: 0.0,
        positive: 0.0,
        count: 0,
    };
    for pair in groups.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        left.negative += current.negative;
        left.positive += current.positive;
        left.count += current.count;
        if current.value == next.value {
            continue;
        }
        let right_count = n_members - left.count;
        if left.count < min_samples_leaf || right_count < min_samples_leaf {
            continue;
        }
        let right_negative = (negative - left.negative).max(0.0);
        let right_positive = (positive - left.positive).max(0.0);
        let score = (left.negative + left.positive) * gini(left.negative, left.positive)
            + (right_negative + right_positive) * gini(right_negative, right_positive);
        if best.as_ref().is_none_or(|current| score < current.score) {
            best = Some(SplitCandidate {
                feature,
                threshold: midpoint(current.value, next.value),
                score,
            });
        }
    }
    match best {
        Some(candidate) => FeatureSplit::Found(candidate),
        None => FeatureSplit::NoValidSplit,
    }
}

fn midpoint(low: f32, high: f32) -> f32 {
    let mid = low / 2.0 + high / 2.0;
    if !mid.is_finite() || mid >= high { low } else { mid }
}

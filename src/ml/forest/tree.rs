use serde::{Deserialize, Serialize};

use crate::ml::sparse_value;

/// Node of a fitted binary decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node holding the positive-class probability.
    Leaf { positive: f32 },
    /// Internal node: rows with `feature <= threshold` go left.
    Split {
        feature: u32,
        threshold: f32,
        left: u32,
        right: u32,
    },
}

/// Flat, root-first decision tree over sparse rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Positive-class probability for a sparse row.
    pub fn predict_positive(&self, row: &[(u32, f32)]) -> f32 {
        let mut index = 0usize;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { positive }) => return *positive,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let next = if sparse_value(row, *feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    index = next as usize;
                }
                None => return 0.0,
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Check structural invariants: children come after their parent and
    /// features fit the expected dimensionality.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { positive } => {
                    if !(0.0..=1.0).contains(positive) {
                        return Err(format!("leaf {index} probability {positive} out of range"));
                    }
                }
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature as usize >= n_features {
                        return Err(format!(
                            "node {index} splits on feature {feature} but only {n_features} exist"
                        ));
                    }
                    for child in [*left as usize, *right as usize] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("node {index} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

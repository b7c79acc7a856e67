//! Decision-tree ensemble evaluation.
//!
//! Trees are stored as flat node lists with the root at index 0. Children
//! always come after their parent, which bounds every walk by the node count.

use serde::{Deserialize, Serialize};

/// A single tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes to `left`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Probability of the high-risk class at this leaf
        probability: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, index: usize, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {index} has no nodes"));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= width {
                        return Err(format!(
                            "tree {index} node {i} splits on feature {feature}, layout has {width}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {index} node {i} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!(
                                "tree {index} node {i} has invalid child index {child}"
                            ));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(format!(
                            "tree {index} leaf {i} probability {probability} outside [0, 1]"
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_probability(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[feature] <= threshold { left } else { right };
                }
                TreeNode::Leaf { probability } => return probability,
            }
        }
    }
}

/// Averaging ensemble of decision trees (random-forest style).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub(super) fn validate(&self, width: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.validate(i, width))
    }

    /// Mean leaf probability across trees.
    pub(super) fn probability(&self, x: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.leaf_probability(x)).sum();
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { probability: low },
                TreeNode::Leaf { probability: high },
            ],
        }
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let tree = stump(0, 130.0, 0.1, 0.9);
        assert!((tree.leaf_probability(&[130.0]) - 0.1).abs() < f64::EPSILON);
        assert!((tree.leaf_probability(&[130.5]) - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ensemble_averages() {
        let ensemble = TreeEnsemble {
            trees: vec![stump(0, 130.0, 0.2, 0.8), stump(1, 1.0, 0.0, 1.0)],
        };
        assert!(ensemble.validate(2).is_ok());
        let p = ensemble.probability(&[150.0, 1.0]);
        assert!((p - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Leaf { probability: 0.5 },
                TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 0,
                },
            ],
        };
        let ensemble = TreeEnsemble { trees: vec![tree] };
        assert!(ensemble.validate(1).is_err());
    }

    #[test]
    fn test_rejects_out_of_layout_feature() {
        let ensemble = TreeEnsemble {
            trees: vec![stump(11, 1.0, 0.0, 1.0)],
        };
        let err = ensemble.validate(11).expect_err("feature 11 is out of range");
        assert!(err.contains("feature 11"));
    }
}

use serde::{Deserialize, Serialize};

use super::GbdtError;

/// Node of a regression tree; children are indices into [`RegressionTree::nodes`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        /// Feature index used for the split.
        feature_index: usize,
        /// Rows with `feature < threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary regression tree stored as a flat node list rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Predict the tree output for a feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0usize;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature_index).copied().unwrap_or(0.0);
                    index = if value < *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Number of split levels below the root.
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[TreeNode], index: usize) -> usize {
            match nodes.get(index) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
                _ => 0,
            }
        }
        depth_of(&self.nodes, 0)
    }
}

/// Gradient-boosted regression model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtRegressor {
    /// Model format version.
    pub model_version: u32,
    /// Number of `f64` values per feature vector.
    pub feature_count: usize,
    /// Shrinkage applied to every tree output.
    pub learning_rate: f64,
    /// Starting prediction before any tree (mean of the training targets).
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl GbdtRegressor {
    pub const MODEL_VERSION: u32 = 1;

    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), GbdtError> {
        if self.model_version != Self::MODEL_VERSION {
            return Err(GbdtError::InvalidModel(format!(
                "unsupported model version {}",
                self.model_version
            )));
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(GbdtError::InvalidModel(format!("tree {tree_idx} is empty")));
            }
            for (node_idx, node) in tree.nodes.iter().enumerate() {
                let TreeNode::Split {
                    feature_index,
                    left,
                    right,
                    ..
                } = node
                else {
                    continue;
                };
                if *feature_index >= self.feature_count {
                    return Err(GbdtError::InvalidModel(format!(
                        "tree {tree_idx} node {node_idx} uses feature {feature_index} of {}",
                        self.feature_count
                    )));
                }
                // Children always follow their parent, which also rules out cycles.
                for child in [*left, *right] {
                    if child <= node_idx || child >= tree.nodes.len() {
                        return Err(GbdtError::InvalidModel(format!(
                            "tree {tree_idx} node {node_idx} has invalid child {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Predict the target for a feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| self.learning_rate * tree.predict(features))
                .sum::<f64>()
    }

    /// Predict every row of a feature matrix.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64, left_value: f64, right_value: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature_index: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left_value },
                TreeNode::Leaf { value: right_value },
            ],
        }
    }

    #[test]
    fn tree_predict_branches() {
        let tree = stump(0.5, -1.0, 2.0);
        assert_eq!(tree.predict(&[0.0]), -1.0);
        assert_eq!(tree.predict(&[0.5]), 2.0);
        assert_eq!(tree.predict(&[0.6]), 2.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn model_adds_shrunk_tree_outputs_to_base_score() {
        let model = GbdtRegressor {
            model_version: GbdtRegressor::MODEL_VERSION,
            feature_count: 1,
            learning_rate: 0.5,
            base_score: 10.0,
            trees: vec![stump(0.0, -4.0, 4.0), stump(1.0, 2.0, 0.0)],
        };
        assert!(model.validate().is_ok());
        assert_eq!(model.predict(&[-1.0]), 10.0 - 2.0 + 1.0);
        assert_eq!(model.predict(&[5.0]), 10.0 + 2.0);
        assert_eq!(model.predict_batch(&[vec![-1.0], vec![5.0]]), vec![9.0, 12.0]);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let model = GbdtRegressor {
            model_version: GbdtRegressor::MODEL_VERSION,
            feature_count: 1,
            learning_rate: 0.1,
            base_score: 0.0,
            trees: vec![RegressionTree {
                nodes: vec![TreeNode::Split {
                    feature_index: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                }],
            }],
        };
        assert!(matches!(model.validate(), Err(GbdtError::InvalidModel(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_features() {
        let mut tree = stump(0.0, 1.0, 2.0);
        if let TreeNode::Split { feature_index, .. } = &mut tree.nodes[0] {
            *feature_index = 3;
        }
        let model = GbdtRegressor {
            model_version: GbdtRegressor::MODEL_VERSION,
            feature_count: 2,
            learning_rate: 0.1,
            base_score: 0.0,
            trees: vec![tree],
        };
        assert!(model.validate().is_err());
    }
}

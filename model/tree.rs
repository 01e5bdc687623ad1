use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::estimator::ModelError;

/// A single node of a fitted regression tree.
///
/// Trees are stored as a flat node array, the same layout most training
/// libraries export: index 0 is the root, and split nodes refer to their
/// children by position in the array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal node. Rows with `x[feature] <= threshold` descend to `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node carrying the predicted value.
    Leaf { value: f64 },
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
    /// Impurity-based importance per input column, as exported by the trainer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

impl DecisionTree {
    /// Walks the tree from the root for a single row.
    ///
    /// The walk is bounded by the node count, so a malformed artifact whose
    /// child indices form a cycle is reported instead of looping forever.
    /// A root-to-leaf path visits each node at most once, so `len + 1` steps
    /// always reach either a leaf or a bad index.
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64, ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::EmptyTree);
        }

        let mut index = 0usize;
        for _ in 0..=self.nodes.len() {
            let node = self
                .nodes
                .get(index)
                .ok_or(ModelError::NodeOutOfRange {
                    index,
                    len: self.nodes.len(),
                })?;

            match *node {
                TreeNode::Leaf { value } => return Ok(value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *x.get(feature).ok_or(ModelError::FeatureOutOfRange {
                        feature,
                        width: x.len(),
                    })?;
                    index = if value <= threshold { left } else { right };
                }
            }
        }

        Err(ModelError::UnterminatedTree {
            nodes: self.nodes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Depth-one stump: `x[0] <= 0.5` goes to 1.0, otherwise 3.0.
    fn stump() -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 1.0 },
                TreeNode::Leaf { value: 3.0 },
            ],
            feature_importances: None,
        }
    }

    #[test]
    fn test_stump_routes_on_threshold() {
        let tree = stump();
        assert_eq!(tree.predict(array![0.2].view()).unwrap(), 1.0);
        assert_eq!(tree.predict(array![0.5].view()).unwrap(), 1.0);
        assert_eq!(tree.predict(array![0.9].view()).unwrap(), 3.0);
    }

    #[test]
    fn test_nan_input_goes_right() {
        // NaN never compares <= threshold.
        let tree = stump();
        assert_eq!(tree.predict(array![f64::NAN].view()).unwrap(), 3.0);
    }

    #[test]
    fn test_split_on_missing_column_is_an_error() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 4,
                    threshold: 0.0,
                    left: 1,
                    right: 1,
                },
                TreeNode::Leaf { value: 0.0 },
            ],
            feature_importances: None,
        };
        let err = tree.predict(array![1.0, 2.0].view()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureOutOfRange {
                feature: 4,
                width: 2
            }
        ));
    }

    #[test]
    fn test_dangling_child_is_an_error() {
        let tree = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 7,
                right: 7,
            }],
            feature_importances: None,
        };
        let err = tree.predict(array![1.0].view()).unwrap_err();
        assert!(matches!(err, ModelError::NodeOutOfRange { index: 7, len: 1 }));
    }

    #[test]
    fn test_dangling_child_after_every_node_is_an_error() {
        // The path visits every node before stepping to the bad index.
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 1,
                },
                TreeNode::Split {
                    feature: 0,
                    threshold: 5.0,
                    left: 9,
                    right: 9,
                },
            ],
            feature_importances: None,
        };
        let err = tree.predict(array![6.0].view()).unwrap_err();
        assert_eq!(err, ModelError::NodeOutOfRange { index: 9, len: 2 });
    }

    #[test]
    fn test_self_loop_is_detected() {
        let tree = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
            feature_importances: None,
        };
        let err = tree.predict(array![1.0].view()).unwrap_err();
        assert_eq!(err, ModelError::UnterminatedTree { nodes: 1 });
    }

    #[test]
    fn test_cycle_is_detected() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 1,
                },
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                },
            ],
            feature_importances: None,
        };
        let err = tree.predict(array![1.0].view()).unwrap_err();
        assert!(matches!(err, ModelError::UnterminatedTree { nodes: 2 }));
    }

    #[test]
    fn test_empty_tree_is_an_error() {
        let tree = DecisionTree {
            nodes: vec![],
            feature_importances: None,
        };
        assert!(matches!(
            tree.predict(array![1.0].view()),
            Err(ModelError::EmptyTree)
        ));
    }
}

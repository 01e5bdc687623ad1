use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tree::DecisionTree;

/// Errors raised while evaluating a model on an input row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Input row has {found} features, but the model was trained on {expected}.")]
    DimensionMismatch { found: usize, expected: usize },
    #[error("Tree splits on feature column {feature}, but the input row only has {width} columns.")]
    FeatureOutOfRange { feature: usize, width: usize },
    #[error("Tree refers to node {index}, but it only has {len} nodes.")]
    NodeOutOfRange { index: usize, len: usize },
    #[error("Tree traversal visited all {nodes} nodes without reaching a leaf. The node links form a cycle.")]
    UnterminatedTree { nodes: usize },
    #[error("Tree has no nodes.")]
    EmptyTree,
    #[error("Ensemble model has no estimators.")]
    EmptyEnsemble,
    #[error(
        "Ensemble member {member} reports {found} feature importances, but member 0 reports {expected}."
    )]
    ImportanceShape {
        member: usize,
        expected: usize,
        found: usize,
    },
}

/// Ordinary least-squares style model: `intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Bagged ensemble of regression trees. The prediction is the mean over members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub estimators: Vec<DecisionTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

/// Additive boosting model: `init + learning_rate * Σ tree(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub init: f64,
    pub learning_rate: f64,
    pub estimators: Vec<DecisionTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

/// Every model kind a serving artifact can carry, tagged by `kind` in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear(LinearModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl LinearModel {
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64, ModelError> {
        if x.len() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                found: x.len(),
                expected: self.coefficients.len(),
            });
        }
        let coefficients = ArrayView1::from(self.coefficients.as_slice());
        Ok(self.intercept + coefficients.dot(&x))
    }
}

impl RandomForest {
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64, ModelError> {
        if self.estimators.is_empty() {
            return Err(ModelError::EmptyEnsemble);
        }
        let mut total = 0.0;
        for tree in &self.estimators {
            total += tree.predict(x)?;
        }
        Ok(total / self.estimators.len() as f64)
    }

    /// Stored importances, or the mean of the members' importances when every
    /// member carries a vector of the same length.
    fn feature_importances(&self) -> Result<Option<Vec<f64>>, ModelError> {
        if let Some(stored) = &self.feature_importances {
            return Ok(Some(stored.clone()));
        }

        let per_member: Option<Vec<&Vec<f64>>> = self
            .estimators
            .iter()
            .map(|tree| tree.feature_importances.as_ref())
            .collect();
        let Some(per_member) = per_member else {
            return Ok(None);
        };
        let Some(first) = per_member.first() else {
            return Ok(None);
        };

        let width = first.len();
        let mut sum = Array1::<f64>::zeros(width);
        for (member, importances) in per_member.iter().enumerate() {
            if importances.len() != width {
                return Err(ModelError::ImportanceShape {
                    member,
                    expected: width,
                    found: importances.len(),
                });
            }
            sum += &ArrayView1::from(importances.as_slice());
        }
        sum /= per_member.len() as f64;
        Ok(Some(sum.to_vec()))
    }
}

impl GradientBoosting {
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64, ModelError> {
        let mut staged = 0.0;
        for tree in &self.estimators {
            staged += tree.predict(x)?;
        }
        Ok(self.init + self.learning_rate * staged)
    }
}

impl RegressionModel {
    /// Evaluates the model on a single row ordered by the artifact's feature list.
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64, ModelError> {
        match self {
            RegressionModel::Linear(model) => model.predict(x),
            RegressionModel::DecisionTree(tree) => tree.predict(x),
            RegressionModel::RandomForest(forest) => forest.predict(x),
            RegressionModel::GradientBoosting(boosted) => boosted.predict(x),
        }
    }

    /// Independent sub-estimators whose spread is a meaningful uncertainty signal.
    ///
    /// Only bagged ensembles qualify. Boosting stages fit residuals of one another,
    /// so their individual outputs are not predictions of the target.
    pub fn ensemble(&self) -> Option<&[DecisionTree]> {
        match self {
            RegressionModel::RandomForest(forest) => Some(&forest.estimators),
            RegressionModel::Linear(_)
            | RegressionModel::DecisionTree(_)
            | RegressionModel::GradientBoosting(_) => None,
        }
    }

    /// Per-feature importance weights in feature order, if the model provides them.
    pub fn feature_importances(&self) -> Result<Option<Vec<f64>>, ModelError> {
        match self {
            RegressionModel::Linear(_) => Ok(None),
            RegressionModel::DecisionTree(tree) => Ok(tree.feature_importances.clone()),
            RegressionModel::RandomForest(forest) => forest.feature_importances(),
            RegressionModel::GradientBoosting(boosted) => Ok(boosted.feature_importances.clone()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RegressionModel::Linear(_) => "linear",
            RegressionModel::DecisionTree(_) => "decision_tree",
            RegressionModel::RandomForest(_) => "random_forest",
            RegressionModel::GradientBoosting(_) => "gradient_boosting",
        }
    }
}

//! Fitted regression models and the TOML artifact that carries them.

pub mod artifact;
pub mod estimator;
pub mod tree;

pub use artifact::{ArtifactError, ModelArtifact};
pub use estimator::{GradientBoosting, LinearModel, ModelError, RandomForest, RegressionModel};
pub use tree::{DecisionTree, TreeNode};

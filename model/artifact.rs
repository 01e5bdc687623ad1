use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use super::estimator::RegressionModel;

// --- Public Data Structures ---
// The serving artifact is a single human-readable TOML document:
//
//     features = ["age", "study_time_weekly", "tutoring", ...]
//
//     [model]
//     kind = "random_forest"
//     ...

/// The self-contained file loaded once at startup: a fitted model plus the
/// ordered feature names it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Canonical column order. The input row handed to the model follows this order.
    pub features: Vec<String>,
    pub model: RegressionModel,
}

/// Custom error type for artifact loading and saving.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read or write model artifact '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML model artifact '{path}': {source}")]
    TomlParseError {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize model artifact to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

impl ModelArtifact {
    /// Loads an artifact from a TOML file.
    ///
    /// A missing file, invalid TOML, or a document lacking either the `features`
    /// list or the `model` table are all errors. Callers treat them as fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let toml_string = fs::read_to_string(path).map_err(|source| ArtifactError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&toml_string).map_err(|source| ArtifactError::TomlParseError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Saves the artifact in pretty TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let toml_string = toml::to_string_pretty(self)?;
        let io_error = |source: std::io::Error| ArtifactError::IoError {
            path: path.display().to_string(),
            source,
        };
        let mut file = BufWriter::new(fs::File::create(path).map_err(io_error)?);
        file.write_all(toml_string.as_bytes()).map_err(io_error)?;
        file.flush().map_err(io_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::estimator::{LinearModel, RandomForest};
    use crate::model::tree::{DecisionTree, TreeNode};
    use tempfile::tempdir;

    #[test]
    fn test_load_forest_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(
            &path,
            r#"
features = ["age", "tutoring"]

[model]
kind = "random_forest"
feature_importances = [0.25, 0.75]

[[model.estimators]]
[[model.estimators.nodes]]
node = "split"
feature = 1
threshold = 0.5
left = 1
right = 2

[[model.estimators.nodes]]
node = "leaf"
value = 2.5

[[model.estimators.nodes]]
node = "leaf"
value = 3.5
"#,
        )
        .unwrap();

        let artifact = ModelArtifact::load(&path).unwrap();
        assert_eq!(artifact.features, vec!["age", "tutoring"]);
        let RegressionModel::RandomForest(forest) = &artifact.model else {
            panic!("expected a random forest, found {}", artifact.model.kind());
        };
        assert_eq!(forest.estimators.len(), 1);
        assert_eq!(forest.estimators[0].nodes[1], TreeNode::Leaf { value: 2.5 });
        assert_eq!(forest.feature_importances, Some(vec![0.25, 0.75]));
    }

    /// Tests that the artifact can be saved to and loaded from a file,
    /// preserving all its contents exactly.
    #[test]
    fn test_save_load_functionality() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");

        let original = ModelArtifact {
            features: vec!["age".to_string(), "music".to_string()],
            model: RegressionModel::RandomForest(RandomForest {
                estimators: vec![DecisionTree {
                    nodes: vec![
                        TreeNode::Split {
                            feature: 0,
                            threshold: 15.5,
                            left: 1,
                            right: 2,
                        },
                        TreeNode::Leaf { value: 2.75 },
                        TreeNode::Leaf { value: 3.1 },
                    ],
                    feature_importances: Some(vec![1.0, 0.0]),
                }],
                feature_importances: None,
            }),
        };

        original.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = ModelArtifact::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ArtifactError::IoError { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_missing_features_key_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(
            &path,
            "[model]\nkind = \"linear\"\nintercept = 1.0\ncoefficients = [2.0]\n",
        )
        .unwrap();
        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::TomlParseError { .. }));
    }

    #[test]
    fn test_missing_model_table_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(&path, "features = [\"age\"]\n").unwrap();
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ArtifactError::TomlParseError { .. })
        ));
    }

    #[test]
    fn test_linear_round_trips_through_toml_text() {
        let artifact = ModelArtifact {
            features: vec!["age".to_string()],
            model: RegressionModel::Linear(LinearModel {
                intercept: 0.5,
                coefficients: vec![0.125],
            }),
        };
        let text = toml::to_string_pretty(&artifact).unwrap();
        assert!(text.contains("kind = \"linear\""));
        let parsed: ModelArtifact = toml::from_str(&text).unwrap();
        assert_eq!(parsed, artifact);
    }
}

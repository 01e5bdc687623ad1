//! # Feature Schema
//!
//! The ordered list of input columns the model was trained on, derived once at
//! startup from the artifact and never mutated afterwards.
//!
//! Two facts are derived alongside the names:
//! - Which columns are presence/absence checkboxes. This is a fixed vocabulary
//!   match on the column name, not a type declared by the artifact. Renaming a
//!   column in the training data silently turns it into a numeric input.
//! - The ranked feature importances, when the model exports them.

use itertools::Itertools;
use log::warn;
use thiserror::Error;

use crate::model::RegressionModel;

/// Column names, compared case-insensitively, that are rendered as checkboxes.
pub const BOOLEAN_FEATURE_NAMES: [&str; 5] = [
    "tutoring",
    "extracurricular",
    "sports",
    "music",
    "volunteering",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Free-text numeric input, coerced to `f64`.
    Numeric,
    /// Checkbox input, `1.0` when ticked and `0.0` otherwise.
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// The canonical, immutable column order shared by the form, the vector
/// builder and the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| {
                let kind = if is_boolean_feature_name(&name) {
                    FeatureKind::Boolean
                } else {
                    FeatureKind::Numeric
                };
                FeatureColumn { name, kind }
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Names of the checkbox columns, in schema order.
    pub fn boolean_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|column| column.kind == FeatureKind::Boolean)
            .map(|column| column.name.as_str())
    }
}

fn is_boolean_feature_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    BOOLEAN_FEATURE_NAMES.contains(&lowered.as_str())
}

/// One entry of the ranked importance list.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub name: String,
    pub weight: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportanceError {
    #[error("Model reports {found} feature importances, but the artifact lists {expected} features.")]
    LengthMismatch { found: usize, expected: usize },
    #[error("Importance weight for feature '{feature}' is not finite ({weight}).")]
    NonFinite { feature: String, weight: f64 },
}

/// Pairs each weight with its column and sorts by weight, largest first.
/// Equal weights keep schema order.
pub fn rank_importances(
    schema: &FeatureSchema,
    weights: &[f64],
) -> Result<Vec<FeatureImportance>, ImportanceError> {
    if weights.len() != schema.len() {
        return Err(ImportanceError::LengthMismatch {
            found: weights.len(),
            expected: schema.len(),
        });
    }

    let mut ranked = Vec::with_capacity(weights.len());
    for (name, &weight) in schema.names().zip(weights) {
        if !weight.is_finite() {
            return Err(ImportanceError::NonFinite {
                feature: name.to_string(),
                weight,
            });
        }
        ranked.push(FeatureImportance {
            name: name.to_string(),
            weight,
        });
    }

    // `sorted_by` is a stable sort.
    Ok(ranked
        .into_iter()
        .sorted_by(|a, b| b.weight.total_cmp(&a.weight))
        .collect())
}

/// Ranked importances for a loaded model, or `None` when the model has none
/// or they cannot be matched to the schema. Failures are logged, never raised.
pub fn derive_importances(
    schema: &FeatureSchema,
    model: &RegressionModel,
) -> Option<Vec<FeatureImportance>> {
    let weights = match model.feature_importances() {
        Ok(Some(weights)) => weights,
        Ok(None) => return None,
        Err(e) => {
            warn!("Feature importances unavailable: {e}");
            return None;
        }
    };

    match rank_importances(schema, &weights) {
        Ok(ranked) => Some(ranked),
        Err(e) => {
            warn!("Feature importances unavailable: {e}");
            None
        }
    }
}

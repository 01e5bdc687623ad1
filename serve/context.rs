use log::{debug, info, warn};
use std::path::Path;

use crate::inference::{Inference, run_inference};
use crate::model::{ArtifactError, ModelArtifact, ModelError, RegressionModel};
use crate::schema::{FeatureImportance, FeatureSchema, derive_importances};
use crate::vector::{FormFields, build_feature_vector};

/// Everything a request needs, built once at startup and read-only afterwards.
///
/// Shared between request handlers behind an `Arc`. Nothing mutates it after
/// construction, so no locking is involved.
#[derive(Debug)]
pub struct ServingContext {
    model: RegressionModel,
    schema: FeatureSchema,
    importances: Option<Vec<FeatureImportance>>,
}

impl ServingContext {
    /// Loads the artifact at `path`. Any error here must stop the process
    /// before it starts serving.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        info!("Loading model artifact from: {}", path.display());
        let artifact = ModelArtifact::load(path)?;
        Ok(Self::from_artifact(artifact))
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        let ModelArtifact { features, model } = artifact;
        let schema = FeatureSchema::new(features);
        let importances = derive_importances(&schema, &model);

        info!(
            "Loaded {} model with {} features ({} checkbox features)",
            model.kind(),
            schema.len(),
            schema.boolean_names().count()
        );
        if let RegressionModel::Linear(linear) = &model {
            if linear.coefficients.len() != schema.len() {
                warn!(
                    "Linear model has {} coefficients but the artifact lists {} features; every prediction will fail.",
                    linear.coefficients.len(),
                    schema.len()
                );
            }
        }

        Self {
            model,
            schema,
            importances,
        }
    }

    pub fn model(&self) -> &RegressionModel {
        &self.model
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn importances(&self) -> Option<&[FeatureImportance]> {
        self.importances.as_deref()
    }

    /// Builds the input row from submitted fields and runs the model on it.
    pub fn predict(&self, fields: &FormFields) -> Result<Inference, ModelError> {
        let row = build_feature_vector(fields, &self.schema);
        debug!(
            "Input features ({}): {}",
            self.schema.names().collect::<Vec<_>>().join(", "),
            row
        );
        run_inference(&self.model, row.view())
    }
}

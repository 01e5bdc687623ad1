use log::debug;
use ndarray::{Array1, ArrayView1};

use crate::model::{DecisionTree, ModelError, RegressionModel};

/// Number of decimal places shown for a prediction.
pub const DISPLAY_DECIMALS: i32 = 3;

/// Outcome of running the model on one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inference {
    pub prediction: f64,
    /// Sample standard deviation across ensemble members, when the model is an
    /// ensemble and every member could be evaluated.
    pub dispersion: Option<f64>,
}

impl Inference {
    pub fn rounded_prediction(&self) -> f64 {
        round_to(self.prediction, DISPLAY_DECIMALS)
    }
}

/// Runs the model and, for ensembles, the per-member spread.
///
/// Only the top-level prediction can fail. Problems while measuring the spread
/// leave `dispersion` empty.
pub fn run_inference(model: &RegressionModel, x: ArrayView1<f64>) -> Result<Inference, ModelError> {
    let prediction = model.predict(x)?;
    let dispersion = model
        .ensemble()
        .and_then(|members| ensemble_dispersion(members, x));
    Ok(Inference {
        prediction,
        dispersion,
    })
}

/// Sample standard deviation of the members' predictions on `x`.
pub fn ensemble_dispersion(members: &[DecisionTree], x: ArrayView1<f64>) -> Option<f64> {
    let predictions = match members
        .iter()
        .map(|tree| tree.predict(x))
        .collect::<Result<Array1<f64>, ModelError>>()
    {
        Ok(predictions) => predictions,
        Err(e) => {
            debug!("Skipping ensemble dispersion: {e}");
            return None;
        }
    };
    sample_std_dev(predictions.view())
}

/// Standard deviation with one degree of freedom removed. Needs at least two values.
pub fn sample_std_dev(values: ArrayView1<f64>) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let std = values.std(1.0);
    std.is_finite().then_some(std)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

//! Batch inference over a CSV file.
//!
//! Each row is treated exactly like a form submission: the header names the
//! fields, values go through the same coercion, and the same model call
//! produces the prediction and spread. Rows are evaluated in parallel.

use log::{error, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::context::ServingContext;
use crate::inference::Inference;
use crate::model::ModelError;
use crate::vector::collect_fields;

/// Placeholder written for values that could not be computed.
pub const MISSING_VALUE: &str = "NA";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read or write CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub failed: usize,
}

/// Reads rows from `input`, predicts each one and writes a TSV with the
/// columns `row`, `prediction`, `dispersion` to `output`.
pub fn infer_csv(
    context: &ServingContext,
    input: &Path,
    output: &Path,
) -> Result<BatchSummary, BatchError> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();

    let present: HashSet<&str> = headers.iter().collect();
    let absent: Vec<&str> = context
        .schema()
        .names()
        .filter(|name| !present.contains(name))
        .collect();
    if !absent.is_empty() {
        warn!(
            "Input is missing {} feature column(s), which will be treated as 0: {}",
            absent.len(),
            absent.join(", ")
        );
    }

    let rows = reader
        .records()
        .map(|record| {
            record.map(|record| {
                collect_fields(
                    headers
                        .iter()
                        .zip(record.iter())
                        .map(|(name, value)| (name.to_string(), value.to_string())),
                )
            })
        })
        .collect::<Result<Vec<_>, csv::Error>>()?;
    info!("Loaded {} rows for prediction", rows.len());

    let outcomes: Vec<Result<Inference, ModelError>> = rows
        .par_iter()
        .map(|fields| context.predict(fields))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(output)?;
    writer.write_record(["row", "prediction", "dispersion"])?;

    let mut failed = 0;
    for (index, outcome) in outcomes.iter().enumerate() {
        let row_id = (index + 1).to_string();
        match outcome {
            Ok(inference) => {
                let dispersion = inference
                    .dispersion
                    .map_or_else(|| MISSING_VALUE.to_string(), |value| format!("{value:.6}"));
                writer.write_record([
                    row_id,
                    format!("{:.6}", inference.prediction),
                    dispersion,
                ])?;
            }
            Err(e) => {
                error!("Row {row_id}: prediction failed: {e}");
                failed += 1;
                writer.write_record([
                    row_id,
                    MISSING_VALUE.to_string(),
                    MISSING_VALUE.to_string(),
                ])?;
            }
        }
    }
    writer.flush()?;

    Ok(BatchSummary {
        rows: outcomes.len(),
        failed,
    })
}

//! Equipment telemetry loader.
//!
//! Reads the sensor CSV straight into [`SensorRecord`] rows. No validation
//! happens here beyond what deserialization forces; timestamp parseability is
//! checked downstream by the transform stage, which drops bad rows.

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::models::SensorRecord;

// ---

/// Load all telemetry rows from the delimited file at `path`.
///
/// Fails with [`PipelineError::InputNotFound`] when the path does not exist.
/// Extra columns beyond {timestamp, equipment_id, status, fuel_consumption}
/// are ignored.
pub fn load_sensor_csv(path: &Path) -> Result<Vec<SensorRecord>> {
    // ---
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }

    tracing::info!(
        "Loaded {} sensor records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

//! Error taxonomy for the `minemetrics` pipeline.
//!
//! Each stage of the pipeline reports failure through [`PipelineError`] so the
//! caller (and any scheduler driving the binary) can distinguish an
//! empty-but-valid run from a failed one. Weather-fetch failures are
//! deliberately absent here: rainfall is best-effort enrichment and degrades
//! to zero inside `weather.rs` instead of aborting the run.

use std::path::PathBuf;

use thiserror::Error;

// ---

/// All fatal errors produced by the ETL pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A source file path does not exist. Raised before any network or
    /// destination I/O is attempted.
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The production dump contained a tuple or literal the strict grammar
    /// rejects. Fatal for the whole run; no partial output is produced.
    #[error("malformed production dump: {0}")]
    Parse(String),

    /// The sensor telemetry file could not be read as a delimited table.
    #[error("sensor telemetry read failed: {0}")]
    SensorRead(#[from] csv::Error),

    /// A source file could not be read from disk.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The destination sink rejected the connect/insert/close sequence.
    #[error("destination sink failure: {0}")]
    Sink(#[source] anyhow::Error),
}

/// Convenience alias used throughout the pipeline modules.
pub type Result<T> = std::result::Result<T, PipelineError>;

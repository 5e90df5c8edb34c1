//! Command-line surface for the `minemetrics` binary.
//!
//! One subcommand per registered use case; clap handles usage errors and
//! unknown subcommands with a non-zero exit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// ---

#[derive(Debug, Parser)]
#[command(name = "minemetrics", version, about = "Daily mine production metrics ETL")]
pub struct Cli {
    // ---
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recompute daily production metrics over the full input range and load
    /// them into the destination store
    EtlProduction {
        /// Path to the production-log SQL dump
        production_dump: PathBuf,

        /// Path to the equipment telemetry CSV
        sensors_csv: PathBuf,
    },
}

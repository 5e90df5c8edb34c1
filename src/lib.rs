//! `minemetrics` – daily per-mine production metrics ETL.
//!
//! The pipeline combines three heterogeneous sources into one denormalized
//! metrics row per (date, mine):
//! - a production-log SQL dump ([`log_parser`])
//! - equipment telemetry CSV ([`sensor_loader`])
//! - daily site weather fetched over HTTP ([`weather`])
//!
//! [`aggregate`] is the transform stage; [`pipeline`] sequences the stages
//! and hands the result to a [`sink::MetricsSink`]. The binary in `main.rs`
//! only wires configuration, logging, and the CLI around this crate.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod log_parser;
pub mod models;
pub mod pipeline;
pub mod sensor_loader;
pub mod sink;
pub mod weather;

// Re-exported so the binary and integration tests only need to know the
// gateway, not the module layout behind it.
pub use config::{Config, WeatherConfig};
pub use error::PipelineError;
pub use models::{DailyMetric, ProductionRecord, SensorRecord, WeatherRecord};
pub use pipeline::Pipeline;
pub use sink::{create_sink, MetricsSink, PostgresSink};
pub use weather::WeatherClient;

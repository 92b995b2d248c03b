//! quantbar runner: run configuration, CSV ingestion and export, pipeline orchestration.
//!
//! This crate builds on `quantbar-core` to provide:
//! - A TOML run configuration with tagged indicator and signal entries
//! - CSV loading with configurable handling of incomplete rows
//! - The pipeline that applies indicators then at most one rule per family
//! - CSV export of bars, position tags and every derived field

pub mod config;
pub mod data_loader;
pub mod export;
pub mod pipeline;

pub use config::{ConfigError, IndicatorConfig, RunConfig, RunId, SignalConfig};
pub use data_loader::{load_csv, read_series, LoadError, LoadOptions, LoadReport};
pub use export::{
    export_binary, export_columns, export_csv, read_binary, write_binary, write_csv,
};
pub use pipeline::{run_file, run_pipeline, PipelineError, PipelineSummary, RuleSummary};

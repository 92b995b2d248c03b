//! Pipeline: load, compute indicators, apply rules, export.
//!
//! Two entry points:
//! - `run_pipeline()`: runs a config against a series the caller already holds.
//! - `run_file()`: loads `config.input`, runs the pipeline, writes `config.output`
//!   (and `<output>.bin` when `config.binary` is set).

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use quantbar_core::signals::{PositionCounts, SignalFamily};
use quantbar_core::{Position, Series};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{load_csv, LoadError, LoadOptions, LoadReport};
use crate::export::{export_binary, export_csv};

/// Errors from the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("no data loaded from {}", .0.display())]
    NoData(PathBuf),
    #[error(transparent)]
    Export(#[from] anyhow::Error),
}

/// What one rule produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSummary {
    pub name: String,
    pub family: SignalFamily,
    pub output: String,
    /// False when the rule declined to run (degenerate parameters).
    pub written: bool,
    pub counts: PositionCounts,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub run_id: RunId,
    pub bars: usize,
    /// Every derived field on the series afterwards, sorted by name.
    pub fields: Vec<String>,
    pub rules: Vec<RuleSummary>,
}

/// Apply `config` to `series`: indicators in order, then the trend rule,
/// then the mean-reversion rule.
pub fn run_pipeline(series: &mut Series, config: &RunConfig) -> Result<PipelineSummary, PipelineError> {
    config.validate()?;

    for entry in &config.indicators {
        debug!(?entry, "computing indicator");
        entry.build().apply(series);
    }

    let mut rules = Vec::new();
    for entry in config.rules() {
        let rule = entry.build();
        debug!(rule = rule.name(), output = %rule.output(), "applying rule");
        rule.apply(series);

        let values = series.field(rule.output());
        let counts = values
            .map(|values| {
                PositionCounts::tally(
                    values
                        .iter()
                        .map(|&v| Position::try_from(v as i8).unwrap_or_default()),
                )
            })
            .unwrap_or_default();
        rules.push(RuleSummary {
            name: rule.name().to_string(),
            family: rule.family(),
            output: rule.output().to_string(),
            written: values.is_some(),
            counts,
        });
    }

    let mut fields: Vec<String> = series.field_keys().map(ToString::to_string).collect();
    fields.sort();

    Ok(PipelineSummary {
        run_id: config.run_id(),
        bars: series.len(),
        fields,
        rules,
    })
}

/// Load `config.input`, run the pipeline, and write `config.output`.
pub fn run_file(config: &RunConfig) -> Result<(LoadReport, PipelineSummary), PipelineError> {
    config.validate()?;

    let opts = LoadOptions {
        delimiter: config.delimiter as u8,
        keep_na: config.keep_na,
    };
    let (mut series, report) = load_csv(&config.input, &opts)?;
    if series.is_empty() {
        return Err(PipelineError::NoData(config.input.clone()));
    }

    let summary = run_pipeline(&mut series, config)?;
    for rule in &summary.rules {
        info!(
            rule = %rule.name,
            output = %rule.output,
            long = rule.counts.long,
            short = rule.counts.short,
            flat = rule.counts.flat,
            "signal generated"
        );
    }

    export_csv(&config.output, &series)?;
    if config.binary {
        export_binary(&config.binary_path(), &series)?;
    }
    Ok((report, summary))
}

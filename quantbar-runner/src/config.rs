//! Serializable run configuration.
//!
//! A run reads one CSV file, applies a list of indicators in order, then at
//! most one trend rule and at most one mean-reversion rule, and writes one
//! CSV file. The TOML form looks like:
//!
//! ```toml
//! input = "data/spy.csv"
//! output = "out/spy_signals.csv"
//!
//! [[indicators]]
//! type = "SMA"
//! window = 20
//!
//! [trend]
//! type = "MA_CROSSOVER"
//! fast = 10
//! slow = 50
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantbar_core::indicators::{
    Ema, Indicator, RollingStats, RollingSum, Sma, Volatility, ZScore, TRADING_DAYS_PER_YEAR,
};
use quantbar_core::signals::{
    BandBreakout, MaCrossover, RocMomentum, SignalFamily, SignalRule, ZScoreReversion,
    DEFAULT_BREAKOUT_OUTPUT, DEFAULT_CROSSOVER_OUTPUT, DEFAULT_MOMENTUM_OUTPUT,
    DEFAULT_REVERSION_OUTPUT,
};
use quantbar_core::{Column, FieldKey};

/// Content hash of a run configuration.
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{rule} is a {actual:?} rule and cannot fill the {slot:?} slot")]
    WrongFamily {
        rule: &'static str,
        slot: SignalFamily,
        actual: SignalFamily,
    },

    #[error("{0} path is empty")]
    EmptyPath(&'static str),

    #[error("delimiter {0:?} is not a single-byte character")]
    Delimiter(char),
}

/// Everything needed to reproduce one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Source CSV.
    pub input: PathBuf,

    /// Destination CSV.
    pub output: PathBuf,

    /// Keep incomplete rows as NaN bars instead of dropping them.
    #[serde(default)]
    pub keep_na: bool,

    /// Also write `<output>.bin` in the binary export format.
    #[serde(default)]
    pub binary: bool,

    /// Field separator of the input file.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Indicators, applied in order.
    #[serde(default)]
    pub indicators: Vec<IndicatorConfig>,

    /// Trend-family rule, applied after all indicators.
    #[serde(default)]
    pub trend: Option<SignalConfig>,

    /// Mean-reversion-family rule, applied after the trend rule.
    #[serde(default)]
    pub mean_reversion: Option<SignalConfig>,
}

fn default_delimiter() -> char {
    ','
}

impl RunConfig {
    /// Minimal config: read `input`, write `output`, compute nothing.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            keep_na: false,
            binary: false,
            delimiter: default_delimiter(),
            indicators: Vec::new(),
            trend: None,
            mean_reversion: None,
        }
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check paths, delimiter and that each rule sits in its family's slot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("input"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("output"));
        }
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::Delimiter(self.delimiter));
        }
        check_slot(self.trend.as_ref(), SignalFamily::Trend)?;
        check_slot(self.mean_reversion.as_ref(), SignalFamily::MeanReversion)?;
        Ok(())
    }

    /// Path of the binary export: the output path with `.bin` appended.
    pub fn binary_path(&self) -> PathBuf {
        let mut path = self.output.clone().into_os_string();
        path.push(".bin");
        PathBuf::from(path)
    }

    /// Rules in application order: trend first, then mean reversion.
    pub fn rules(&self) -> impl Iterator<Item = &SignalConfig> {
        self.trend.iter().chain(self.mean_reversion.iter())
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Only plain data goes into the JSON, so serialization cannot fail;
        // an empty string still hashes deterministically.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn check_slot(rule: Option<&SignalConfig>, slot: SignalFamily) -> Result<(), ConfigError> {
    match rule {
        Some(rule) if rule.family() != slot => Err(ConfigError::WrongFamily {
            rule: rule.kind(),
            slot,
            actual: rule.family(),
        }),
        _ => Ok(()),
    }
}

/// One indicator entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorConfig {
    /// Simple moving average.
    Sma {
        window: usize,
        #[serde(default)]
        column: Column,
    },

    /// Rolling mean and population std.
    RollMeanStd {
        window: usize,
        #[serde(default)]
        column: Column,
    },

    /// Rolling z-score; computes the rolling mean and std as well.
    #[serde(rename = "ZSCORE")]
    ZScore {
        window: usize,
        #[serde(default)]
        column: Column,
    },

    /// Exponential moving average.
    Ema {
        window: usize,
        #[serde(default)]
        column: Column,
    },

    /// Rolling sum.
    RollSum {
        window: usize,
        #[serde(default)]
        column: Column,
    },

    /// Annualized rolling std.
    Volatility {
        window: usize,
        #[serde(default)]
        column: Column,
        #[serde(default = "default_periods_per_year")]
        periods_per_year: f64,
    },
}

fn default_periods_per_year() -> f64 {
    TRADING_DAYS_PER_YEAR
}

impl IndicatorConfig {
    pub fn build(&self) -> Box<dyn Indicator> {
        match *self {
            IndicatorConfig::Sma { window, column } => Box::new(Sma::new(window, column)),
            IndicatorConfig::RollMeanStd { window, column } => {
                Box::new(RollingStats::new(window, column))
            }
            IndicatorConfig::ZScore { window, column } => Box::new(ZScore::new(window, column)),
            IndicatorConfig::Ema { window, column } => Box::new(Ema::new(window, column)),
            IndicatorConfig::RollSum { window, column } => Box::new(RollingSum::new(window, column)),
            IndicatorConfig::Volatility {
                window,
                column,
                periods_per_year,
            } => Box::new(Volatility::new(window, column, periods_per_year)),
        }
    }

    /// Field keys written by this entry, dependencies included.
    pub fn outputs(&self) -> Vec<FieldKey> {
        match *self {
            IndicatorConfig::ZScore { window, .. } => vec![
                FieldKey::roll_mean(window),
                FieldKey::roll_std(window),
                FieldKey::zscore(window),
            ],
            IndicatorConfig::Volatility { window, .. } => vec![
                FieldKey::roll_mean(window),
                FieldKey::roll_std(window),
                FieldKey::volatility(window),
            ],
            _ => self.build().outputs(),
        }
    }
}

/// One signal rule entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalConfig {
    /// Fast/slow SMA crossover.
    MaCrossover {
        fast: usize,
        slow: usize,
        #[serde(default)]
        column: Column,
        #[serde(default = "default_crossover_output")]
        output: String,
    },

    /// Z-score mean reversion.
    ZscoreReversion {
        window: usize,
        #[serde(default = "default_entry")]
        entry: f64,
        #[serde(default = "default_exit")]
        exit: f64,
        #[serde(default)]
        column: Column,
        #[serde(default = "default_reversion_output")]
        output: String,
    },

    /// Rate-of-change momentum.
    Momentum {
        window: usize,
        upper: f64,
        lower: f64,
        #[serde(default)]
        column: Column,
        #[serde(default = "default_momentum_output")]
        output: String,
    },

    /// Volatility band breakout.
    BandBreakout {
        window: usize,
        num_std: f64,
        #[serde(default)]
        column: Column,
        #[serde(default = "default_breakout_output")]
        output: String,
    },
}

fn default_crossover_output() -> String {
    DEFAULT_CROSSOVER_OUTPUT.to_string()
}
fn default_reversion_output() -> String {
    DEFAULT_REVERSION_OUTPUT.to_string()
}
fn default_momentum_output() -> String {
    DEFAULT_MOMENTUM_OUTPUT.to_string()
}
fn default_breakout_output() -> String {
    DEFAULT_BREAKOUT_OUTPUT.to_string()
}
fn default_entry() -> f64 {
    2.0
}
fn default_exit() -> f64 {
    0.5
}

impl SignalConfig {
    /// Tag used in TOML.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalConfig::MaCrossover { .. } => "MA_CROSSOVER",
            SignalConfig::ZscoreReversion { .. } => "ZSCORE_REVERSION",
            SignalConfig::Momentum { .. } => "MOMENTUM",
            SignalConfig::BandBreakout { .. } => "BAND_BREAKOUT",
        }
    }

    pub fn family(&self) -> SignalFamily {
        match self {
            SignalConfig::ZscoreReversion { .. } => SignalFamily::MeanReversion,
            _ => SignalFamily::Trend,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            SignalConfig::MaCrossover { output, .. }
            | SignalConfig::ZscoreReversion { output, .. }
            | SignalConfig::Momentum { output, .. }
            | SignalConfig::BandBreakout { output, .. } => output,
        }
    }

    pub fn build(&self) -> Box<dyn SignalRule> {
        match self {
            SignalConfig::MaCrossover {
                fast,
                slow,
                column,
                output,
            } => Box::new(MaCrossover::new(*fast, *slow, output).with_column(*column)),
            SignalConfig::ZscoreReversion {
                window,
                entry,
                exit,
                column,
                output,
            } => Box::new(
                ZScoreReversion::new(*window, *entry, *exit, output).with_column(*column),
            ),
            SignalConfig::Momentum {
                window,
                upper,
                lower,
                column,
                output,
            } => Box::new(RocMomentum::new(*window, *upper, *lower, *column, output)),
            SignalConfig::BandBreakout {
                window,
                num_std,
                column,
                output,
            } => Box::new(BandBreakout::new(*window, *num_std, *column, output)),
        }
    }
}

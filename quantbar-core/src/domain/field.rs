//! Deterministic field keys for derived values.
//!
//! A key is built from a kind tag and a window, so the same request always
//! maps to the same storage slot. That is what makes recomputation
//! idempotent and lets dependency resolution find earlier results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind tag of an indicator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorKind {
    Sma,
    RollMean,
    RollStd,
    ZScore,
    Ema,
    RollSum,
    Volatility,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 7] = [
        IndicatorKind::Sma,
        IndicatorKind::RollMean,
        IndicatorKind::RollStd,
        IndicatorKind::ZScore,
        IndicatorKind::Ema,
        IndicatorKind::RollSum,
        IndicatorKind::Volatility,
    ];

    /// Prefix of the rendered key, e.g. `SMA` in `SMA_20`.
    pub fn prefix(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::RollMean => "ROLL_MEAN",
            IndicatorKind::RollStd => "ROLL_STD",
            IndicatorKind::ZScore => "Z",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::RollSum => "ROLL_SUM",
            IndicatorKind::Volatility => "VOL",
        }
    }
}

/// Name of a per-bar field stored on a [`Series`](super::Series).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKey {
    /// Output of an indicator, rendered `<PREFIX>_<window>`.
    Indicator { kind: IndicatorKind, window: usize },
    /// Output of a signal rule under a caller-chosen name.
    Signal(String),
}

impl FieldKey {
    pub fn indicator(kind: IndicatorKind, window: usize) -> Self {
        FieldKey::Indicator { kind, window }
    }

    pub fn signal(name: impl Into<String>) -> Self {
        FieldKey::Signal(name.into())
    }

    pub fn sma(window: usize) -> Self {
        Self::indicator(IndicatorKind::Sma, window)
    }

    pub fn roll_mean(window: usize) -> Self {
        Self::indicator(IndicatorKind::RollMean, window)
    }

    pub fn roll_std(window: usize) -> Self {
        Self::indicator(IndicatorKind::RollStd, window)
    }

    pub fn zscore(window: usize) -> Self {
        Self::indicator(IndicatorKind::ZScore, window)
    }

    pub fn ema(window: usize) -> Self {
        Self::indicator(IndicatorKind::Ema, window)
    }

    pub fn roll_sum(window: usize) -> Self {
        Self::indicator(IndicatorKind::RollSum, window)
    }

    pub fn volatility(window: usize) -> Self {
        Self::indicator(IndicatorKind::Volatility, window)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Indicator { kind, window } => write!(f, "{}_{window}", kind.prefix()),
            FieldKey::Signal(name) => f.write_str(name),
        }
    }
}

impl FromStr for FieldKey {
    type Err = std::convert::Infallible;

    /// Parses a rendered name. Anything that is not `<PREFIX>_<window>` for a
    /// known prefix is a signal name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s.rsplit_once('_').and_then(|(prefix, window)| {
            let kind = IndicatorKind::ALL
                .into_iter()
                .find(|k| k.prefix() == prefix)?;
            let window = window.parse::<usize>().ok()?;
            Some(FieldKey::Indicator { kind, window })
        });
        Ok(parsed.unwrap_or_else(|| FieldKey::Signal(s.to_string())))
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(key) => key,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        FieldKey::from(value.to_string())
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}

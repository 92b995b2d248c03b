//! Signal engine: rules that turn indicator fields into a position per bar.
//!
//! Each rule makes one left-to-right pass over the series, carrying at most a
//! [`Position`] (and for crossovers the previous bar's averages) as working
//! state. The result is written twice: as a named field holding -1/0/+1 and
//! as every bar's position tag, so the tag always reflects the last rule run.
//!
//! Stateful rules expose their step logic as plain `transition` functions so
//! the hysteresis and dead-zone behavior can be tested as tables.

pub mod band_breakout;
pub mod crossover;
pub mod mean_reversion;
pub mod momentum;

pub use band_breakout::BandBreakout;
pub use crossover::{CrossEvent, MaCrossover};
pub use mean_reversion::ZScoreReversion;
pub use momentum::RocMomentum;

use serde::{Deserialize, Serialize};

use crate::domain::{Column, FieldKey, Position, Series};

pub const DEFAULT_CROSSOVER_OUTPUT: &str = "signal_sma";
pub const DEFAULT_REVERSION_OUTPUT: &str = "signal_z";
pub const DEFAULT_MOMENTUM_OUTPUT: &str = "signal_momentum";
pub const DEFAULT_BREAKOUT_OUTPUT: &str = "signal_bb";

/// Which slot of a run a rule occupies. A run applies at most one rule per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalFamily {
    Trend,
    MeanReversion,
}

/// Trait for signal rules.
pub trait SignalRule {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    fn family(&self) -> SignalFamily;

    /// Field the rule writes its -1/0/+1 output to.
    fn output(&self) -> &FieldKey;

    /// Run the rule over the whole series.
    fn apply(&self, series: &mut Series);
}

/// Moving-average crossover on close. See [`MaCrossover`].
pub fn ma_crossover(series: &mut Series, fast: usize, slow: usize, output: &str) {
    MaCrossover::new(fast, slow, output).apply(series);
}

/// Z-score mean reversion on close. See [`ZScoreReversion`].
pub fn zscore_reversion(series: &mut Series, window: usize, entry: f64, exit: f64, output: &str) {
    ZScoreReversion::new(window, entry, exit, output).apply(series);
}

/// Rate-of-change momentum. See [`RocMomentum`].
pub fn momentum(
    series: &mut Series,
    window: usize,
    upper: f64,
    lower: f64,
    column: Column,
    output: &str,
) {
    RocMomentum::new(window, upper, lower, column, output).apply(series);
}

/// Volatility band breakout. See [`BandBreakout`].
pub fn band_breakout(series: &mut Series, window: usize, num_std: f64, column: Column, output: &str) {
    BandBreakout::new(window, num_std, column, output).apply(series);
}

/// Count of bars per position, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCounts {
    pub long: usize,
    pub short: usize,
    pub flat: usize,
}

impl PositionCounts {
    pub fn tally(positions: impl IntoIterator<Item = Position>) -> Self {
        positions
            .into_iter()
            .fold(Self::default(), |mut counts, position| {
                match position {
                    Position::Long => counts.long += 1,
                    Position::Short => counts.short += 1,
                    Position::Flat => counts.flat += 1,
                }
                counts
            })
    }
}

/// Test helper: the -1/0/+1 values a rule wrote.
#[cfg(test)]
pub(crate) fn signal_values(series: &Series, output: &str) -> Vec<i8> {
    series
        .field(&FieldKey::signal(output))
        .expect("signal field written")
        .iter()
        .map(|&v| v as i8)
        .collect()
}

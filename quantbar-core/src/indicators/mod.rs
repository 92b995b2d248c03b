//! Indicator engine.
//!
//! Every indicator reads one source [`Column`] across the whole series and
//! attaches one or more dense fields under deterministic [`FieldKey`]s. All
//! passes are O(n) with O(window) scratch space, idempotent, and no-ops on an
//! empty series or a zero window.
//!
//! Indicators that build on others (z-score, volatility) go through
//! [`resolve`], which reuses a dependency only when it was computed from the
//! same source column and otherwise materializes it first.

pub mod ema;
pub mod rolling_stats;
pub mod rolling_sum;
pub mod sma;
pub mod volatility;
pub mod window;
pub mod zscore;

pub use ema::Ema;
pub use rolling_stats::RollingStats;
pub use rolling_sum::RollingSum;
pub use sma::Sma;
pub use volatility::{Volatility, TRADING_DAYS_PER_YEAR};
pub use window::RollingWindow;
pub use zscore::{ZScore, MIN_STD};

use tracing::debug;

use crate::domain::{Column, FieldKey, Series};

/// A derived per-bar computation over one source column.
pub trait Indicator {
    /// Keys written by [`apply`](Indicator::apply).
    fn outputs(&self) -> Vec<FieldKey>;

    /// Column the indicator reads.
    fn source(&self) -> Column;

    /// Number of bars aggregated per value.
    fn window(&self) -> usize;

    /// Compute over the whole series and attach every output.
    fn apply(&self, series: &mut Series);
}

/// Return the values stored under `key`, running `indicator` first when the
/// key is missing or was computed from a different source column.
///
/// `None` means the indicator declined to write (degenerate parameters).
pub fn resolve<'s>(
    series: &'s mut Series,
    indicator: &dyn Indicator,
    key: &FieldKey,
) -> Option<&'s [f64]> {
    if !series.is_materialized(key, indicator.source()) {
        debug!(field = %key, source = %indicator.source(), "materializing dependency");
        indicator.apply(series);
    }
    series.field(key)
}

/// Shared guard for the degenerate cases every indicator treats as a no-op.
pub(crate) fn is_degenerate(series: &Series, window: usize, name: &str) -> bool {
    if series.is_empty() || window == 0 {
        debug!(indicator = name, window, len = series.len(), "skipping degenerate indicator");
        return true;
    }
    false
}

/// Moving average of `column` over `window` bars. Key `SMA_<window>`.
pub fn add_sma(series: &mut Series, window: usize, column: Column) {
    Sma::new(window, column).apply(series);
}

/// Rolling mean and population standard deviation. Keys `ROLL_MEAN_<window>`
/// and `ROLL_STD_<window>`.
pub fn add_roll_mean_std(series: &mut Series, window: usize, column: Column) {
    RollingStats::new(window, column).apply(series);
}

/// Rolling z-score. Key `Z_<window>`.
pub fn add_zscore(series: &mut Series, window: usize, column: Column) {
    ZScore::new(window, column).apply(series);
}

/// Exponential moving average seeded with the first value. Key `EMA_<window>`.
pub fn add_ema(series: &mut Series, window: usize, column: Column) {
    Ema::new(window, column).apply(series);
}

/// Rolling sum. Key `ROLL_SUM_<window>`.
pub fn add_roll_sum(series: &mut Series, window: usize, column: Column) {
    RollingSum::new(window, column).apply(series);
}

/// Rolling standard deviation scaled by `sqrt(periods_per_year)`. Key `VOL_<window>`.
pub fn add_volatility(series: &mut Series, window: usize, column: Column, periods_per_year: f64) {
    Volatility::new(window, column, periods_per_year).apply(series);
}

/// Build a series from close prices for testing.
///
/// open = close, high = close + 1, low = close - 1, volume = 1_000_000.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> Series {
    use crate::domain::Bar;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            Bar::new(
                format!("2020-01-{:02}", i + 1),
                close,
                close + 1.0,
                close - 1.0,
                close,
                close,
                1_000_000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

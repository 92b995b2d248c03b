//! Volatility band breakout.
//!
//! Bands sit `num_std` rolling deviations either side of the rolling mean.
//! A close above the upper band goes long, below the lower band goes short,
//! and a move back inside the bands (edges included) flattens.

use tracing::debug;

use super::{SignalFamily, SignalRule};
use crate::domain::{Column, FieldKey, Position, Series};
use crate::indicators::{resolve, Indicator, RollingStats};

/// Upper and lower band for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
}

impl Band {
    /// `None` while the mean or deviation is still NaN.
    pub fn around(mean: f64, std: f64, num_std: f64) -> Option<Self> {
        if mean.is_nan() || std.is_nan() {
            return None;
        }
        Some(Self {
            lower: mean - num_std * std,
            upper: mean + num_std * std,
        })
    }
}

pub fn transition(position: Position, price: f64, band: Band) -> Position {
    if price > band.upper {
        Position::Long
    } else if price < band.lower {
        Position::Short
    } else if price >= band.lower && price <= band.upper {
        Position::Flat
    } else {
        // NaN price
        position
    }
}

#[derive(Debug, Clone)]
pub struct BandBreakout {
    pub window: usize,
    pub num_std: f64,
    pub column: Column,
    output: FieldKey,
}

impl BandBreakout {
    pub fn new(window: usize, num_std: f64, column: Column, output: &str) -> Self {
        Self {
            window,
            num_std,
            column,
            output: FieldKey::signal(output),
        }
    }

    fn positions(&self, prices: &[f64], mean: &[f64], std: &[f64]) -> Vec<Position> {
        let mut carried = Position::Flat;
        prices
            .iter()
            .zip(mean)
            .zip(std)
            .map(|((&price, &m), &sd)| match Band::around(m, sd, self.num_std) {
                Some(band) => {
                    carried = transition(carried, price, band);
                    carried
                }
                None => Position::Flat,
            })
            .collect()
    }
}

impl SignalRule for BandBreakout {
    fn name(&self) -> &str {
        "band_breakout"
    }

    fn family(&self) -> SignalFamily {
        SignalFamily::Trend
    }

    fn output(&self) -> &FieldKey {
        &self.output
    }

    fn apply(&self, series: &mut Series) {
        if series.is_empty() {
            return;
        }
        let stats = RollingStats::new(self.window, self.column);
        resolve(series, &stats, &stats.mean_key());

        let prices = series.column(self.column);
        let positions = match (series.field(&stats.mean_key()), series.field(&stats.std_key())) {
            (Some(mean), Some(std)) => self.positions(&prices, mean, std),
            _ => {
                debug!(window = stats.window(), "no rolling stats available, writing flat signal");
                vec![Position::Flat; prices.len()]
            }
        };
        series.record_positions(self.output.clone(), &positions);
    }
}

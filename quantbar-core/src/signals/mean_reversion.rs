//! Z-score mean reversion.
//!
//! Goes long when the z-score drops below `-entry`, short when it rises above
//! `entry`, and flattens once `|z|` falls under `exit`. Between `exit` and
//! `entry` the current stance is held.
//!
//! A bar with no z-score (warm-up, zero deviation) emits flat but leaves the
//! carried position alone, so the next finite z-score continues from it.

use tracing::debug;

use super::{SignalFamily, SignalRule};
use crate::domain::{Column, FieldKey, Position, Series};
use crate::indicators::{resolve, ZScore};

/// One step of the reversion state machine for a finite `z`.
pub fn transition(position: Position, z: f64, entry: f64, exit: f64) -> Position {
    if z < -entry {
        Position::Long
    } else if z > entry {
        Position::Short
    } else if z.abs() < exit {
        Position::Flat
    } else {
        position
    }
}

/// Z-score reversion rule, over close prices unless told otherwise.
///
/// # Indicator dependencies
/// `Z_<window>` on the rule's column, computed if missing.
#[derive(Debug, Clone)]
pub struct ZScoreReversion {
    pub window: usize,
    pub entry: f64,
    pub exit: f64,
    pub column: Column,
    output: FieldKey,
}

impl ZScoreReversion {
    pub fn new(window: usize, entry: f64, exit: f64, output: &str) -> Self {
        Self {
            window,
            entry,
            exit,
            column: Column::Close,
            output: FieldKey::signal(output),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.column = column;
        self
    }

    fn positions(&self, z: &[f64]) -> Vec<Position> {
        let mut carried = Position::Flat;
        z.iter()
            .map(|&z| {
                if z.is_nan() {
                    return Position::Flat;
                }
                carried = transition(carried, z, self.entry, self.exit);
                carried
            })
            .collect()
    }
}

impl SignalRule for ZScoreReversion {
    fn name(&self) -> &str {
        "zscore_reversion"
    }

    fn family(&self) -> SignalFamily {
        SignalFamily::MeanReversion
    }

    fn output(&self) -> &FieldKey {
        &self.output
    }

    fn apply(&self, series: &mut Series) {
        if series.is_empty() {
            return;
        }
        let len = series.len();
        let zscore = ZScore::new(self.window, self.column);
        let positions = match resolve(series, &zscore, &zscore.key()) {
            Some(z) => self.positions(z),
            None => {
                debug!(window = self.window, "no z-score available, writing flat signal");
                vec![Position::Flat; len]
            }
        };
        series.record_positions(self.output.clone(), &positions);
    }
}

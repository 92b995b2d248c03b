//! One time step of OHLCV data.

use serde::{Deserialize, Serialize};

use super::{Column, Position};

/// OHLCV bar plus the position tag written by the last signal rule.
///
/// The date is an opaque label; bars are kept in input order and never
/// re-sorted. Derived indicator values live on the owning
/// [`Series`](super::Series) and are read through [`BarView`](super::BarView).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
    #[serde(default)]
    pub position: Position,
}

impl Bar {
    pub fn new(
        date: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adj_close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date: date.into(),
            open,
            high,
            low,
            close,
            adj_close,
            volume,
            position: Position::Flat,
        }
    }

    /// A bar whose date is kept but every numeric field is NaN.
    ///
    /// Produced by ingestion when a malformed row is retained.
    pub fn void(date: impl Into<String>) -> Self {
        Self::new(
            date,
            f64::NAN,
            f64::NAN,
            f64::NAN,
            f64::NAN,
            f64::NAN,
            f64::NAN,
        )
    }

    /// Read one source column.
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::Open => self.open,
            Column::High => self.high,
            Column::Low => self.low,
            Column::Close => self.close,
            Column::AdjClose => self.adj_close,
            Column::Volume => self.volume,
        }
    }

    /// Returns true if any numeric field is NaN.
    pub fn is_void(&self) -> bool {
        Column::ALL.iter().any(|&c| self.value(c).is_nan())
    }
}

//! Error type for the core crate.

use thiserror::Error;

/// Failures surfaced by the core.
///
/// Degenerate parameters (empty series, zero window, fast >= slow) are not
/// errors: the affected call returns without touching the series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid column: '{0}' (expected one of open, high, low, close, adj_close, volume)")]
    InvalidColumn(String),

    #[error("bar index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

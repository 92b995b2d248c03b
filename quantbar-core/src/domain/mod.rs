//! Domain types for quantbar.

pub mod bar;
pub mod column;
pub mod field;
pub mod position;
pub mod series;

pub use bar::Bar;
pub use column::Column;
pub use field::{FieldKey, IndicatorKind};
pub use position::Position;
pub use series::{BarView, Series};

//! The ordered bar container and its derived-field store.
//!
//! Derived values are kept as dense columns, one `Vec<f64>` per [`FieldKey`],
//! each exactly as long as the bar list. A column also remembers which source
//! [`Column`] it was computed from; dependency resolution uses that to decide
//! whether an existing column can be reused.

use std::collections::BTreeMap;
use std::ops::Index;

use crate::error::CoreError;

use super::{Bar, Column, FieldKey, Position};

#[derive(Debug, Clone, PartialEq)]
struct Field {
    source: Option<Column>,
    values: Vec<f64>,
}

/// Ordered bars plus named per-bar fields.
///
/// Bars are appended during construction and never removed or reordered.
/// Fields are append-only by name: a later computation may overwrite a
/// column, but nothing removes one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
    fields: BTreeMap<FieldKey, Field>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bars: Vec::with_capacity(capacity),
            fields: BTreeMap::new(),
        }
    }

    /// Append a bar. Existing fields are extended with NaN for it.
    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
        for field in self.fields.values_mut() {
            field.values.push(f64::NAN);
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Checked bar access.
    pub fn get(&self, index: usize) -> Result<&Bar, CoreError> {
        self.bars.get(index).ok_or(CoreError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    /// Checked access to a bar together with its derived fields.
    pub fn bar(&self, index: usize) -> Result<BarView<'_>, CoreError> {
        let bar = self.get(index)?;
        Ok(BarView {
            series: self,
            index,
            bar,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = BarView<'_>> + '_ {
        self.bars
            .iter()
            .enumerate()
            .map(move |(index, bar)| BarView {
                series: self,
                index,
                bar,
            })
    }

    /// Values of one source column across all bars.
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.bars.iter().map(|b| b.value(column)).collect()
    }

    /// Values of a derived field, if it has been written.
    pub fn field(&self, key: &FieldKey) -> Option<&[f64]> {
        self.fields.get(key).map(|f| f.values.as_slice())
    }

    /// Source column a derived field was computed from.
    ///
    /// `None` when the field is absent or was derived from other fields only
    /// (signal outputs).
    pub fn field_source(&self, key: &FieldKey) -> Option<Column> {
        self.fields.get(key).and_then(|f| f.source)
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.fields.contains_key(key)
    }

    /// True when `key` exists and was computed from `source`.
    pub fn is_materialized(&self, key: &FieldKey, source: Column) -> bool {
        self.field_source(key) == Some(source)
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &FieldKey> + '_ {
        self.fields.keys()
    }

    /// Checked read of a single field value.
    ///
    /// `Ok(None)` means the field has never been written.
    pub fn value(&self, index: usize, key: &FieldKey) -> Result<Option<f64>, CoreError> {
        self.get(index)?;
        Ok(self.field(key).map(|values| values[index]))
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.bars.iter().map(|b| b.position)
    }

    /// Write a full column of values for `key`.
    pub(crate) fn attach(&mut self, key: FieldKey, source: Option<Column>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.bars.len());
        self.fields.insert(key, Field { source, values });
    }

    /// Write a rule result: the named field and every bar's position tag.
    pub(crate) fn record_positions(&mut self, key: FieldKey, positions: &[Position]) {
        debug_assert_eq!(positions.len(), self.bars.len());
        for (bar, &position) in self.bars.iter_mut().zip(positions) {
            bar.position = position;
        }
        let values = positions.iter().map(|p| p.as_f64()).collect();
        self.attach(key, None, values);
    }
}

impl Index<usize> for Series {
    type Output = Bar;

    /// Unchecked-by-contract access; out-of-range indices are a programmer
    /// error and panic. Use [`Series::get`] for a `Result`.
    fn index(&self, index: usize) -> &Bar {
        &self.bars[index]
    }
}

impl FromIterator<Bar> for Series {
    fn from_iter<I: IntoIterator<Item = Bar>>(iter: I) -> Self {
        Self {
            bars: iter.into_iter().collect(),
            fields: BTreeMap::new(),
        }
    }
}

impl Extend<Bar> for Series {
    fn extend<I: IntoIterator<Item = Bar>>(&mut self, iter: I) {
        for bar in iter {
            self.push(bar);
        }
    }
}

/// A bar seen together with its derived fields.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    series: &'a Series,
    index: usize,
    bar: &'a Bar,
}

impl<'a> BarView<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bar(&self) -> &'a Bar {
        self.bar
    }

    pub fn position(&self) -> Position {
        self.bar.position
    }

    /// Value of a derived field on this bar, if the field exists.
    pub fn indicator(&self, key: &FieldKey) -> Option<f64> {
        self.series.field(key).map(|values| values[self.index])
    }

    /// All derived fields on this bar in key order.
    pub fn indicators(&self) -> impl Iterator<Item = (&'a FieldKey, f64)> + 'a {
        let index = self.index;
        let series = self.series;
        series
            .fields
            .iter()
            .map(move |(key, field)| (key, field.values[index]))
    }
}

impl std::ops::Deref for BarView<'_> {
    type Target = Bar;

    fn deref(&self) -> &Bar {
        self.bar
    }
}

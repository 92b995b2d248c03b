//! Source columns an indicator can read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the six numeric fields of a [`Bar`](super::Bar).
///
/// Names are resolved through [`FromStr`]; unknown names fail with
/// [`CoreError::InvalidColumn`], including when deserialized from config.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Column {
    Open,
    High,
    Low,
    #[default]
    Close,
    AdjClose,
    Volume,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::AdjClose,
        Column::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::AdjClose => "adj_close",
            Column::Volume => "volume",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidColumn(s.to_string()))
    }
}

impl TryFrom<String> for Column {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Column> for String {
    fn from(column: Column) -> Self {
        column.as_str().to_string()
    }
}

//! The discrete stance a signal rule emits per bar.

use serde::{Deserialize, Serialize};

/// Short / flat / long, tagged on the wire as -1 / 0 / +1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Position {
    Short,
    #[default]
    Flat,
    Long,
}

impl Position {
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl From<Position> for i8 {
    fn from(position: Position) -> Self {
        position.as_i8()
    }
}

impl TryFrom<i8> for Position {
    type Error = String;

    fn try_from(tag: i8) -> Result<Self, Self::Error> {
        match tag {
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            1 => Ok(Position::Long),
            other => Err(format!("position tag must be -1, 0 or 1, got {other}")),
        }
    }
}

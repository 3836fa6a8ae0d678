//! Errors raised by the tile coordinate system.

use std::fmt;

/// Invalid input handed to a tile coordinate operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TileError {
    /// An ancestor was requested at a finer level than the tile itself.
    InvalidLevel { lod: u8, requested: i32 },

    /// A quadkey contained a character other than `0`, `1`, `2` or `3`.
    InvalidQuadKeyDigit { digit: char, position: usize },

    /// A quadkey encodes more levels than a tile index can hold.
    QuadKeyTooLong(usize),
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileError::InvalidLevel { lod, requested } => write!(
                f,
                "cannot look up an ancestor at level {} of a tile at level {}",
                requested, lod
            ),
            TileError::InvalidQuadKeyDigit { digit, position } => write!(
                f,
                "invalid quadkey digit {:?} at position {}",
                digit, position
            ),
            TileError::QuadKeyTooLong(len) => {
                write!(f, "quadkey of length {} exceeds the deepest level", len)
            }
        }
    }
}

impl std::error::Error for TileError {}

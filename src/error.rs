//! Engine errors. Every variant is a bad argument from the caller; play itself never fails.

use thiserror::Error;

use crate::board::{MAX_SIZE, MAX_VALUE, MIN_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unknown direction {0:?} (expected up, down, left or right)")]
    InvalidDirection(String),
    #[error("grid size {0} out of range ({min}..={max})", min = MIN_SIZE, max = MAX_SIZE)]
    InvalidSize(usize),
    #[error("tile value {0} is not a power of two in 2..={max}", max = MAX_VALUE)]
    InvalidValue(u32),
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: usize, y: usize },
    #[error("cell ({x}, {y}) already holds a tile")]
    Occupied { x: usize, y: usize },
}

impl BoardError {
    /// All engine errors are invalid-argument errors; adapters use this to tell them apart from
    /// their own failures.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidDirection(_)
            | Self::InvalidSize(_)
            | Self::InvalidValue(_)
            | Self::OutOfBounds { .. }
            | Self::Occupied { .. } => true,
        }
    }
}

//! Board engine for a 2048-style sliding tile puzzle: tiles, moves, merges, spawns and score.
//! No I/O; renderers read [`Snapshot`]s and feed [`Direction`]s back in.

pub mod board;
pub mod direction;
pub mod error;
pub mod random;
pub mod tile;

pub use board::{Board, DEFAULT_SIZE, MAX_SIZE, MAX_VALUE, MIN_SIZE, MoveOutcome, Snapshot};
pub use direction::Direction;
pub use error::BoardError;
pub use random::{RandomSource, ScriptedSource};
pub use tile::Tile;

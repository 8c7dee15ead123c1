//! Board state: tiles, score, and the move/merge/spawn rules.
//!
//! Every direction is handled by rotating the whole board so that direction points up, running
//! one "move up" pass, and rotating back.

use log::{debug, info};

use crate::direction::Direction;
use crate::error::BoardError;
use crate::random::RandomSource;
use crate::tile::Tile;

/// Smallest grid that can hold the two opening tiles.
pub const MIN_SIZE: usize = 2;
pub const MAX_SIZE: usize = 16;

/// Classic board size.
pub const DEFAULT_SIZE: usize = 4;

/// Largest tile value. Two tiles of this value do not merge, so `u32` never overflows.
pub const MAX_VALUE: u32 = 1 << 30;

/// Chance that a spawned tile is a 2 rather than a 4.
const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// What a single move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// At least one tile slid or merged.
    pub changed: bool,
    /// Score added by this move (sum of merge results).
    pub gained: u64,
    /// Tile spawned after the move, if any.
    pub spawned: Option<Tile>,
}

/// Read-only copy of the board handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub size: usize,
    pub score: u64,
    /// All tiles, including remnants merged away this turn (`is_deleted`).
    pub tiles: Vec<Tile>,
}

impl Snapshot {
    pub fn live_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| !t.is_deleted)
    }
}

/// A square board of `size`×`size` cells.
#[derive(Debug, Clone)]
pub struct Board<R> {
    size: usize,
    tiles: Vec<Tile>,
    score: u64,
    source: R,
}

impl<R: RandomSource> Board<R> {
    /// New board seeded with two random tiles.
    pub fn new(size: usize, source: R) -> Result<Self, BoardError> {
        check_size(size)?;
        let mut board = Self {
            size,
            tiles: Vec::with_capacity(size * size + 1),
            score: 0,
            source,
        };
        board.reset();
        Ok(board)
    }

    /// Board with the given `(value, x, y)` tiles, score 0 and nothing spawned.
    pub fn with_tiles(
        size: usize,
        tiles: impl IntoIterator<Item = (u32, usize, usize)>,
        source: R,
    ) -> Result<Self, BoardError> {
        check_size(size)?;
        let mut placed: Vec<Tile> = Vec::with_capacity(size * size + 1);
        for (value, x, y) in tiles {
            if value < 2 || value > MAX_VALUE || !value.is_power_of_two() {
                return Err(BoardError::InvalidValue(value));
            }
            if x >= size || y >= size {
                return Err(BoardError::OutOfBounds { x, y });
            }
            if placed.iter().any(|t| t.x == x && t.y == y) {
                return Err(BoardError::Occupied { x, y });
            }
            placed.push(Tile::placed(value, x, y));
        }
        Ok(Self {
            size,
            tiles: placed,
            score: 0,
            source,
        })
    }

    /// Clear the board and score, then spawn the two opening tiles.
    pub fn reset(&mut self) {
        self.tiles.clear();
        self.score = 0;
        self.spawn_tile();
        self.spawn_tile();
        info!("new game on a {0}x{0} board", self.size);
    }

    /// Put a 2 (90%) or a 4 (10%) on a uniformly chosen free cell.
    /// Returns `None` when the board is full.
    pub fn spawn_tile(&mut self) -> Option<Tile> {
        let free = self.free_cells();
        if free.is_empty() {
            debug!("spawn skipped: board full");
            return None;
        }
        let (x, y) = free[self.source.pick_index(free.len())];
        let value = if self.source.unit() < SPAWN_TWO_PROBABILITY {
            2
        } else {
            4
        };
        let tile = Tile::spawned(value, x, y);
        self.tiles.push(tile);
        debug!("spawned {} at ({}, {})", value, x, y);
        Some(tile)
    }

    /// Slide every tile towards `direction`, merging equal neighbours, then spawn one tile if
    /// anything moved and add the merge results to the score.
    pub fn shift(&mut self, direction: Direction) -> MoveOutcome {
        self.tiles.retain(|t| !t.is_deleted);
        slide(&mut self.tiles, self.size, direction);

        let changed = self.tiles.iter().any(Tile::moved);
        let spawned = if changed { self.spawn_tile() } else { None };

        let gained: u64 = self
            .tiles
            .iter()
            .filter(|t| t.is_upgraded)
            .map(|t| u64::from(t.value))
            .sum();
        self.score += gained;
        debug!(
            "move {}: changed={} gained={} score={}",
            direction, changed, gained, self.score
        );
        MoveOutcome {
            changed,
            gained,
            spawned,
        }
    }

    /// `shift` driven by a direction name such as `"left"`.
    pub fn shift_named(&mut self, name: &str) -> Result<MoveOutcome, BoardError> {
        let direction: Direction = name.parse()?;
        Ok(self.shift(direction))
    }
}

impl<R> Board<R> {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// All tiles, including this turn's merged-away remnants.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn live_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| !t.is_deleted)
    }

    pub fn tile_at(&self, x: usize, y: usize) -> Option<&Tile> {
        self.live_tiles().find(|t| t.x == x && t.y == y)
    }

    /// Cells not covered by any tile, row-major.
    pub fn free_cells(&self) -> Vec<(usize, usize)> {
        (0..self.size)
            .flat_map(|y| (0..self.size).map(move |x| (x, y)))
            .filter(|&(x, y)| !self.tiles.iter().any(|t| t.x == x && t.y == y))
            .collect()
    }

    pub fn max_value(&self) -> u32 {
        self.live_tiles().map(|t| t.value).max().unwrap_or(0)
    }

    /// True if `shift(direction)` would move or merge anything. Works on a scratch copy.
    pub fn can_shift(&self, direction: Direction) -> bool {
        let mut scratch: Vec<Tile> = self.live_tiles().copied().collect();
        slide(&mut scratch, self.size, direction);
        scratch.iter().any(Tile::moved)
    }

    /// No direction changes the board.
    pub fn is_game_over(&self) -> bool {
        !Direction::ALL.iter().any(|&d| self.can_shift(d))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            size: self.size,
            score: self.score,
            tiles: self.tiles.clone(),
        }
    }
}

fn check_size(size: usize) -> Result<(), BoardError> {
    if (MIN_SIZE..=MAX_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(BoardError::InvalidSize(size))
    }
}

/// Rotate so `direction` is up, run the up pass, rotate back.
fn slide(tiles: &mut [Tile], size: usize, direction: Direction) {
    let turns = direction.quarter_turns();
    for t in tiles.iter_mut() {
        t.rotate(turns, size);
    }
    move_up(tiles);
    for t in tiles.iter_mut() {
        t.rotate((4 - turns) % 4, size);
    }
}

/// Move every tile up. Row order matters: a tile must see the settled state of the row above
/// before it moves, so tiles are processed top row first.
fn move_up(tiles: &mut [Tile]) {
    for t in tiles.iter_mut() {
        t.begin_move();
    }
    tiles.sort_by_key(|t| t.y);
    for i in 0..tiles.len() {
        advance(tiles, i);
    }
}

/// Step tile `i` up one row at a time until it hits the wall, a different tile, or a cell that
/// already merged this pass; merge into an equal tile below `MAX_VALUE` and stop.
fn advance(tiles: &mut [Tile], i: usize) {
    // each iteration either stops or lowers y, so at most `y` steps
    while tiles[i].y > 0 {
        let (x, above_y) = (tiles[i].x, tiles[i].y - 1);
        let (first, second) = {
            let mut above = tiles
                .iter()
                .enumerate()
                .filter(|&(j, t)| j != i && t.x == x && t.y == above_y)
                .map(|(j, _)| j);
            (above.next(), above.next())
        };
        match (first, second) {
            (None, _) => tiles[i].y = above_y,
            (Some(a), Some(b)) => {
                // only a merge leaves two tiles in one cell
                debug_assert!(tiles[a].is_deleted != tiles[b].is_deleted);
                return;
            }
            (Some(a), None) => {
                if tiles[a].value == tiles[i].value && tiles[a].value < MAX_VALUE {
                    tiles[a].upgrade();
                    tiles[i].y = above_y;
                    tiles[i].is_deleted = true;
                }
                return;
            }
        }
    }
}

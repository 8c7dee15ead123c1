//! A single numbered tile and its per-turn bookkeeping.

/// One tile on the board. `y = 0` is the top row.
///
/// `previous_x`/`previous_y` hold the cell the tile started the current move in. They only
/// exist for renderers that animate the slide; the simulation never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub value: u32,
    pub x: usize,
    pub y: usize,
    pub previous_x: usize,
    pub previous_y: usize,
    /// Spawned this turn.
    pub is_new: bool,
    /// Absorbed another tile this turn.
    pub is_upgraded: bool,
    /// Merged into another tile this turn; purged at the start of the next move.
    pub is_deleted: bool,
}

impl Tile {
    /// Freshly spawned tile.
    pub fn spawned(value: u32, x: usize, y: usize) -> Self {
        Self {
            value,
            x,
            y,
            previous_x: x,
            previous_y: y,
            is_new: true,
            is_upgraded: false,
            is_deleted: false,
        }
    }

    /// Tile placed directly (scenarios, tests); carries no per-turn flags.
    pub fn placed(value: u32, x: usize, y: usize) -> Self {
        Self {
            is_new: false,
            ..Self::spawned(value, x, y)
        }
    }

    /// True if the tile changed cell during the last move.
    #[inline]
    pub fn moved(&self) -> bool {
        self.x != self.previous_x || self.y != self.previous_y
    }

    /// Clear last turn's flags and remember where this move starts.
    pub fn begin_move(&mut self) {
        self.is_new = false;
        self.is_upgraded = false;
        self.previous_x = self.x;
        self.previous_y = self.y;
    }

    /// Absorb an equal tile. Callers keep `value` below `MAX_VALUE`.
    pub fn upgrade(&mut self) {
        self.value *= 2;
        self.is_upgraded = true;
    }

    /// Rotate both the current and the previous position clockwise `turns` times on a
    /// `size`×`size` grid: `(x, y) -> (size - 1 - y, x)`.
    pub fn rotate(&mut self, turns: u8, size: usize) {
        for _ in 0..turns % 4 {
            (self.previous_x, self.previous_y) = (size - 1 - self.previous_y, self.previous_x);
            (self.x, self.y) = (size - 1 - self.y, self.x);
        }
    }
}

//! Cursor: a screen position that stays inside the viewport.
//!
//! The cursor is a plain `(x, y)` cell coordinate, 0-indexed from the top
//! left. It does not look at the text; every movement is bounded only by the
//! viewport [`Size`] passed in. The invariant is `x < cols && y < rows`, and
//! every method either keeps it or restores it.
//!
//! Movement clamps at the edges. Pressing Left at column 0 does nothing, it
//! does not wrap to the previous row.

use kilo_term::input::NavKey;
use kilo_term::terminal::Size;

/// One of the four arrow directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The direction an arrow key moves in. `None` for non-arrow keys.
    #[must_use]
    pub const fn from_nav(key: NavKey) -> Option<Self> {
        match key {
            NavKey::Up => Some(Self::Up),
            NavKey::Down => Some(Self::Down),
            NavKey::Left => Some(Self::Left),
            NavKey::Right => Some(Self::Right),
            _ => None,
        }
    }
}

/// Cursor position in screen cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Column, 0-indexed.
    pub x: u16,
    /// Row, 0-indexed.
    pub y: u16,
}

impl Cursor {
    /// The top-left cell.
    #[must_use]
    pub const fn new() -> Self {
        Self { x: 0, y: 0 }
    }

    /// A cursor at `(x, y)`. The caller is responsible for the bounds;
    /// use [`clamp_to`](Self::clamp_to) if unsure.
    #[must_use]
    pub const fn at(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    // -- Movement -----------------------------------------------------------

    /// Move one cell in `dir`. No-op at the viewport edge.
    pub const fn move_in(&mut self, dir: Direction, size: Size) {
        match dir {
            Direction::Left => self.x = self.x.saturating_sub(1),
            Direction::Up => self.y = self.y.saturating_sub(1),
            Direction::Right => {
                if self.x < size.max_x() {
                    self.x += 1;
                }
            }
            Direction::Down => {
                if self.y < size.max_y() {
                    self.y += 1;
                }
            }
        }
    }

    /// Move to column 0.
    pub const fn jump_home(&mut self) {
        self.x = 0;
    }

    /// Move to the last column.
    pub const fn jump_end(&mut self, size: Size) {
        self.x = size.max_x();
    }

    /// Move a full screen in `dir`, as `rows` single steps.
    ///
    /// Horizontal directions also step `rows` times. The editor only pages
    /// up and down.
    pub fn page_move(&mut self, dir: Direction, size: Size) {
        for _ in 0..size.rows {
            self.move_in(dir, size);
        }
    }

    /// Pull the cursor back inside `size` after the viewport shrank.
    pub fn clamp_to(&mut self, size: Size) {
        self.x = self.x.min(size.max_x());
        self.y = self.y.min(size.max_y());
    }

    /// Whether the cursor is inside `size`.
    #[must_use]
    pub const fn fits(self, size: Size) -> bool {
        self.x < size.cols && self.y < size.rows
    }
}

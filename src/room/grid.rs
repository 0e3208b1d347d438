//! Grid bounds for a room. The MVP room is 10x10 but the dimensions come from
//! configuration so tests (and future room types) can vary them.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GRID_WIDTH: i32 = 10;
pub const DEFAULT_GRID_HEIGHT: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
        }
    }
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        is_in_bounds(x, y, self.width, self.height)
    }
}

/// True iff `0 <= x < width` and `0 <= y < height`.
pub fn is_in_bounds(x: i32, y: i32, width: i32, height: i32) -> bool {
    x >= 0 && x < width && y >= 0 && y < height
}

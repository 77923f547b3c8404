//! Greedy grid movement.
//!
//! Units move at most one tile per tick. There is no path search: a unit
//! prefers the axis with the larger remaining distance (x on ties) and falls
//! back to the other axis when the preferred tile is not walkable. A unit
//! boxed in on both axes stays put.

use crate::grid::{TileGrid, TilePos};

/// Next tile on the way from `from` to `target`.
///
/// Returns `from` unchanged when already there or when neither candidate
/// step is walkable. Axes with zero remaining distance are never tried.
#[must_use]
pub fn step_toward(grid: &TileGrid, from: TilePos, target: TilePos) -> TilePos {
    let dx = target.x - from.x;
    let dy = target.y - from.y;

    let horizontal = (dx != 0).then(|| from.offset(dx.signum(), 0));
    let vertical = (dy != 0).then(|| from.offset(0, dy.signum()));

    let candidates = if dx.abs() >= dy.abs() {
        [horizontal, vertical]
    } else {
        [vertical, horizontal]
    };

    candidates
        .into_iter()
        .flatten()
        .find(|&pos| grid.is_walkable(pos))
        .unwrap_or(from)
}

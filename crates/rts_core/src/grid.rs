//! Tile grid and tile coordinates.
//!
//! The map is a fixed-size grid stored row-major in a flat vector.
//! Anything outside the grid reads as [`Tile::Blocked`], so callers never
//! need a separate bounds check before asking whether a tile is walkable.

use serde::{Deserialize, Serialize};

/// Terrain state of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Open ground.
    #[default]
    Empty,
    /// Harvestable gold. Never depleted.
    Resource,
    /// Impassable; building footprints are Blocked.
    Blocked,
}

impl Tile {
    /// Returns true if units may stand on this tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// One-character map symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Resource => '$',
            Self::Blocked => '#',
        }
    }
}

/// Integer tile coordinate.
///
/// Signed so that neighbour arithmetic at the map edge produces an
/// out-of-bounds coordinate instead of wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// This position shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The tile map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Grid width in tiles.
    width: i32,
    /// Grid height in tiles.
    height: i32,
    /// Tile data stored in row-major order.
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create a grid with every tile empty.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0, "TileGrid width must be positive");
        assert!(height > 0, "TileGrid height must be positive");

        Self {
            width,
            height,
            tiles: vec![Tile::Empty; (width as usize) * (height as usize)],
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check if a position lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Check if a `size`×`size` square anchored at its top-left corner fits.
    #[must_use]
    pub const fn square_in_bounds(&self, anchor: TilePos, size: i32) -> bool {
        self.in_bounds(anchor) && self.in_bounds(anchor.offset(size - 1, size - 1))
    }

    /// Row-major index of a position, `None` when out of bounds.
    #[must_use]
    pub fn index(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y as usize) * (self.width as usize) + (pos.x as usize))
    }

    /// Tile at a position. Out-of-bounds positions read as Blocked.
    #[must_use]
    pub fn get(&self, pos: TilePos) -> Tile {
        self.index(pos).map_or(Tile::Blocked, |i| self.tiles[i])
    }

    /// Overwrite a tile. Returns `false` (and changes nothing) when out of bounds.
    pub fn set(&mut self, pos: TilePos, tile: Tile) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Returns true if a unit may stand on the tile.
    #[must_use]
    pub fn is_walkable(&self, pos: TilePos) -> bool {
        self.get(pos).is_walkable()
    }

    /// Raw row-major tile data.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tiles of the given type.
    #[must_use]
    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| TilePos::new(x, y)))
    }
}

/// Positions covered by a `size`×`size` square anchored at its top-left corner.
pub fn square(anchor: TilePos, size: i32) -> impl Iterator<Item = TilePos> {
    (0..size).flat_map(move |dy| (0..size).map(move |dx| anchor.offset(dx, dy)))
}

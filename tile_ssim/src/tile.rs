//! Partitioning of an image into non-overlapping square tiles.
//!
//! Tiles advance in `tile_size` steps from the top-left corner. Any strip on
//! the right or bottom edge narrower than one tile is left out of every tile
//! and therefore never contributes to the score.

/// A square region `[x0, x1) x [y0, y1)` of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Tile {
    /// Side length of the tile.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.x1 - self.x0
    }

    /// Number of pixels covered by the tile.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }

    /// Returns true if `(x, y)` lies inside the tile.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// The grid of tiles covering the trimmed region of a `width x height` image.
///
/// `TileGrid` is `Copy`; every call to [`iter`][Self::iter] starts a fresh
/// pass over the same tiles, so the sequence can be walked as many times as
/// needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: usize,
}

impl TileGrid {
    /// Creates the grid for an image of the given size.
    ///
    /// `tile_size` must be non-zero; callers validate this beforehand.
    #[must_use]
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        debug_assert!(tile_size > 0);
        Self {
            width,
            height,
            tile_size,
        }
    }

    #[inline]
    #[must_use]
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Number of tile columns.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> usize {
        self.width / self.tile_size
    }

    /// Number of tile rows.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.height / self.tile_size
    }

    /// Width of the region covered by tiles (largest multiple of the tile size).
    #[inline]
    #[must_use]
    pub fn trimmed_width(&self) -> usize {
        self.columns() * self.tile_size
    }

    /// Height of the region covered by tiles (largest multiple of the tile size).
    #[inline]
    #[must_use]
    pub fn trimmed_height(&self) -> usize {
        self.rows() * self.tile_size
    }

    #[inline]
    #[must_use]
    pub fn num_tiles(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Returns the tile at position `index` in row-major order.
    #[must_use]
    pub fn tile(&self, index: usize) -> Option<Tile> {
        if index >= self.num_tiles() {
            return None;
        }
        let x0 = (index % self.columns()) * self.tile_size;
        let y0 = (index / self.columns()) * self.tile_size;
        Some(Tile {
            x0,
            y0,
            x1: x0 + self.tile_size,
            y1: y0 + self.tile_size,
        })
    }

    /// Iterates the tiles in row-major order.
    #[must_use]
    pub fn iter(&self) -> Tiles {
        Tiles {
            grid: *self,
            next: 0,
        }
    }
}

impl IntoIterator for TileGrid {
    type Item = Tile;
    type IntoIter = Tiles;

    fn into_iter(self) -> Tiles {
        self.iter()
    }
}

impl IntoIterator for &TileGrid {
    type Item = Tile;
    type IntoIter = Tiles;

    fn into_iter(self) -> Tiles {
        self.iter()
    }
}

/// Row-major iterator over the tiles of a [`TileGrid`].
#[derive(Clone, Debug)]
pub struct Tiles {
    grid: TileGrid,
    next: usize,
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        let tile = self.grid.tile(self.next)?;
        self.next += 1;
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.num_tiles().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tiles {}

impl std::iter::FusedIterator for Tiles {}

//! Tile grid planning and per-tile inference scheduling.
//!
//! Tiles are laid out row-major from `(0, 0)`. Along each axis the start
//! advances by `tile - overlap` pixels and the last tile is clipped to the
//! image edge instead of being padded, so edge tiles can be smaller than the
//! nominal size. With zero overlap the grid is the plain `0, tile, 2*tile, ...`
//! partition.

use crate::candidate::bbox::BoundingBox;
use crate::util::{TileDetError, TileDetResult};

pub mod scheduler;

pub use scheduler::TileScheduler;

/// One rectangular region of the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    /// Row-major position in the grid.
    pub index: usize,
    /// Left edge in pixels.
    pub x: usize,
    /// Top edge in pixels.
    pub y: usize,
    /// Actual width in pixels (clipped at the right edge).
    pub width: usize,
    /// Actual height in pixels (clipped at the bottom edge).
    pub height: usize,
}

impl Tile {
    /// Exclusive right edge in pixels.
    pub fn x_end(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge in pixels.
    pub fn y_end(&self) -> usize {
        self.y + self.height
    }

    /// Maps a box decoded from this tile into image-global coordinates.
    pub fn remap(&self, local: &BoundingBox, image_width: usize, image_height: usize) -> BoundingBox {
        local.remap(
            self.x,
            self.y,
            self.width,
            self.height,
            image_width,
            image_height,
        )
    }
}

/// Row-major grid of tiles covering an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    tiles: Vec<Tile>,
    cols: usize,
    rows: usize,
    image_width: usize,
    image_height: usize,
}

impl TileGrid {
    /// Plans a non-overlapping grid of `tile_width x tile_height` tiles.
    pub fn new(
        image_width: usize,
        image_height: usize,
        tile_width: usize,
        tile_height: usize,
    ) -> TileDetResult<Self> {
        Self::with_overlap(image_width, image_height, tile_width, tile_height, 0, 0)
    }

    /// Plans a grid where neighbouring tiles share `overlap_x` / `overlap_y`
    /// pixels.
    pub fn with_overlap(
        image_width: usize,
        image_height: usize,
        tile_width: usize,
        tile_height: usize,
        overlap_x: usize,
        overlap_y: usize,
    ) -> TileDetResult<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(TileDetError::InvalidDimensions {
                width: image_width,
                height: image_height,
            });
        }
        if tile_width == 0 || tile_height == 0 {
            return Err(TileDetError::InvalidConfig("tile size must be non-zero"));
        }
        if overlap_x >= tile_width || overlap_y >= tile_height {
            return Err(TileDetError::InvalidConfig(
                "tile overlap must be smaller than the tile size",
            ));
        }

        let xs = axis_spans(image_width, tile_width, overlap_x);
        let ys = axis_spans(image_height, tile_height, overlap_y);
        let mut tiles = Vec::with_capacity(xs.len() * ys.len());
        for &(y, height) in &ys {
            for &(x, width) in &xs {
                tiles.push(Tile {
                    index: tiles.len(),
                    x,
                    y,
                    width,
                    height,
                });
            }
        }

        Ok(Self {
            tiles,
            cols: xs.len(),
            rows: ys.len(),
            image_width,
            image_height,
        })
    }

    /// Returns the tiles in row-major order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tile columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of tile rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if the grid has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Width of the planned image.
    pub fn image_width(&self) -> usize {
        self.image_width
    }

    /// Height of the planned image.
    pub fn image_height(&self) -> usize {
        self.image_height
    }
}

/// `(start, extent)` pairs along one axis; stops once a span reaches the end.
fn axis_spans(len: usize, tile: usize, overlap: usize) -> Vec<(usize, usize)> {
    let step = tile - overlap;
    let mut spans = Vec::new();
    let mut start = 0usize;
    loop {
        let end = start.saturating_add(tile).min(len);
        spans.push((start, end - start));
        if end == len {
            break;
        }
        start += step;
    }
    spans
}

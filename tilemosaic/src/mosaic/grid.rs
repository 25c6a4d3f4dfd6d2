//! Tile grid construction.
//!
//! Converts a pair of geographic corners at a zoom level into the inclusive
//! range of tiles covering them, and the canvas offset of every tile.
//!
//! ```text
//!           min_x           max_x
//!         ┌───────┬───────┬───────┐
//!  min_y  │ (0,0) │       │  ne   │   top = 0
//!         ├───────┼───────┼───────┤
//!  max_y  │  sw   │       │       │   top = (rows - 1) * tile_size
//!         └───────┴───────┴───────┘
//!          left = 0        left = (columns - 1) * tile_size
//! ```

use crate::coord::{tile_index, CoordError, LngLat, MercatorProjector, TileCoord};

/// Inclusive range of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
    pub z: u8,
}

/// A tile and the canvas position of its top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub coord: TileCoord,
    pub top: u32,
    pub left: u32,
}

impl TileGrid {
    /// Number of tile rows.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Number of tile columns.
    #[inline]
    pub fn columns(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Number of tiles in the grid.
    pub fn len(&self) -> usize {
        self.rows() as usize * self.columns() as usize
    }

    /// A grid always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Canvas width in pixels for `tile_size` tiles.
    pub fn pixel_width(&self, tile_size: u32) -> u32 {
        self.columns() * tile_size
    }

    /// Canvas height in pixels for `tile_size` tiles.
    pub fn pixel_height(&self, tile_size: u32) -> u32 {
        self.rows() * tile_size
    }

    /// Canvas placement of every tile, row-major from the north-west tile.
    ///
    /// The south-most row lands at the bottom of the canvas and the east-most
    /// column at the right.
    pub fn placements(&self, tile_size: u32) -> Vec<TilePlacement> {
        let x_range = self.max_x - self.min_x;
        let y_range = self.max_y - self.min_y;

        let mut placements = Vec::with_capacity(self.len());
        for y in self.min_y..=self.max_y {
            for x in self.min_x..=self.max_x {
                placements.push(TilePlacement {
                    coord: TileCoord::new(x, y, self.z),
                    top: (y_range - (self.max_y - y)) * tile_size,
                    left: (x_range - (self.max_x - x)) * tile_size,
                });
            }
        }
        placements
    }
}

/// Builds the tile grid covering `sw` and `ne` at `zoom`.
///
/// Each corner maps to the tile containing it; the grid spans the min and max
/// of both corners on each axis, so larger latitudes give smaller rows.
pub fn build_grid(
    projector: &MercatorProjector,
    sw: LngLat,
    ne: LngLat,
    zoom: u8,
) -> Result<TileGrid, CoordError> {
    let (sw_fx, sw_fy) = projector.tile_fraction(sw, zoom)?;
    let (ne_fx, ne_fy) = projector.tile_fraction(ne, zoom)?;

    let (sw_x, sw_y) = (tile_index(sw_fx, zoom), tile_index(sw_fy, zoom));
    let (ne_x, ne_y) = (tile_index(ne_fx, zoom), tile_index(ne_fy, zoom));

    Ok(TileGrid {
        min_x: sw_x.min(ne_x),
        max_x: sw_x.max(ne_x),
        min_y: sw_y.min(ne_y),
        max_y: sw_y.max(ne_y),
        z: zoom,
    })
}

//! Crop rectangle calculation.
//!
//! Imagine a map of four tiles:
//!
//! ```text
//! ┌───┬───┐
//! │ a │ b │   ne lies in b (top-right tile)
//! ├───┼───┤
//! │ c │ d │   sw lies in c (bottom-left tile)
//! └───┴───┘
//! ```
//!
//! The position of a corner inside its tile is naturally measured from the
//! tile's top-left pixel. The crop edges, however, are distances inward from
//! the canvas's outer edges, so the sw position is re-expressed from the
//! bottom-left of its tile and the ne position from the top-right of its tile.

use crate::coord::{tile_index, CoordError, LngLat, MercatorProjector};

use super::grid::TileGrid;

/// Pixel rectangle inside the assembled canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Errors from crop calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CropError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// The corners produce an empty or out-of-canvas rectangle.
    #[error("crop {width}×{height} at ({left}, {top}) does not fit a {canvas_width}×{canvas_height} canvas")]
    Invalid {
        left: i64,
        top: i64,
        width: i64,
        height: i64,
        canvas_width: u32,
        canvas_height: u32,
    },
}

/// Which tile corner a sub-tile position is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelativeTo {
    BottomLeft,
    TopRight,
}

/// Position of `point` inside its tile, in whole pixels, measured from `origin`.
fn tile_pixel(
    projector: &MercatorProjector,
    point: LngLat,
    zoom: u8,
    origin: RelativeTo,
) -> Result<(i64, i64), CoordError> {
    let (fx, fy) = projector.tile_fraction(point, zoom)?;
    let size = projector.tile_size() as f64;

    // Measured against the clamped tile index so an edge-of-world corner
    // lands at the far side of the last tile.
    let x = ((fx - tile_index(fx, zoom) as f64) * size).round() as i64;
    let y = ((fy - tile_index(fy, zoom) as f64) * size).round() as i64;
    let size = projector.tile_size() as i64;

    Ok(match origin {
        RelativeTo::BottomLeft => (x, size - y),
        RelativeTo::TopRight => (size - x, y),
    })
}

/// Computes the canvas rectangle bounded by the `sw` and `ne` corners.
///
/// # Errors
///
/// `CropError::Invalid` when the rectangle has non-positive extent or leaves
/// the canvas, which happens for inverted or degenerate corners.
pub fn crop_rect(
    projector: &MercatorProjector,
    grid: &TileGrid,
    sw: LngLat,
    ne: LngLat,
) -> Result<CropRect, CropError> {
    let tile_size = projector.tile_size();
    let bottom_left = tile_pixel(projector, sw, grid.z, RelativeTo::BottomLeft)?;
    let top_right = tile_pixel(projector, ne, grid.z, RelativeTo::TopRight)?;

    let canvas_width = grid.pixel_width(tile_size);
    let canvas_height = grid.pixel_height(tile_size);

    let left = bottom_left.0;
    let top = top_right.1;
    let width = canvas_width as i64 - (bottom_left.0 + top_right.0);
    let height = canvas_height as i64 - (bottom_left.1 + top_right.1);

    let fits = width > 0
        && height > 0
        && left >= 0
        && top >= 0
        && left + width <= canvas_width as i64
        && top + height <= canvas_height as i64;

    if !fits {
        return Err(CropError::Invalid {
            left,
            top,
            width,
            height,
            canvas_width,
            canvas_height,
        });
    }

    Ok(CropRect {
        left: left as u32,
        top: top as u32,
        width: width as u32,
        height: height as u32,
    })
}

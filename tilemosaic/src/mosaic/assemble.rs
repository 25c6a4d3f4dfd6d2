//! Mosaic assembly.

use image::RgbaImage;
use tracing::debug;

use crate::fetch::FetchedTile;
use crate::raster::{Compositor, Layer};

use super::TileGrid;

/// Lays fetched tiles onto a canvas covering the whole grid.
///
/// Absent tiles are skipped; the canvas is always
/// `columns * tile_size` by `rows * tile_size`.
pub fn assemble(
    compositor: &dyn Compositor,
    tiles: &[FetchedTile],
    grid: &TileGrid,
    tile_size: u32,
) -> RgbaImage {
    let layers: Vec<Layer<'_>> = tiles
        .iter()
        .filter(|tile| !tile.is_absent())
        .map(|tile| Layer {
            bytes: &tile.bytes,
            x: tile.left,
            y: tile.top,
        })
        .collect();

    let width = grid.pixel_width(tile_size);
    let height = grid.pixel_height(tile_size);
    debug!(
        layers = layers.len(),
        absent = tiles.len() - layers.len(),
        width,
        height,
        "Assembling mosaic"
    );

    compositor.composite(&layers, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::raster::tests::solid_png;
    use crate::raster::{ImageCompositor, TRANSPARENT};
    use image::Rgba;
    use std::sync::Mutex;

    /// Records what it was asked to draw.
    #[derive(Default)]
    struct RecordingCompositor {
        calls: Mutex<Vec<(Vec<(u32, u32)>, u32, u32)>>,
    }

    impl Compositor for RecordingCompositor {
        fn composite(&self, layers: &[Layer<'_>], width: u32, height: u32) -> RgbaImage {
            let positions = layers.iter().map(|l| (l.x, l.y)).collect();
            self.calls.lock().unwrap().push((positions, width, height));
            RgbaImage::new(width, height)
        }
    }

    fn grid() -> TileGrid {
        TileGrid {
            min_x: 0,
            max_x: 1,
            min_y: 0,
            max_y: 1,
            z: 1,
        }
    }

    fn tile(x: u32, y: u32, bytes: Vec<u8>) -> FetchedTile {
        FetchedTile {
            coord: TileCoord::new(x, y, 1),
            bytes,
            top: y * 4,
            left: x * 4,
        }
    }

    #[test]
    fn test_absent_tiles_are_not_drawn() {
        let compositor = RecordingCompositor::default();
        let tiles = vec![
            tile(0, 0, vec![1]),
            tile(1, 0, vec![]),
            tile(0, 1, vec![1]),
            tile(1, 1, vec![1]),
        ];

        let canvas = assemble(&compositor, &tiles, &grid(), 4);

        assert_eq!(canvas.dimensions(), (8, 8));
        let calls = compositor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![(0, 0), (0, 4), (4, 4)]);
        assert_eq!((calls[0].1, calls[0].2), (8, 8));
    }

    #[test]
    fn test_canvas_is_full_size_with_no_tiles() {
        let compositor = RecordingCompositor::default();
        let tiles: Vec<FetchedTile> = vec![tile(0, 0, vec![]), tile(1, 1, vec![])];

        let canvas = assemble(&compositor, &tiles, &grid(), 256);
        assert_eq!(canvas.dimensions(), (512, 512));
    }

    #[test]
    fn test_assemble_with_image_compositor() {
        let green = solid_png(4, [0, 255, 0, 255]);
        let tiles = vec![
            tile(0, 0, green.clone()),
            tile(1, 0, vec![]),
            tile(0, 1, green.clone()),
            tile(1, 1, green),
        ];

        let canvas = assemble(&ImageCompositor::default(), &tiles, &grid(), 4);

        assert_eq!(*canvas.get_pixel(1, 1), Rgba([0, 255, 0, 255]));
        assert_eq!(*canvas.get_pixel(6, 1), TRANSPARENT);
        assert_eq!(*canvas.get_pixel(6, 6), Rgba([0, 255, 0, 255]));
    }
}

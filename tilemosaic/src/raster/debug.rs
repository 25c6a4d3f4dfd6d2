//! Intermediate image dumps for inspecting a render.
//!
//! Writes each fetched tile as `{z}-{x}-{y}.png`, the assembled canvas with
//! the crop corners marked in red as `stitched-marks.png`, and the encoded
//! output as `stitched.png`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::coord::TileCoord;
use crate::mosaic::CropRect;

const MARK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const MARK_RADIUS: i64 = 3;

/// Writes render intermediates into one directory.
#[derive(Debug, Clone)]
pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {
    /// Creates the dump directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a fetched tile's raw bytes. Absent tiles are skipped.
    pub fn write_tile(&self, coord: TileCoord, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let path = self
            .dir
            .join(format!("{}-{}-{}.png", coord.z, coord.x, coord.y));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), "Wrote debug tile");
        Ok(())
    }

    /// Writes a copy of the canvas with the crop's top-left and bottom-right
    /// corners marked.
    pub fn write_marked(&self, canvas: &RgbaImage, crop: &CropRect) -> io::Result<()> {
        let mut marked = canvas.clone();
        draw_mark(&mut marked, crop.left as i64, crop.top as i64);
        draw_mark(
            &mut marked,
            (crop.left + crop.width) as i64,
            (crop.top + crop.height) as i64,
        );

        let path = self.dir.join("stitched-marks.png");
        marked.save(&path).map_err(io::Error::other)?;
        debug!(path = %path.display(), "Wrote debug image");
        Ok(())
    }

    /// Writes the encoded output image.
    pub fn write_output(&self, png: &[u8]) -> io::Result<()> {
        let path = self.dir.join("stitched.png");
        fs::write(&path, png)?;
        debug!(path = %path.display(), "Wrote debug image");
        Ok(())
    }
}

/// Fills a square centred on (`cx`, `cy`), clipped to the image.
fn draw_mark(image: &mut RgbaImage, cx: i64, cy: i64) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    for y in (cy - MARK_RADIUS)..=(cy + MARK_RADIUS) {
        for x in (cx - MARK_RADIUS)..=(cx + MARK_RADIUS) {
            if (0..width).contains(&x) && (0..height).contains(&y) {
                image.put_pixel(x as u32, y as u32, MARK_COLOR);
            }
        }
    }
}

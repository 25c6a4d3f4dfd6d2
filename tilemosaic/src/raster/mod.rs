//! Raster operations on top of the `image` crate.
//!
//! The mosaic pipeline needs only a handful of raster primitives: lay encoded
//! tiles onto a blank canvas, cut a rectangle out of it, resize, and encode
//! the result as PNG. Compositing sits behind the [`Compositor`] trait so the
//! assembler can be exercised without decoding real images.

mod debug;

pub use debug::DebugDump;

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;
use tracing::warn;

/// Fill for canvas regions no tile was drawn on.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Errors from raster encode/decode.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("invalid image dimensions {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// One encoded image to draw at a canvas position.
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    pub bytes: &'a [u8],
    pub x: u32,
    pub y: u32,
}

/// Lays encoded images onto a blank canvas.
pub trait Compositor: Send + Sync {
    /// Draws every layer onto a new `width × height` canvas.
    ///
    /// Regions no layer covers keep the compositor's background.
    fn composite(&self, layers: &[Layer<'_>], width: u32, height: u32) -> RgbaImage;
}

/// [`Compositor`] that decodes layers with the `image` crate.
///
/// Layers that fail to decode are logged and skipped, leaving their region
/// as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCompositor {
    background: Rgba<u8>,
}

impl ImageCompositor {
    pub fn new(background: Rgba<u8>) -> Self {
        Self { background }
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }
}

impl Default for ImageCompositor {
    fn default() -> Self {
        Self::new(TRANSPARENT)
    }
}

impl Compositor for ImageCompositor {
    fn composite(&self, layers: &[Layer<'_>], width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(width, height, self.background);

        for layer in layers {
            match decode(layer.bytes) {
                Ok(tile) => imageops::overlay(&mut canvas, &tile, layer.x as i64, layer.y as i64),
                Err(e) => warn!(
                    x = layer.x,
                    y = layer.y,
                    bytes = layer.bytes.len(),
                    error = %e,
                    "Skipping undecodable tile"
                ),
            }
        }

        canvas
    }
}

/// Decodes any format the `image` crate recognises into RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(RasterError::Decode)
}

/// Copies the `width × height` region at (`left`, `top`) out of `image`.
pub fn extract(image: &RgbaImage, left: u32, top: u32, width: u32, height: u32) -> RgbaImage {
    imageops::crop_imm(image, left, top, width, height).to_image()
}

/// Resizes to exactly `width × height`; a no-op when already that size.
pub fn resize(image: RgbaImage, width: u32, height: u32) -> Result<RgbaImage, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    if image.dimensions() == (width, height) {
        return Ok(image);
    }
    Ok(imageops::resize(&image, width, height, FilterType::Lanczos3))
}

/// Encodes as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(RasterError::Encode)?;
    Ok(buffer)
}

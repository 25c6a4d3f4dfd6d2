//! Error types for the mosaic pipeline.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::coord::{BoundsError, CoordError, PixelSize};
use crate::fetch::TileFetchError;
use crate::raster::RasterError;

use super::crop::CropError;

/// Terminal failure of a mosaic render.
///
/// A render returns either the encoded image or exactly one of these,
/// describing the first fatal condition met.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// A coordinate or zoom lies outside the Web Mercator domain.
    #[error("out of range: {0}")]
    OutOfRange(#[from] CoordError),

    /// No zoom below the cap yields the requested minimum pixel size.
    #[error("couldn't find any zoom level to cover a {min} area")]
    NoZoomFound { min: PixelSize },

    /// A tile fetch failed while failures are escalated.
    #[error(transparent)]
    TileFetch(#[from] TileFetchError),

    /// The corners produce an empty or out-of-canvas crop.
    #[error("invalid crop: {0}")]
    InvalidCrop(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The bounds cannot be fitted to the requested aspect ratio.
    #[error("cannot fit bounds: {0}")]
    InvalidBounds(String),

    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The blocking raster step panicked or was cancelled.
    #[error("raster task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<CropError> for MosaicError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::Coord(e) => MosaicError::OutOfRange(e),
            invalid => MosaicError::InvalidCrop(invalid.to_string()),
        }
    }
}

impl From<BoundsError> for MosaicError {
    fn from(err: BoundsError) -> Self {
        match err {
            BoundsError::Coord(e) => MosaicError::OutOfRange(e),
            other => MosaicError::InvalidBounds(other.to_string()),
        }
    }
}

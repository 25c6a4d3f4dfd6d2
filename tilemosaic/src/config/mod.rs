//! Render configuration.
//!
//! [`MosaicRequest`] carries everything one render needs. Defaults live here
//! as named constants; [`ConfigFile`] supplies user overrides from
//! `~/.tilemosaic/config.ini`.

mod file;

pub use file::{
    config_directory, config_file_path, parse_color, ConfigFile, ConfigFileError,
    DownloadSettings, RenderSettings, SourceSettings,
};

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::coord::{GeoBox, PixelSize};
use crate::fetch::FetchOptions;

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default minimum pixel distance between the corners on each axis.
pub const DEFAULT_MIN_WIDTH: u32 = 500;
pub const DEFAULT_MIN_HEIGHT: u32 = 500;

/// Default number of tile fetches in flight.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default upper bound on a single tile fetch.
///
/// Tile servers rendering on demand can be very slow.
pub const DEFAULT_TILE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Whether to fetch one zoom level deeper than selected by default.
pub const DEFAULT_RETINA: bool = true;

/// Default fill for regions with no tile (transparent).
pub const DEFAULT_BACKGROUND: [u8; 4] = [0, 0, 0, 0];

/// Invalid request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("output size {0} has a zero dimension")]
    InvalidSize(PixelSize),

    #[error("tile size must be positive")]
    InvalidTileSize,

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("tile timeout must be positive")]
    InvalidTimeout,

    #[error("tile URL template is empty")]
    EmptyTemplate,
}

/// Parameters for one mosaic render.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicRequest {
    /// Geographic corners to render.
    pub bounds: GeoBox,
    /// Output raster size.
    pub size: PixelSize,
    /// Tile URL with `{x}`, `{y}` and `{z}` placeholders.
    pub template: String,
    pub tile_size: u32,
    /// Fixed zoom; `None` selects one from the minimum size.
    pub zoom_level: Option<u8>,
    /// Fetch one zoom deeper than selected.
    pub retina: bool,
    pub min_width: u32,
    pub min_height: u32,
    pub concurrency: usize,
    pub tile_timeout: Duration,
    pub fail_on_tile_error: bool,
    /// Grow the bounds to the output aspect ratio before rendering.
    pub fit_aspect: bool,
    /// RGBA fill for regions with no tile.
    pub background: [u8; 4],
    /// Directory for intermediate image dumps.
    pub debug_dir: Option<PathBuf>,
    /// Log the duration of each stage.
    pub measure_timing: bool,
}

impl MosaicRequest {
    /// Creates a request with default options.
    pub fn new(bounds: GeoBox, size: PixelSize, template: impl Into<String>) -> Self {
        Self {
            bounds,
            size,
            template: template.into(),
            tile_size: DEFAULT_TILE_SIZE,
            zoom_level: None,
            retina: DEFAULT_RETINA,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            concurrency: DEFAULT_CONCURRENCY,
            tile_timeout: DEFAULT_TILE_TIMEOUT,
            fail_on_tile_error: false,
            fit_aspect: false,
            background: DEFAULT_BACKGROUND,
            debug_dir: None,
            measure_timing: false,
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_zoom_level(mut self, zoom: u8) -> Self {
        self.zoom_level = Some(zoom);
        self
    }

    pub fn with_retina(mut self, retina: bool) -> Self {
        self.retina = retina;
        self
    }

    pub fn with_min_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_tile_timeout(mut self, timeout: Duration) -> Self {
        self.tile_timeout = timeout;
        self
    }

    pub fn with_fail_on_tile_error(mut self, fail: bool) -> Self {
        self.fail_on_tile_error = fail;
        self
    }

    pub fn with_fit_aspect(mut self, fit: bool) -> Self {
        self.fit_aspect = fit;
        self
    }

    pub fn with_background(mut self, rgba: [u8; 4]) -> Self {
        self.background = rgba;
        self
    }

    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn with_measure_timing(mut self, measure: bool) -> Self {
        self.measure_timing = measure;
        self
    }

    /// Minimum pixel distance between the corners.
    pub fn min_size(&self) -> PixelSize {
        PixelSize::new(self.min_width, self.min_height)
    }

    /// Fetch behaviour for this request.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            concurrency: self.concurrency,
            timeout: self.tile_timeout,
            fail_on_tile_error: self.fail_on_tile_error,
        }
    }

    /// Checks parameters that no later stage can recover from.
    ///
    /// Coordinates and zoom are checked by the stages that use them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(ConfigError::InvalidSize(self.size));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.tile_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.template.trim().is_empty() {
            return Err(ConfigError::EmptyTemplate);
        }
        Ok(())
    }
}

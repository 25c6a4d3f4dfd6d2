//! Coordinate type definitions

use std::fmt;

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.051_128_779_806_59;
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Sphere radius used by spherical Web Mercator, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the projected world width in meters (`π * EARTH_RADIUS`).
pub const MAX_EXTENT: f64 = 20_037_508.342_789_244;

/// Zoom levels are searched and fetched in `MIN_ZOOM..ZOOM_CAP`.
pub const MIN_ZOOM: u8 = 0;
pub const ZOOM_CAP: u8 = 19;

/// Highest zoom level a tile may be requested at.
pub const MAX_ZOOM: u8 = ZOOM_CAP - 1;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    /// Longitude in degrees, positive east
    pub lng: f64,
    /// Latitude in degrees, positive north
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}

/// A point in projected Web Mercator meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geographic rectangle given by its south-west and north-east corners.
///
/// The corners are never reordered. A caller that swaps them on purpose gets
/// the crop that swapped corners imply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBox {
    pub sw_lat: f64,
    pub sw_lng: f64,
    pub ne_lat: f64,
    pub ne_lng: f64,
}

impl GeoBox {
    pub fn new(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Self {
        Self {
            sw_lat,
            sw_lng,
            ne_lat,
            ne_lng,
        }
    }

    /// Builds a box from its two corner points.
    pub fn from_corners(sw: LngLat, ne: LngLat) -> Self {
        Self::new(sw.lat, sw.lng, ne.lat, ne.lng)
    }

    #[inline]
    pub fn sw(&self) -> LngLat {
        LngLat::new(self.sw_lng, self.sw_lat)
    }

    #[inline]
    pub fn ne(&self) -> LngLat {
        LngLat::new(self.ne_lng, self.ne_lat)
    }
}

impl fmt::Display for GeoBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sw {} ne {}", self.sw(), self.ne())
    }
}

/// Output raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Tile coordinates in the Web Mercator / Slippy Map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column, 0 at the antimeridian, increasing east
    pub x: u32,
    /// Row, 0 at the north edge, increasing south
    pub y: u32,
    /// Zoom level
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator domain.
    #[error("latitude {0} is outside the Web Mercator range ±85.0511°")]
    LatitudeOutOfRange(f64),

    /// Projected y outside the Web Mercator extent.
    #[error("projected y {0} is outside the Web Mercator extent ±20037508.34 m")]
    ProjectedOutOfRange(f64),

    /// NaN or infinite coordinate.
    #[error("coordinate is not a finite number: ({0}, {1})")]
    NonFinite(f64, f64),

    /// Zoom level outside `0..19`.
    #[error("zoom level {0} is outside the supported range 0..=18")]
    InvalidZoom(u8),
}

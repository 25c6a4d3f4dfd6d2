//! Coordinate conversion module
//!
//! Provides spherical Web Mercator conversions between geographic coordinates
//! (longitude/latitude), projected meters, global pixel positions and
//! fractional tile coordinates at a given zoom level.
//!
//! The pixel space at zoom `z` is `tile_size * 2^z` pixels wide with its origin
//! at the top-left (north-west) corner of the world, so the projector carries
//! the tile size it was built for.

mod bounds;
mod types;

pub use bounds::{fit_bounds, BoundsError};
pub use types::{
    CoordError, GeoBox, LngLat, MercatorPoint, PixelSize, TileCoord, EARTH_RADIUS, MAX_EXTENT,
    MAX_LAT, MAX_ZOOM, MIN_LAT, MIN_ZOOM, ZOOM_CAP,
};

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Slack allowed on the latitude bound for values produced by `inverse`.
const LAT_EPSILON: f64 = 1e-9;

/// Spherical Web Mercator projector for a given tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MercatorProjector {
    tile_size: u32,
}

impl MercatorProjector {
    /// Creates a projector for square tiles of `tile_size` pixels.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Width (and height) of the whole world in pixels at `zoom`.
    #[inline]
    pub fn world_size(&self, zoom: u8) -> f64 {
        self.tile_size as f64 * 2.0_f64.powi(zoom as i32)
    }

    /// Projects a geographic point to Web Mercator meters.
    ///
    /// # Errors
    ///
    /// `LatitudeOutOfRange` outside ±85.0511°, `NonFinite` for NaN/infinite input.
    pub fn forward(&self, point: LngLat) -> Result<MercatorPoint, CoordError> {
        check_point(point)?;

        let x = EARTH_RADIUS * point.lng.to_radians();
        let y = EARTH_RADIUS * (FRAC_PI_4 + 0.5 * point.lat.to_radians()).tan().ln();

        Ok(MercatorPoint::new(x, y.clamp(-MAX_EXTENT, MAX_EXTENT)))
    }

    /// Converts Web Mercator meters back to a geographic point.
    pub fn inverse(&self, point: MercatorPoint) -> Result<LngLat, CoordError> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(CoordError::NonFinite(point.x, point.y));
        }
        if point.y.abs() > MAX_EXTENT * (1.0 + 1e-12) {
            return Err(CoordError::ProjectedOutOfRange(point.y));
        }

        let lng = (point.x / EARTH_RADIUS).to_degrees();
        let lat = (FRAC_PI_2 - 2.0 * (-point.y / EARTH_RADIUS).exp().atan()).to_degrees();

        Ok(LngLat::new(lng, lat))
    }

    /// Global pixel position of `point` at `zoom`, origin top-left.
    pub fn pixel_at(&self, point: LngLat, zoom: u8) -> Result<(f64, f64), CoordError> {
        check_point(point)?;
        check_zoom(zoom)?;

        let world = self.world_size(zoom);
        let sin = point.lat.to_radians().sin();

        let px = world * (point.lng / 360.0 + 0.5);
        let py = world * (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI));

        Ok((px, py.clamp(0.0, world)))
    }

    /// Fractional tile coordinates of `point` at `zoom`.
    ///
    /// The integer part is the tile index, the fractional part the position
    /// inside that tile in tile units.
    pub fn tile_fraction(&self, point: LngLat, zoom: u8) -> Result<(f64, f64), CoordError> {
        let (px, py) = self.pixel_at(point, zoom)?;
        let size = self.tile_size as f64;
        Ok((px / size, py / size))
    }
}

/// Integer tile index containing fractional coordinate `fraction` at `zoom`.
///
/// Clamped to `[0, 2^zoom - 1]`, so a point lying exactly on the east or
/// south edge of the world belongs to the last tile rather than one past it.
#[inline]
pub fn tile_index(fraction: f64, zoom: u8) -> u32 {
    let last = (1u64 << zoom) - 1;
    fraction.floor().clamp(0.0, last as f64) as u32
}

fn check_point(point: LngLat) -> Result<(), CoordError> {
    if !point.lng.is_finite() || !point.lat.is_finite() {
        return Err(CoordError::NonFinite(point.lng, point.lat));
    }
    if point.lat.abs() > MAX_LAT + LAT_EPSILON {
        return Err(CoordError::LatitudeOutOfRange(point.lat));
    }
    Ok(())
}

fn check_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}

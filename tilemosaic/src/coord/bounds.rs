//! Aspect-ratio fitting of geographic bounds.
//!
//! Grows a bounding box around its center until its projected aspect ratio
//! matches the requested output raster. This is the "grow box" policy of
//! classic map renderers: one axis is extended, neither is ever shrunk.

use thiserror::Error;

use super::{CoordError, GeoBox, MercatorPoint, MercatorProjector, PixelSize};

/// Relative tolerance under which two aspect ratios are considered equal.
const RATIO_TOLERANCE: f64 = 1e-9;

/// Errors that can occur while fitting bounds to an aspect ratio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    /// A corner could not be projected, or the grown box leaves the Mercator domain.
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// Target raster has a zero dimension.
    #[error("target size {0} has a zero dimension")]
    InvalidTargetSize(PixelSize),

    /// The box has zero projected width or height.
    #[error("bounds {0} have zero projected width or height")]
    Degenerate(GeoBox),
}

/// Fits `bounds` to the aspect ratio of `target`.
///
/// Returns the box unchanged when it already has the target ratio. Otherwise
/// the proportionally smaller axis is grown around the box center. Each
/// corner keeps its side of the center, so swapped corners stay swapped.
pub fn fit_bounds(
    projector: &MercatorProjector,
    bounds: &GeoBox,
    target: PixelSize,
) -> Result<GeoBox, BoundsError> {
    if target.width == 0 || target.height == 0 {
        return Err(BoundsError::InvalidTargetSize(target));
    }

    let sw = projector.forward(bounds.sw())?;
    let ne = projector.forward(bounds.ne())?;

    let box_width = (ne.x - sw.x).abs();
    let box_height = (ne.y - sw.y).abs();
    if box_width == 0.0 || box_height == 0.0 {
        return Err(BoundsError::Degenerate(*bounds));
    }

    let target_ratio = target.width as f64 / target.height as f64;
    let box_ratio = box_width / box_height;

    if (box_ratio - target_ratio).abs() <= RATIO_TOLERANCE * target_ratio {
        return Ok(*bounds);
    }

    let (sw, ne) = if box_ratio > target_ratio {
        with_height(sw, ne, box_width / target_ratio)
    } else {
        with_width(sw, ne, box_height * target_ratio)
    };

    Ok(GeoBox::from_corners(
        projector.inverse(sw)?,
        projector.inverse(ne)?,
    ))
}

fn with_height(a: MercatorPoint, b: MercatorPoint, height: f64) -> (MercatorPoint, MercatorPoint) {
    let cy = (a.y + b.y) / 2.0;
    let half = height / 2.0;
    if a.y > b.y {
        (
            MercatorPoint::new(a.x, cy + half),
            MercatorPoint::new(b.x, cy - half),
        )
    } else {
        (
            MercatorPoint::new(a.x, cy - half),
            MercatorPoint::new(b.x, cy + half),
        )
    }
}

fn with_width(a: MercatorPoint, b: MercatorPoint, width: f64) -> (MercatorPoint, MercatorPoint) {
    let cx = (a.x + b.x) / 2.0;
    let half = width / 2.0;
    if a.x > b.x {
        (
            MercatorPoint::new(cx + half, a.y),
            MercatorPoint::new(cx - half, b.y),
        )
    } else {
        (
            MercatorPoint::new(cx - half, a.y),
            MercatorPoint::new(cx + half, b.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn projector() -> MercatorProjector {
        MercatorProjector::new(256)
    }

    fn projected_ratio(bounds: &GeoBox) -> f64 {
        let p = projector();
        let sw = p.forward(bounds.sw()).unwrap();
        let ne = p.forward(bounds.ne()).unwrap();
        (ne.x - sw.x).abs() / (ne.y - sw.y).abs()
    }

    #[test]
    fn test_matching_ratio_is_unchanged() {
        // Square in projected meters around the origin
        let p = projector();
        let corner = p.inverse(MercatorPoint::new(100_000.0, 100_000.0)).unwrap();
        let bounds = GeoBox::new(-corner.lat, -corner.lng, corner.lat, corner.lng);

        let fitted = fit_bounds(&p, &bounds, PixelSize::new(500, 500)).unwrap();
        assert_eq!(fitted, bounds);
    }

    #[test]
    fn test_wide_box_grows_height() {
        let bounds = GeoBox::new(59.9, 24.5, 60.3, 25.5);
        let before = projected_ratio(&bounds);
        assert!(before > 1.0);

        let fitted = fit_bounds(&projector(), &bounds, PixelSize::new(800, 1000)).unwrap();

        assert!((projected_ratio(&fitted) - 0.8).abs() < 1e-9);
        // Longitudes untouched, latitudes pushed outwards
        assert!((fitted.sw_lng - bounds.sw_lng).abs() < 1e-9);
        assert!((fitted.ne_lng - bounds.ne_lng).abs() < 1e-9);
        assert!(fitted.sw_lat < bounds.sw_lat);
        assert!(fitted.ne_lat > bounds.ne_lat);
    }

    #[test]
    fn test_tall_box_grows_width() {
        let bounds = GeoBox::new(40.0, -74.1, 41.0, -73.9);
        let fitted = fit_bounds(&projector(), &bounds, PixelSize::new(1600, 900)).unwrap();

        assert!((projected_ratio(&fitted) - 1600.0 / 900.0).abs() < 1e-9);
        assert!((fitted.sw_lat - bounds.sw_lat).abs() < 1e-9);
        assert!((fitted.ne_lat - bounds.ne_lat).abs() < 1e-9);
        assert!(fitted.sw_lng < bounds.sw_lng);
        assert!(fitted.ne_lng > bounds.ne_lng);
    }

    #[test]
    fn test_swapped_corners_stay_swapped() {
        let bounds = GeoBox::new(60.3, 25.5, 59.9, 24.5);
        let fitted = fit_bounds(&projector(), &bounds, PixelSize::new(800, 1000)).unwrap();

        assert!(fitted.sw_lat > fitted.ne_lat);
        assert!(fitted.sw_lng > fitted.ne_lng);
    }

    #[test]
    fn test_zero_target_dimension() {
        let bounds = GeoBox::new(59.9, 24.5, 60.3, 25.5);
        let result = fit_bounds(&projector(), &bounds, PixelSize::new(0, 10));
        assert!(matches!(result, Err(BoundsError::InvalidTargetSize(_))));
    }

    #[test]
    fn test_degenerate_box() {
        let bounds = GeoBox::new(60.0, 24.5, 60.0, 25.5);
        let result = fit_bounds(&projector(), &bounds, PixelSize::new(100, 100));
        assert!(matches!(result, Err(BoundsError::Degenerate(_))));
    }

    #[test]
    fn test_growth_past_mercator_edge_is_out_of_range() {
        // Very wide strip near the pole cannot grow tall enough
        let bounds = GeoBox::new(84.0, -170.0, 85.0, 170.0);
        let result = fit_bounds(&projector(), &bounds, PixelSize::new(100, 1000));
        assert!(matches!(
            result,
            Err(BoundsError::Coord(CoordError::ProjectedOutOfRange(_)))
        ));
    }

    proptest! {
        #[test]
        fn prop_fit_is_idempotent(
            sw_lat in -60.0f64..0.0,
            sw_lng in -170.0f64..0.0,
            dlat in 0.01f64..20.0,
            dlng in 0.01f64..20.0,
            width in 1u32..2000,
            height in 1u32..2000,
        ) {
            let p = projector();
            let bounds = GeoBox::new(sw_lat, sw_lng, sw_lat + dlat, sw_lng + dlng);
            let target = PixelSize::new(width, height);

            if let Ok(once) = fit_bounds(&p, &bounds, target) {
                let twice = fit_bounds(&p, &once, target).unwrap();
                prop_assert_eq!(once, twice);
            }
        }

        #[test]
        fn prop_fit_never_shrinks(
            sw_lat in -60.0f64..0.0,
            sw_lng in -170.0f64..0.0,
            dlat in 0.01f64..20.0,
            dlng in 0.01f64..20.0,
            width in 1u32..2000,
            height in 1u32..2000,
        ) {
            let p = projector();
            let bounds = GeoBox::new(sw_lat, sw_lng, sw_lat + dlat, sw_lng + dlng);

            if let Ok(fitted) = fit_bounds(&p, &bounds, PixelSize::new(width, height)) {
                prop_assert!(fitted.sw_lat <= bounds.sw_lat + 1e-9);
                prop_assert!(fitted.sw_lng <= bounds.sw_lng + 1e-9);
                prop_assert!(fitted.ne_lat >= bounds.ne_lat - 1e-9);
                prop_assert!(fitted.ne_lng >= bounds.ne_lng - 1e-9);
            }
        }
    }
}

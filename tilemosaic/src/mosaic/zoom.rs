//! Zoom level selection.

use crate::coord::{LngLat, MercatorProjector, PixelSize, MAX_ZOOM, MIN_ZOOM};

use super::MosaicError;

/// Picks the smallest zoom at which the corners are at least `min` pixels
/// apart on both axes.
///
/// # Errors
///
/// `NoZoomFound` when no zoom up to [`MAX_ZOOM`] is large enough, and
/// `OutOfRange` for a corner outside the Mercator domain.
pub fn select_zoom(
    projector: &MercatorProjector,
    sw: LngLat,
    ne: LngLat,
    min: PixelSize,
) -> Result<u8, MosaicError> {
    for z in MIN_ZOOM..=MAX_ZOOM {
        let (x1, y1) = projector.pixel_at(sw, z)?;
        let (x2, y2) = projector.pixel_at(ne, z)?;

        if (x1 - x2).abs() >= min.width as f64 && (y1 - y2).abs() >= min.height as f64 {
            return Ok(z);
        }
    }

    Err(MosaicError::NoZoomFound { min })
}

/// Applies the retina bump without leaving the supported zoom range.
pub fn retina_zoom(zoom: u8) -> u8 {
    zoom.saturating_add(1).min(MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn projector() -> MercatorProjector {
        MercatorProjector::new(256)
    }

    fn satisfies(p: &MercatorProjector, sw: LngLat, ne: LngLat, min: PixelSize, z: u8) -> bool {
        let (x1, y1) = p.pixel_at(sw, z).unwrap();
        let (x2, y2) = p.pixel_at(ne, z).unwrap();
        (x1 - x2).abs() >= min.width as f64 && (y1 - y2).abs() >= min.height as f64
    }

    #[test]
    fn test_zero_minimum_selects_zoom_zero() {
        let z = select_zoom(
            &projector(),
            LngLat::new(24.9, 60.1),
            LngLat::new(25.0, 60.2),
            PixelSize::new(0, 0),
        )
        .unwrap();
        assert_eq!(z, 0);
    }

    #[test]
    fn test_whole_world_fits_at_low_zoom() {
        // The full world is 256px at z0 and 512px at z1
        let z = select_zoom(
            &projector(),
            LngLat::new(-180.0, -85.0),
            LngLat::new(180.0, 85.0),
            PixelSize::new(500, 400),
        )
        .unwrap();
        assert_eq!(z, 1);
    }

    #[test]
    fn test_larger_tiles_need_lower_zoom() {
        let sw = LngLat::new(24.0, 60.0);
        let ne = LngLat::new(25.0, 60.5);
        let min = PixelSize::new(500, 500);

        let z256 = select_zoom(&MercatorProjector::new(256), sw, ne, min).unwrap();
        let z512 = select_zoom(&MercatorProjector::new(512), sw, ne, min).unwrap();
        assert_eq!(z512 + 1, z256);
    }

    #[test]
    fn test_identical_corners_find_no_zoom() {
        let point = LngLat::new(24.9, 60.2);
        let result = select_zoom(&projector(), point, point, PixelSize::new(1, 1));
        assert!(matches!(result, Err(MosaicError::NoZoomFound { .. })));
    }

    #[test]
    fn test_out_of_range_corner() {
        let result = select_zoom(
            &projector(),
            LngLat::new(0.0, 87.0),
            LngLat::new(1.0, 88.0),
            PixelSize::new(10, 10),
        );
        assert!(matches!(result, Err(MosaicError::OutOfRange(_))));
    }

    #[test]
    fn test_retina_zoom_is_clamped() {
        assert_eq!(retina_zoom(0), 1);
        assert_eq!(retina_zoom(17), 18);
        assert_eq!(retina_zoom(18), 18);
    }

    proptest! {
        #[test]
        fn prop_selected_zoom_is_minimal(
            lng in -170.0f64..170.0,
            lat in -70.0f64..70.0,
            dlng in 0.0001f64..10.0,
            dlat in 0.0001f64..10.0,
            min_w in 0u32..2000,
            min_h in 0u32..2000,
        ) {
            let p = projector();
            let sw = LngLat::new(lng, lat);
            let ne = LngLat::new(lng + dlng, lat + dlat);
            let min = PixelSize::new(min_w, min_h);

            match select_zoom(&p, sw, ne, min) {
                Ok(z) => {
                    prop_assert!(satisfies(&p, sw, ne, min, z));
                    for smaller in 0..z {
                        prop_assert!(!satisfies(&p, sw, ne, min, smaller));
                    }
                }
                Err(MosaicError::NoZoomFound { .. }) => {
                    for z in MIN_ZOOM..=MAX_ZOOM {
                        prop_assert!(!satisfies(&p, sw, ne, min, z));
                    }
                }
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }
    }
}

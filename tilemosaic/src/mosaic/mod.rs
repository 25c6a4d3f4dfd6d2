//! Mosaic rendering pipeline.
//!
//! Renders a geographic bounding box into a single image from a tiled map
//! source:
//!
//! ```text
//! bounds ─► zoom ─► grid ─► fetch ─► assemble ─► crop ─► resize ─► PNG
//! ```
//!
//! Only the fetch stage is concurrent. Everything after it runs once every
//! tile has resolved, as one step on the blocking pool.

mod assemble;
mod crop;
mod error;
mod grid;
mod zoom;

pub use assemble::assemble;
pub use crop::{crop_rect, CropError, CropRect};
pub use error::MosaicError;
pub use grid::{build_grid, TileGrid, TilePlacement};
pub use zoom::{retina_zoom, select_zoom};

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::Rgba;
use tracing::{debug, info, instrument};

use crate::config::MosaicRequest;
use crate::coord::{fit_bounds, CoordError, MercatorProjector, MAX_ZOOM};
use crate::fetch::{fetch_all, AsyncHttpClient, FetchedTile};
use crate::raster::{self, Compositor, DebugDump, ImageCompositor};

/// Renders [`MosaicRequest`]s into PNG images.
pub struct MosaicRenderer<C> {
    client: Arc<C>,
    compositor: Option<Arc<dyn Compositor>>,
}

impl<C> MosaicRenderer<C>
where
    C: AsyncHttpClient + 'static,
{
    /// Creates a renderer fetching tiles through `client`.
    ///
    /// Tiles are composited with an [`ImageCompositor`] filled with each
    /// request's background.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            compositor: None,
        }
    }

    /// Uses `compositor` for every render instead of the default.
    pub fn with_compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.compositor = Some(compositor);
        self
    }

    /// Renders `request` into PNG bytes of exactly `request.size`.
    ///
    /// # Errors
    ///
    /// The first fatal condition met: invalid configuration, coordinates
    /// outside the Mercator domain, no zoom reaching the minimum size, an
    /// escalated tile failure, or an invalid crop.
    #[instrument(skip(self, request), fields(bounds = %request.bounds, size = %request.size))]
    pub async fn render(&self, request: &MosaicRequest) -> Result<Vec<u8>, MosaicError> {
        request.validate()?;

        let projector = MercatorProjector::new(request.tile_size);
        let bounds = if request.fit_aspect {
            let fitted = fit_bounds(&projector, &request.bounds, request.size)?;
            debug!(fitted = %fitted, "Fitted bounds to output aspect ratio");
            fitted
        } else {
            request.bounds
        };
        let (sw, ne) = (bounds.sw(), bounds.ne());

        let zoom = match request.zoom_level {
            Some(z) if z > MAX_ZOOM => return Err(CoordError::InvalidZoom(z).into()),
            Some(z) => z,
            None => {
                let z = select_zoom(&projector, sw, ne, request.min_size())?;
                if request.retina {
                    retina_zoom(z)
                } else {
                    z
                }
            }
        };

        let grid = build_grid(&projector, sw, ne, zoom)?;
        let placements = grid.placements(request.tile_size);
        info!(
            zoom,
            rows = grid.rows(),
            columns = grid.columns(),
            tiles = placements.len(),
            "Rendering mosaic"
        );

        let started = Instant::now();
        let tiles = fetch_all(
            Arc::clone(&self.client),
            &request.template,
            &placements,
            &request.fetch_options(),
        )
        .await?;
        log_timing(request.measure_timing, "download", started.elapsed());

        let crop = crop_rect(&projector, &grid, sw, ne)?;
        debug!(?crop, "Computed crop rectangle");

        let compositor = self.compositor.clone().unwrap_or_else(|| {
            Arc::new(ImageCompositor::new(Rgba(request.background))) as Arc<dyn Compositor>
        });
        let job = RasterJob {
            compositor,
            tiles,
            grid,
            crop,
            tile_size: request.tile_size,
            width: request.size.width,
            height: request.size.height,
            debug_dir: request.debug_dir.clone(),
            measure_timing: request.measure_timing,
        };

        tokio::task::spawn_blocking(move || job.run()).await?
    }
}

/// Everything after the fetch barrier, run on the blocking pool.
struct RasterJob {
    compositor: Arc<dyn Compositor>,
    tiles: Vec<FetchedTile>,
    grid: TileGrid,
    crop: CropRect,
    tile_size: u32,
    width: u32,
    height: u32,
    debug_dir: Option<std::path::PathBuf>,
    measure_timing: bool,
}

impl RasterJob {
    fn run(self) -> Result<Vec<u8>, MosaicError> {
        let dump = self
            .debug_dir
            .as_ref()
            .map(|dir| DebugDump::create(dir))
            .transpose()?;
        if let Some(dump) = &dump {
            for tile in &self.tiles {
                dump.write_tile(tile.coord, &tile.bytes)?;
            }
        }

        let started = Instant::now();
        let canvas = assemble(
            self.compositor.as_ref(),
            &self.tiles,
            &self.grid,
            self.tile_size,
        );
        drop(self.tiles);
        log_timing(self.measure_timing, "stitch", started.elapsed());

        if let Some(dump) = &dump {
            dump.write_marked(&canvas, &self.crop)?;
        }

        let started = Instant::now();
        let CropRect {
            left,
            top,
            width,
            height,
        } = self.crop;
        let cropped = raster::extract(&canvas, left, top, width, height);
        drop(canvas);
        let resized = raster::resize(cropped, self.width, self.height)?;
        let png = raster::encode_png(&resized)?;
        log_timing(self.measure_timing, "crop", started.elapsed());

        if let Some(dump) = &dump {
            dump.write_output(&png)?;
        }

        Ok(png)
    }
}

fn log_timing(enabled: bool, stage: &'static str, elapsed: Duration) {
    if enabled {
        info!(stage, elapsed_ms = elapsed.as_millis() as u64, "Stage timing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{GeoBox, PixelSize};
    use crate::fetch::{FetchError, MockAsyncHttpClient};
    use crate::raster::tests::solid_png;
    use std::sync::atomic::Ordering;

    const TEMPLATE: &str = "http://tiles.test/{z}/{x}/{y}.png";

    fn renderer(client: MockAsyncHttpClient) -> MosaicRenderer<MockAsyncHttpClient> {
        MosaicRenderer::new(Arc::new(client))
    }

    /// Quarter-inset box spanning the 2×2 grid at zoom 1.
    fn zoom_one_request() -> MosaicRequest {
        MosaicRequest::new(
            GeoBox::new(-45.0, -90.0, 45.0, 90.0),
            PixelSize::new(200, 150),
            TEMPLATE,
        )
        .with_zoom_level(1)
    }

    #[tokio::test]
    async fn test_render_outputs_requested_size() {
        let client = MockAsyncHttpClient::new(Ok(solid_png(256, [0, 128, 0, 255])));
        let png = renderer(client).render(&zoom_one_request()).await.unwrap();

        let image = raster::decode(&png).unwrap();
        assert_eq!(image.dimensions(), (200, 150));
    }

    #[tokio::test]
    async fn test_explicit_zoom_above_cap_is_out_of_range() {
        let client = MockAsyncHttpClient::new(Ok(vec![]));
        let request = zoom_one_request().with_zoom_level(19);

        let err = renderer(client).render(&request).await.unwrap_err();
        assert!(matches!(
            err,
            MosaicError::OutOfRange(CoordError::InvalidZoom(19))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_fetches_nothing() {
        let client = Arc::new(MockAsyncHttpClient::new(Ok(vec![])));
        let request = zoom_one_request().with_concurrency(0);

        let err = MosaicRenderer::new(Arc::clone(&client))
            .render(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, MosaicError::InvalidConfig(_)));
        assert_eq!(client.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_latitude_aborts() {
        let client = MockAsyncHttpClient::new(Ok(vec![]));
        let request = MosaicRequest::new(
            GeoBox::new(10.0, 10.0, 88.0, 20.0),
            PixelSize::new(100, 100),
            TEMPLATE,
        );

        let err = renderer(client).render(&request).await.unwrap_err();
        assert!(matches!(err, MosaicError::OutOfRange(_)));
    }

    #[tokio::test]
    async fn test_unreachable_minimum_is_no_zoom_found() {
        let client = MockAsyncHttpClient::new(Ok(vec![]));
        let request = MosaicRequest::new(
            GeoBox::new(60.0, 24.0, 60.0000001, 24.0000001),
            PixelSize::new(100, 100),
            TEMPLATE,
        )
        .with_min_size(5000, 5000);

        let err = renderer(client).render(&request).await.unwrap_err();
        assert!(matches!(err, MosaicError::NoZoomFound { .. }));
    }

    #[tokio::test]
    async fn test_swapped_corners_are_invalid_crop() {
        let client = MockAsyncHttpClient::new(Ok(solid_png(256, [0, 0, 0, 255])));
        // Corners swapped within one column of tiles
        let request = MosaicRequest::new(
            GeoBox::new(60.3, 25.5, 59.9, 24.5),
            PixelSize::new(100, 100),
            TEMPLATE,
        )
        .with_zoom_level(6);

        let err = renderer(client).render(&request).await.unwrap_err();
        assert!(matches!(err, MosaicError::InvalidCrop(_)));
    }

    #[tokio::test]
    async fn test_retina_fetches_one_zoom_deeper() {
        // The whole world first reaches 500×400 pixels at zoom 1
        let client = Arc::new(MockAsyncHttpClient::new(Ok(solid_png(256, [1, 1, 1, 255]))));
        let request = MosaicRequest::new(
            GeoBox::new(-85.0, -180.0, 85.0, 180.0),
            PixelSize::new(64, 64),
            TEMPLATE,
        )
        .with_min_size(500, 400);

        MosaicRenderer::new(Arc::clone(&client))
            .render(&request)
            .await
            .unwrap();

        // Zoom 2 covers the world with 4×4 tiles
        assert_eq!(client.requests.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn test_escalated_tile_failure_is_tile_fetch() {
        let client = MockAsyncHttpClient::new(Ok(solid_png(256, [0, 0, 0, 255]))).with_response(
            "http://tiles.test/1/1/0.png",
            Err(FetchError::Status {
                status: 503,
                url: "http://tiles.test/1/1/0.png".to_string(),
            }),
        );
        let request = zoom_one_request().with_fail_on_tile_error(true);

        let err = renderer(client).render(&request).await.unwrap_err();
        match err {
            MosaicError::TileFetch(e) => assert_eq!(e.tile.to_string(), "1/1/0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_debug_dump_writes_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockAsyncHttpClient::new(Ok(solid_png(256, [0, 0, 255, 255])));
        let request = zoom_one_request()
            .with_debug_dir(dir.path())
            .with_measure_timing(true);

        let png = renderer(client).render(&request).await.unwrap();

        for name in ["1-0-0.png", "1-1-1.png", "stitched-marks.png", "stitched.png"] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }
        assert_eq!(std::fs::read(dir.path().join("stitched.png")).unwrap(), png);
    }
}

//! TileMosaic - render map regions from tiled map sources
//!
//! Given a geographic bounding box, an output size and a tile URL template,
//! this library picks a zoom level, fetches the covering Web Mercator tiles
//! concurrently, stitches them into one canvas and crops it to exactly the
//! requested box.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tilemosaic::config::MosaicRequest;
//! use tilemosaic::coord::{GeoBox, PixelSize};
//! use tilemosaic::fetch::ReqwestClient;
//! use tilemosaic::mosaic::MosaicRenderer;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = MosaicRenderer::new(Arc::new(ReqwestClient::new()?));
//! let request = MosaicRequest::new(
//!     GeoBox::new(60.15, 24.90, 60.19, 24.98),
//!     PixelSize::new(800, 600),
//!     "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
//! );
//! let _png = renderer.render(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coord;
pub mod fetch;
pub mod logging;
pub mod mosaic;
pub mod raster;

pub use config::MosaicRequest;
pub use mosaic::{MosaicError, MosaicRenderer};

//! Error types for tile fetching.

use std::time::Duration;

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors that can occur while fetching a single tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Transport-level failure (connection, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The fetch did not complete within the per-tile timeout.
    #[error("timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The fetch task ended without producing a result.
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// A fetch failure attributed to the tile it was for.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to fetch tile {tile}: {source}")]
pub struct TileFetchError {
    pub tile: TileCoord,
    #[source]
    pub source: FetchError,
}

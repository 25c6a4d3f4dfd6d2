//! Tile fetching with bounded concurrency.
//!
//! Every tile of a grid is fetched from a URL template. At most
//! `concurrency` requests are in flight at once, each bounded by a per-tile
//! timeout. Failures either abort the whole batch or leave the tile absent,
//! depending on [`FetchOptions::fail_on_tile_error`].
//!
//! All fetches complete before anything is returned; results come back in
//! grid order regardless of completion order.

mod error;
mod http;

pub use error::{FetchError, TileFetchError};
pub use http::{AsyncHttpClient, ReqwestClient};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_TILE_TIMEOUT};
use crate::coord::TileCoord;
use crate::mosaic::TilePlacement;

/// Fetch behaviour for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum fetches in flight.
    pub concurrency: usize,
    /// Upper bound on a single tile fetch.
    pub timeout: Duration,
    /// Abort the batch on the first failed tile instead of leaving it absent.
    pub fail_on_tile_error: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TILE_TIMEOUT,
            fail_on_tile_error: false,
        }
    }
}

/// Raw tile bytes with their canvas placement.
///
/// Empty `bytes` marks a tile that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTile {
    pub coord: TileCoord,
    pub bytes: Vec<u8>,
    pub top: u32,
    pub left: u32,
}

impl FetchedTile {
    fn new(placement: TilePlacement, bytes: Vec<u8>) -> Self {
        Self {
            coord: placement.coord,
            bytes,
            top: placement.top,
            left: placement.left,
        }
    }

    /// Whether this tile has no image data.
    pub fn is_absent(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Substitutes every `{x}`, `{y}` and `{z}` in `template`.
pub fn build_url(template: &str, coord: TileCoord) -> String {
    template
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
        .replace("{z}", &coord.z.to_string())
}

/// Fetches every placement's tile.
///
/// # Errors
///
/// With `fail_on_tile_error` set, the first failure is returned and the
/// remaining fetches are aborted. Otherwise this never fails: failed tiles
/// come back with empty bytes.
#[instrument(skip(client, placements, options), fields(tiles = placements.len()))]
pub async fn fetch_all<C>(
    client: Arc<C>,
    template: &str,
    placements: &[TilePlacement],
    options: &FetchOptions,
) -> Result<Vec<FetchedTile>, TileFetchError>
where
    C: AsyncHttpClient + 'static,
{
    // Zero is rejected by request validation; never build a semaphore that cannot be acquired.
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut downloads = JoinSet::new();
    let mut task_slots = HashMap::with_capacity(placements.len());

    for (slot, placement) in placements.iter().enumerate() {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let url = build_url(template, placement.coord);
        let timeout = options.timeout;

        let handle = downloads.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            fetch_tile(client.as_ref(), &url, timeout).await
        });
        task_slots.insert(handle.id(), slot);
    }

    let mut results: Vec<Option<Vec<u8>>> = vec![None; placements.len()];
    let mut failed = 0usize;

    while let Some(joined) = downloads.join_next_with_id().await {
        let (slot, outcome) = match joined {
            Ok((id, outcome)) => (task_slots[&id], outcome),
            Err(join_err) => (
                task_slots[&join_err.id()],
                Err(FetchError::Task(join_err.to_string())),
            ),
        };
        let tile = placements[slot].coord;

        match outcome {
            Ok(bytes) => results[slot] = Some(bytes),
            Err(source) if options.fail_on_tile_error => {
                downloads.abort_all();
                return Err(TileFetchError { tile, source });
            }
            Err(source) => {
                warn!(tile = %tile, error = %source, "Tile fetch failed, leaving tile blank");
                failed += 1;
            }
        }
    }

    debug!(
        fetched = placements.len() - failed,
        failed = failed,
        "Tile fetch complete"
    );

    Ok(placements
        .iter()
        .zip(results)
        .map(|(placement, bytes)| FetchedTile::new(*placement, bytes.unwrap_or_default()))
        .collect())
}

async fn fetch_tile<C>(client: &C, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>
where
    C: AsyncHttpClient + ?Sized,
{
    match tokio::time::timeout(timeout, client.get(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }),
    }
}

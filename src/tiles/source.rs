use crate::core::geo::TileCoord;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A tile overlay that owns a queryable cache and an async loader.
///
/// The renderer reads the cache synchronously on every draw pass and only
/// calls [`load_tile`](CachingTileSource::load_tile) for tiles it could not
/// find. The loader is expected to write the cache before it settles so the
/// redraw that follows picks the tile up.
#[async_trait]
pub trait CachingTileSource: Send + Sync + 'static {
    /// Cached bytes for `coord`, if present. Must return quickly and never
    /// touch the network.
    fn cached_data(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>>;

    /// Fetch the tile. Errors are absorbed by the renderer; retry policy, if
    /// any, belongs here.
    async fn load_tile(&self, coord: &TileCoord) -> Result<Arc<Vec<u8>>>;

    /// Tile size in screen points, `(width, height)`
    fn tile_size(&self) -> (f64, f64) {
        let size = crate::core::constants::TILE_SIZE as f64;
        (size, size)
    }
}


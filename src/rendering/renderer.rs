//! The caching tile render loop.
//!
//! Every draw pass enumerates the tiles covering the visible map rect at the
//! estimated zoom level and, per tile:
//!
//! 1. draws the exact tile if the source has it cached, otherwise
//! 2. draws a cropped ancestor if one is cached close enough, and
//! 3. starts a fetch unless one is already in flight for that key.
//!
//! Fetches run detached on the configured spawner. When one settles its key is
//! released and a [`RedrawRequest`] for the tile's map rect is queued for the
//! host's render thread to pick up.

use crate::core::bounds::Bounds;
use crate::core::config::OverlayConfig;
use crate::core::geo::TileCoord;
use crate::core::zoom::ZoomLevelEstimator;
use crate::runtime::{self, AsyncSpawner};
use crate::tiles::{CachingTileSource, FallbackResolver, InFlightSet};
use crate::traits::DrawingBackend;
use crate::MapError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// Ask the host to redraw a tile's region after its fetch settled
#[derive(Debug, Clone, PartialEq)]
pub struct RedrawRequest {
    pub coord: TileCoord,
    pub map_rect: Bounds,
}

/// What one draw pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub zoom: u8,
    pub tiles: usize,
    pub exact: usize,
    pub fallback: usize,
    pub blank: usize,
    pub fetches_started: usize,
    pub fetches_in_flight: usize,
}

pub struct CachingTileRenderer<S: CachingTileSource> {
    source: Arc<S>,
    config: OverlayConfig,
    overlay_rect: Bounds,
    resolver: FallbackResolver,
    zoom: ZoomLevelEstimator,
    loading_tiles: Arc<InFlightSet>,
    spawner: Arc<dyn AsyncSpawner>,
    redraw_tx: Sender<RedrawRequest>,
    redraw_rx: Receiver<RedrawRequest>,
}

impl<S: CachingTileSource> CachingTileRenderer<S> {
    /// Renderer whose fetches run on the Tokio runtime the caller is inside
    #[cfg(feature = "tokio-runtime")]
    pub fn new(source: Arc<S>, config: OverlayConfig) -> Result<Self, MapError> {
        let spawner = crate::runtime::TokioSpawner::current().ok_or_else(|| {
            MapError::Runtime("no Tokio runtime is running on this thread".to_string())
        })?;
        Self::with_spawner(source, config, Arc::new(spawner))
    }

    pub fn with_spawner(
        source: Arc<S>,
        config: OverlayConfig,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Result<Self, MapError> {
        config.validate()?;

        let (tile_width, tile_height) = source.tile_size();
        if !(tile_width.is_finite() && tile_width > 0.0 && tile_height.is_finite() && tile_height > 0.0) {
            return Err(MapError::Config(format!(
                "tile size must be positive, got {}x{}",
                tile_width, tile_height
            )));
        }

        let (redraw_tx, redraw_rx) = unbounded();
        Ok(Self {
            overlay_rect: Bounds::from_origin_size(0.0, 0.0, config.world_size, config.world_size),
            resolver: FallbackResolver::new(config.max_fallback_depth),
            zoom: ZoomLevelEstimator::from_config(tile_width, &config),
            loading_tiles: Arc::new(InFlightSet::new()),
            source,
            config,
            spawner,
            redraw_tx,
            redraw_rx,
        })
    }

    /// Restrict the overlay to `rect` instead of the whole world. Tile
    /// indices count from its top-left corner and each level splits `rect`
    /// into a `2^z x 2^z` grid.
    pub fn with_overlay_rect(mut self, rect: Bounds) -> Self {
        self.overlay_rect = rect;
        self
    }

    /// Share an in-flight set with other renderers of the same source
    pub fn with_in_flight_set(mut self, loading_tiles: Arc<InFlightSet>) -> Self {
        self.loading_tiles = loading_tiles;
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn overlay_rect(&self) -> &Bounds {
        &self.overlay_rect
    }

    pub fn in_flight(&self) -> &Arc<InFlightSet> {
        &self.loading_tiles
    }

    pub fn zoom_level(&self, zoom_scale: f64) -> u8 {
        self.zoom.level_for(zoom_scale)
    }

    /// Tiles intersecting `map_rect` at `zoom_scale`, with their map rects,
    /// column-major like the draw order.
    ///
    /// Tiles split the overlay rect into a `2^z x 2^z` grid at the estimated
    /// level, so they cover it exactly at any scale.
    pub fn visible_tiles(&self, map_rect: &Bounds, zoom_scale: f64) -> Vec<(TileCoord, Bounds)> {
        if !(zoom_scale.is_finite() && zoom_scale > 0.0) {
            return Vec::new();
        }

        let z = self.zoom_level(zoom_scale);
        let grid = 1i64 << z;
        let tile_map_width = self.overlay_rect.width() / grid as f64;
        let tile_map_height = self.overlay_rect.height() / grid as f64;
        if !(tile_map_width > 0.0 && tile_map_height > 0.0) {
            return Vec::new();
        }

        let origin = self.overlay_rect.min;
        let index = |value: f64, offset: f64, size: f64| ((value - offset) / size).floor() as i64;

        let first_col = index(map_rect.min.x, origin.x, tile_map_width).max(0);
        let last_col = index(map_rect.max.x, origin.x, tile_map_width).min(grid - 1);
        let first_row = index(map_rect.min.y, origin.y, tile_map_height).max(0);
        let last_row = index(map_rect.max.y, origin.y, tile_map_height).min(grid - 1);

        let mut tiles = Vec::new();
        for col in first_col..=last_col {
            for row in first_row..=last_row {
                let coord = TileCoord::with_scale(col as u32, row as u32, z, self.config.content_scale);
                debug_assert!(coord.is_valid());
                let tile_rect = Bounds::from_origin_size(
                    origin.x + col as f64 * tile_map_width,
                    origin.y + row as f64 * tile_map_height,
                    tile_map_width,
                    tile_map_height,
                );
                tiles.push((coord, tile_rect));
            }
        }
        tiles
    }

    /// Run one draw pass over `map_rect`. Never blocks on I/O.
    pub fn draw<B: DrawingBackend>(
        &self,
        map_rect: &Bounds,
        zoom_scale: f64,
        backend: &mut B,
    ) -> DrawStats {
        let mut stats = DrawStats {
            zoom: self.zoom_level(zoom_scale),
            ..DrawStats::default()
        };

        for (coord, tile_rect) in self.visible_tiles(map_rect, zoom_scale) {
            stats.tiles += 1;
            let draw_rect = backend.rect_for_map_rect(&tile_rect);

            if let Some(image) = self.cached_image(&coord, backend) {
                backend.draw(&image, &draw_rect);
                stats.exact += 1;
                continue;
            }

            match self.resolver.resolve(&coord, |c| self.cached_image(c, &*backend)) {
                Some(fallback) => {
                    log::trace!(
                        "tile {} drawn from ancestor {} ({} levels up)",
                        coord,
                        fallback.ancestor,
                        fallback.depth
                    );
                    backend.draw(&fallback.image, &draw_rect);
                    stats.fallback += 1;
                }
                None => stats.blank += 1,
            }

            self.load_tile_if_needed(coord, tile_rect, &mut stats);
        }

        log::debug!(
            "draw pass z={} tiles={} exact={} fallback={} blank={} fetches={}",
            stats.zoom,
            stats.tiles,
            stats.exact,
            stats.fallback,
            stats.blank,
            stats.fetches_started
        );
        stats
    }

    /// Redraw requests queued by settled fetches, oldest first (non-blocking)
    pub fn drain_redraw_requests(&self) -> Vec<RedrawRequest> {
        self.redraw_rx.try_iter().collect()
    }

    /// Receiver for hosts that prefer to select or block on redraw requests
    pub fn redraw_receiver(&self) -> &Receiver<RedrawRequest> {
        &self.redraw_rx
    }

    fn cached_image<B: DrawingBackend>(&self, coord: &TileCoord, backend: &B) -> Option<B::Image> {
        let bytes = self.source.cached_data(coord)?;
        let image = backend.decode(&bytes);
        if image.is_none() {
            log::debug!("cached bytes for tile {} did not decode, treating as a miss", coord);
        }
        image
    }

    fn load_tile_if_needed(&self, coord: TileCoord, tile_rect: Bounds, stats: &mut DrawStats) {
        let Some(guard) = self.loading_tiles.begin(coord.key()) else {
            stats.fetches_in_flight += 1;
            return;
        };
        stats.fetches_started += 1;
        log::debug!("loading tile {}", coord);

        let source = Arc::clone(&self.source);
        let redraw_tx = self.redraw_tx.clone();
        runtime::spawn(self.spawner.as_ref(), async move {
            match source.load_tile(&coord).await {
                Ok(data) => log::debug!("tile {} settled with {} bytes", coord, data.len()),
                Err(e) => log::warn!("tile {} failed to load: {}", coord, e),
            }

            // Release the key before the redraw so the next pass may refetch.
            drop(guard);
            let _ = redraw_tx.send(RedrawRequest {
                coord,
                map_rect: tile_rect,
            });
        });
    }
}

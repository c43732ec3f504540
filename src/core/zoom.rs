//! Zoom level estimation from a continuous render scale.
//!
//! The host exposes only a scale factor (screen points per map point), not a
//! zoom level. There is no exact inverse of its projection, so the level is
//! approximated as
//!
//! ```text
//! level = max(0, round_half_up(log2(world_size / tile_size) + log2(scale)))
//! ```
//!
//! Callers must tolerate an off-by-one level right at scale transitions.

use crate::core::config::OverlayConfig;
use crate::core::constants::MAX_ZOOM;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevelEstimator {
    tile_size: f64,
    world_size: f64,
    max_zoom: u8,
}

impl ZoomLevelEstimator {
    pub fn new(tile_size: f64, world_size: f64) -> Self {
        Self {
            tile_size,
            world_size,
            max_zoom: MAX_ZOOM,
        }
    }

    pub fn from_config(tile_size: f64, config: &OverlayConfig) -> Self {
        Self::new(tile_size, config.world_size).with_max_zoom(config.max_zoom)
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom.min(MAX_ZOOM);
        self
    }

    /// Number of tiles across the world at scale 1.0
    pub fn tiles_at_full_zoom(&self) -> f64 {
        self.world_size / self.tile_size
    }

    /// Estimated integer zoom level for `scale`. Degenerate input (zero,
    /// negative or non-finite) falls back to level 0.
    pub fn level_for(&self, scale: f64) -> u8 {
        let num_tiles = self.tiles_at_full_zoom();
        if !(scale.is_finite() && scale > 0.0 && num_tiles.is_finite() && num_tiles > 0.0) {
            return 0;
        }

        let level = (num_tiles.log2() + scale.log2() + 0.5).floor();
        level.clamp(0.0, self.max_zoom as f64) as u8
    }
}

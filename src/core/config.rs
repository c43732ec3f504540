//! Configuration for the caching tile overlay
//!
//! Overlays can be configured from a preset profile or from a custom
//! [`OverlayConfig`], optionally loaded from JSON.

use crate::core::constants::{DEFAULT_CONTENT_SCALE, MAX_FALLBACK_DEPTH, MAX_ZOOM, WORLD_SIZE};
use crate::MapError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayProfile {
    /// Overzoom up to two levels while exact tiles load
    Balanced,
    /// Only overzoom the direct parent
    Crisp,
    /// Never draw fallbacks; tiles stay blank until loaded
    NoFallback,
    Custom(OverlayConfig),
}

impl OverlayProfile {
    pub fn resolve(&self) -> OverlayConfig {
        match self {
            Self::Balanced => OverlayConfig::default(),
            Self::Crisp => OverlayConfig {
                max_fallback_depth: 1,
                ..OverlayConfig::default()
            },
            Self::NoFallback => OverlayConfig {
                max_fallback_depth: 0,
                ..OverlayConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for OverlayProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// How many zoom levels the fallback search may climb (at most 2)
    pub max_fallback_depth: u8,
    /// Width of the world in the host's map units
    pub world_size: f64,
    /// Highest zoom level the estimator reports
    pub max_zoom: u8,
    /// Display content scale stamped on every requested tile
    pub content_scale: f64,
}

impl OverlayConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let config: OverlayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.max_fallback_depth > MAX_FALLBACK_DEPTH {
            return Err(MapError::Config(format!(
                "max_fallback_depth {} exceeds the limit of {}",
                self.max_fallback_depth, MAX_FALLBACK_DEPTH
            )));
        }
        if !(self.world_size.is_finite() && self.world_size > 0.0) {
            return Err(MapError::Config(format!(
                "world_size must be positive, got {}",
                self.world_size
            )));
        }
        if !(self.content_scale.is_finite() && self.content_scale > 0.0) {
            return Err(MapError::Config(format!(
                "content_scale must be positive, got {}",
                self.content_scale
            )));
        }
        if self.max_zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "max_zoom {} exceeds the limit of {}",
                self.max_zoom, MAX_ZOOM
            )));
        }
        Ok(())
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_fallback_depth: MAX_FALLBACK_DEPTH,
            world_size: WORLD_SIZE,
            max_zoom: MAX_ZOOM,
            content_scale: DEFAULT_CONTENT_SCALE,
        }
    }
}

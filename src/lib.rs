//! # overzoom
//!
//! A caching tile overlay renderer for slippy maps.
//!
//! Each draw pass shows the best tile available right now: the exact tile from
//! the local cache, or a cropped ancestor from up to two zoom levels above while
//! the exact tile is fetched. At most one fetch per tile key is in flight at any
//! time, and a settled fetch asks the host to redraw the tile's region.

pub mod core;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod tiles;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    config::{OverlayConfig, OverlayProfile},
    geo::{Point, TileCoord, TileKey},
    zoom::ZoomLevelEstimator,
};

pub use tiles::{
    cache::TileCache,
    fallback::{crop_rect, Fallback, FallbackResolver},
    http::{HttpSourceOptions, HttpTileSource},
    in_flight::{InFlightGuard, InFlightSet},
    source::CachingTileSource,
};

pub use rendering::renderer::{CachingTileRenderer, DrawStats, RedrawRequest};

#[cfg(feature = "render")]
pub use rendering::context::{DrawCommand, RenderContext};

pub use traits::{DrawingBackend, RasterImage};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "render")]
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = MapError;

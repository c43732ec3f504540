//! Tile identity services: cache, fetch deduplication and fallback resolution

pub mod cache;
pub mod fallback;
pub mod http;
pub mod in_flight;
pub mod source;

// Re-exports for convenience
pub use cache::TileCache;
pub use fallback::{Fallback, FallbackResolver};
pub use http::{HttpSourceOptions, HttpTileSource};
pub use in_flight::{InFlightGuard, InFlightSet};
pub use source::CachingTileSource;

//! Core constants for the tile grid and the host's map space.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Width of the whole world in map points (2^28), the unit the host's map
/// rectangles are expressed in.
pub const WORLD_SIZE: f64 = 268_435_456.0;

/// Furthest an ancestor may be from the requested tile and still be used as a
/// fallback. Beyond this a blank tile beats an over-crushed one.
pub const MAX_FALLBACK_DEPTH: u8 = 2;

/// Highest zoom level the estimator will report. Keeps `1 << z` inside `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Content scale of a standard-resolution display.
pub const DEFAULT_CONTENT_SCALE: f64 = 1.0;

#[cfg(feature = "render")]
pub mod context;
pub mod renderer;

// Re-export main types
#[cfg(feature = "render")]
pub use context::{DrawCommand, RenderContext};
pub use renderer::{CachingTileRenderer, DrawStats, RedrawRequest};

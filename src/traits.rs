//! Drawing-side capabilities the renderer consumes
//!
//! The renderer never touches pixels itself. A backend supplies decoding,
//! cropping, map-to-screen projection and the final draw call, so the fallback
//! and dedup logic exists exactly once regardless of the host toolkit.

use crate::core::bounds::Bounds;

/// An opaque decoded raster with a known size that can be cropped.
pub trait RasterImage: Sized {
    /// Width in image units
    fn width(&self) -> f64;

    /// Height in image units
    fn height(&self) -> f64;

    /// A new image holding the `rect` sub-rectangle, or `None` if the backend
    /// cannot produce it.
    fn crop(&self, rect: &Bounds) -> Option<Self>;
}

/// Host drawing surface for one draw pass.
pub trait DrawingBackend {
    type Image: RasterImage;

    /// Decode cached tile bytes. Undecodable bytes are `None` and treated as a
    /// cache miss.
    fn decode(&self, bytes: &[u8]) -> Option<Self::Image>;

    /// Project a map-space rectangle onto the drawing surface
    fn rect_for_map_rect(&self, map_rect: &Bounds) -> Bounds;

    /// Draw `image` stretched into `rect` (surface coordinates)
    fn draw(&mut self, image: &Self::Image, rect: &Bounds);
}

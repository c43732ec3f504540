//! Reference drawing backend built on the `image` crate.
//!
//! `RenderContext` decodes tile bytes into [`DynamicImage`]s, projects map
//! rects with `(map - origin) * zoom_scale`, and records what would be drawn.
//! Hosts with a real surface replay the queue; tests inspect it.

use crate::core::{bounds::Bounds, geo::Point};
use crate::traits::{DrawingBackend, RasterImage};
use image::{DynamicImage, GenericImageView};

impl RasterImage for DynamicImage {
    fn width(&self) -> f64 {
        GenericImageView::width(self) as f64
    }

    fn height(&self) -> f64 {
        GenericImageView::height(self) as f64
    }

    /// Edges are rounded to whole pixels, so neighbouring crop rects stay
    /// gap-free even when the size doesn't divide evenly.
    fn crop(&self, rect: &Bounds) -> Option<Self> {
        let (width, height) = GenericImageView::dimensions(self);
        let x0 = (rect.min.x.round().max(0.0) as u32).min(width);
        let y0 = (rect.min.y.round().max(0.0) as u32).min(height);
        let x1 = (rect.max.x.round().max(0.0) as u32).min(width);
        let y1 = (rect.max.y.round().max(0.0) as u32).min(height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(self.crop_imm(x0, y0, x1 - x0, y1 - y0))
    }
}

/// A tile image queued for drawing
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub image: DynamicImage,
    /// min, max screen coordinates
    pub bounds: Bounds,
}

/// Recording render context for a fixed-size surface
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Map point shown at the surface's top-left corner
    pub origin: Point,
    /// Screen pixels per map point
    pub zoom_scale: f64,
    /// Drawing primitives queue (for now just stored, actual rendering would happen elsewhere)
    pub drawing_queue: Vec<DrawCommand>,
    /// Draws that fell entirely outside the surface
    pub culled: usize,
}

impl RenderContext {
    /// Create a new render context
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            origin: Point::default(),
            zoom_scale: 1.0,
            drawing_queue: Vec::new(),
            culled: 0,
        }
    }

    /// Point the surface at `origin` with `zoom_scale` screen pixels per map point
    pub fn with_view(mut self, origin: Point, zoom_scale: f64) -> Self {
        self.set_view(origin, zoom_scale);
        self
    }

    pub fn set_view(&mut self, origin: Point, zoom_scale: f64) {
        self.origin = origin;
        self.zoom_scale = zoom_scale;
    }

    /// Map rect currently covered by the surface
    pub fn visible_map_rect(&self) -> Bounds {
        Bounds::from_origin_size(
            self.origin.x,
            self.origin.y,
            self.width as f64 / self.zoom_scale,
            self.height as f64 / self.zoom_scale,
        )
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
        self.culled = 0;
    }

    fn surface_bounds(&self) -> Bounds {
        Bounds::from_origin_size(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

impl DrawingBackend for RenderContext {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Option<DynamicImage> {
        match image::load_from_memory(bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                log::debug!("tile decode failed: {}", e);
                None
            }
        }
    }

    fn rect_for_map_rect(&self, map_rect: &Bounds) -> Bounds {
        map_rect.transformed(&self.origin, self.zoom_scale)
    }

    fn draw(&mut self, image: &DynamicImage, rect: &Bounds) {
        // Touching edges still count as intersecting; skip those too.
        let visible = self
            .surface_bounds()
            .intersection(rect)
            .map(|overlap| overlap.area() > 0.0)
            .unwrap_or(false);
        if !visible {
            self.culled += 1;
            return;
        }

        self.drawing_queue.push(DrawCommand {
            image: image.clone(),
            bounds: rect.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn quadrant_image(size: u32) -> DynamicImage {
        let half = size / 2;
        DynamicImage::ImageRgba8(RgbaImage::from_fn(size, size, |x, y| {
            let q = (x >= half) as u8 + 2 * (y >= half) as u8;
            Rgba([q * 60, 0, 0, 255])
        }))
    }

    #[test]
    fn test_crop_bottom_right_quadrant() {
        let image = quadrant_image(256);
        let cropped =
            RasterImage::crop(&image, &Bounds::from_origin_size(128.0, 128.0, 128.0, 128.0)).unwrap();

        assert_eq!(GenericImageView::dimensions(&cropped), (128, 128));
        assert_eq!(cropped.to_rgba8().get_pixel(0, 0)[0], 180);
        assert_eq!(cropped.to_rgba8().get_pixel(127, 127)[0], 180);
    }

    #[test]
    fn test_crop_outside_image_is_none() {
        let image = quadrant_image(16);
        assert!(RasterImage::crop(&image, &Bounds::from_origin_size(16.0, 0.0, 8.0, 8.0)).is_none());
        assert!(RasterImage::crop(&image, &Bounds::from_origin_size(4.0, 4.0, 0.2, 0.2)).is_none());
    }

    #[test]
    fn test_uneven_crops_have_no_gaps() {
        let image = quadrant_image(250);
        let quarter = 250.0 / 4.0;
        let widths: u32 = (0..4)
            .map(|i| {
                let rect = Bounds::from_origin_size(i as f64 * quarter, 0.0, quarter, quarter);
                GenericImageView::width(&RasterImage::crop(&image, &rect).unwrap())
            })
            .sum();
        assert_eq!(widths, 250);
    }

    #[test]
    fn test_projection_and_culling() {
        let mut ctx = RenderContext::new(256, 256).with_view(Point::new(1000.0, 1000.0), 0.5);
        assert_eq!(ctx.visible_map_rect(), Bounds::from_coords(1000.0, 1000.0, 1512.0, 1512.0));

        let rect = ctx.rect_for_map_rect(&Bounds::from_coords(1000.0, 1256.0, 1512.0, 1768.0));
        assert_eq!(rect, Bounds::from_coords(0.0, 128.0, 256.0, 384.0));

        let image = quadrant_image(4);
        ctx.draw(&image, &rect);
        ctx.draw(&image, &Bounds::from_coords(256.0, 0.0, 512.0, 256.0));
        assert_eq!(ctx.drawing_queue.len(), 1);
        assert_eq!(ctx.culled, 1);

        ctx.begin_frame();
        assert!(ctx.drawing_queue.is_empty());
        assert_eq!(ctx.culled, 0);
    }

    #[test]
    fn test_decode_garbage_is_none() {
        let ctx = RenderContext::new(1, 1);
        assert!(ctx.decode(b"definitely not a png").is_none());
    }
}

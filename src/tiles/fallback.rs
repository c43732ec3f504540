//! Overzoomed fallback tiles.
//!
//! While an exact tile is missing, the nearest cached ancestor (at most
//! `max_depth` levels up) is cropped down to the part covering the requested
//! tile. At distance `d` an ancestor splits into a `2^d x 2^d` grid and the
//! requested tile owns the cell at `(x mod 2^d, y mod 2^d)`.

use crate::core::bounds::Bounds;
use crate::core::constants::MAX_FALLBACK_DEPTH;
use crate::core::geo::TileCoord;
use crate::traits::RasterImage;

/// A cropped ancestor image standing in for a missing tile
#[derive(Debug, Clone)]
pub struct Fallback<I> {
    pub image: I,
    pub ancestor: TileCoord,
    pub depth: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackResolver {
    max_depth: u8,
}

impl FallbackResolver {
    /// Depth is capped at [`MAX_FALLBACK_DEPTH`]
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth: max_depth.min(MAX_FALLBACK_DEPTH),
        }
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Walk up from `requested` and crop the first ancestor `lookup` returns.
    ///
    /// Never climbs past zoom 0 or beyond `max_depth` levels; an ancestor
    /// cached further up is ignored.
    pub fn resolve<I, F>(&self, requested: &TileCoord, mut lookup: F) -> Option<Fallback<I>>
    where
        I: RasterImage,
        F: FnMut(&TileCoord) -> Option<I>,
    {
        let mut cursor = *requested;
        let mut depth = 0;

        while cursor.z > 0 && depth < self.max_depth {
            depth += 1;
            cursor = cursor.parent().ok()?;

            if let Some(image) = lookup(&cursor) {
                let rect = crop_rect(depth, requested, image.width(), image.height());
                let cropped = image.crop(&rect);
                if cropped.is_none() {
                    log::debug!("could not crop fallback {} for tile {}", cursor, requested);
                }
                return cropped.map(|image| Fallback {
                    image,
                    ancestor: cursor,
                    depth,
                });
            }
        }

        None
    }
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::new(MAX_FALLBACK_DEPTH)
    }
}

/// The sub-rectangle of an ancestor image `depth` levels above `requested`
/// that covers `requested`, for an ancestor image of `width x height`.
pub fn crop_rect(depth: u8, requested: &TileCoord, width: f64, height: f64) -> Bounds {
    let factor = 1u32 << depth;
    let rem_x = requested.x % factor;
    let rem_y = requested.y % factor;

    let sub_width = width / factor as f64;
    let sub_height = height / factor as f64;
    Bounds::from_origin_size(
        rem_x as f64 * sub_width,
        rem_y as f64 * sub_height,
        sub_width,
        sub_height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the region of the original ancestor it represents
    #[derive(Debug, Clone, PartialEq)]
    struct FakeImage {
        source: TileCoord,
        region: Bounds,
    }

    impl FakeImage {
        fn tile(source: TileCoord) -> Self {
            Self {
                source,
                region: Bounds::from_origin_size(0.0, 0.0, 256.0, 256.0),
            }
        }
    }

    impl RasterImage for FakeImage {
        fn width(&self) -> f64 {
            self.region.width()
        }

        fn height(&self) -> f64 {
            self.region.height()
        }

        fn crop(&self, rect: &Bounds) -> Option<Self> {
            Some(Self {
                source: self.source,
                region: rect.clone(),
            })
        }
    }

    #[test]
    fn test_direct_parent_bottom_right_quadrant() {
        let requested = TileCoord::new(5, 3, 4);
        let cached = TileCoord::new(2, 1, 3);

        let fallback = FallbackResolver::default()
            .resolve(&requested, |c| (*c == cached).then(|| FakeImage::tile(*c)))
            .expect("parent is cached");

        assert_eq!(fallback.ancestor, cached);
        assert_eq!(fallback.depth, 1);
        assert_eq!(fallback.image.region, Bounds::from_origin_size(128.0, 128.0, 128.0, 128.0));
    }

    #[test]
    fn test_grandparent_crop() {
        let requested = TileCoord::new(5, 3, 4);
        let grandparent = TileCoord::new(1, 0, 2);

        let fallback = FallbackResolver::default()
            .resolve(&requested, |c| (*c == grandparent).then(|| FakeImage::tile(*c)))
            .unwrap();

        // 5 % 4 = 1, 3 % 4 = 3 on a 64px grid
        assert_eq!(fallback.depth, 2);
        assert_eq!(fallback.image.region, Bounds::from_origin_size(64.0, 192.0, 64.0, 64.0));
    }

    #[test]
    fn test_prefers_nearest_ancestor() {
        let requested = TileCoord::new(5, 3, 4);
        let fallback = FallbackResolver::default()
            .resolve(&requested, |c| Some(FakeImage::tile(*c)))
            .unwrap();
        assert_eq!(fallback.ancestor, TileCoord::new(2, 1, 3));
    }

    #[test]
    fn test_ascent_is_bounded() {
        let requested = TileCoord::new(5, 3, 4);
        let queried = RefCell::new(Vec::new());

        // Only the great-grandparent is cached, three levels up.
        let result = FallbackResolver::default().resolve(&requested, |c| {
            queried.borrow_mut().push(*c);
            (c.z == 1).then(|| FakeImage::tile(*c))
        });

        assert!(result.is_none());
        assert_eq!(
            queried.into_inner(),
            vec![TileCoord::new(2, 1, 3), TileCoord::new(1, 0, 2)]
        );
    }

    #[test]
    fn test_stops_at_root() {
        let queried = RefCell::new(Vec::new());
        let result = FallbackResolver::default().resolve(&TileCoord::new(1, 0, 1), |c| {
            queried.borrow_mut().push(*c);
            None::<FakeImage>
        });
        assert!(result.is_none());
        assert_eq!(queried.into_inner(), vec![TileCoord::new(0, 0, 0)]);

        let mut calls = 0;
        let root = FallbackResolver::default().resolve(&TileCoord::new(0, 0, 0), |_| {
            calls += 1;
            None::<FakeImage>
        });
        assert!(root.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_zero_depth_never_looks_up() {
        let mut calls = 0;
        let result = FallbackResolver::new(0).resolve(&TileCoord::new(5, 3, 4), |c| {
            calls += 1;
            Some(FakeImage::tile(*c))
        });
        assert!(result.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_depth_is_capped() {
        assert_eq!(FallbackResolver::new(9).max_depth(), MAX_FALLBACK_DEPTH);
    }

    #[test]
    fn test_failed_crop_is_absent() {
        struct Uncroppable;
        impl RasterImage for Uncroppable {
            fn width(&self) -> f64 {
                256.0
            }
            fn height(&self) -> f64 {
                256.0
            }
            fn crop(&self, _rect: &Bounds) -> Option<Self> {
                None
            }
        }

        let result = FallbackResolver::default().resolve(&TileCoord::new(3, 3, 2), |_| Some(Uncroppable));
        assert!(result.is_none());
    }

    #[test]
    fn test_crop_rects_partition_the_ancestor() {
        let (width, height) = (256.0, 192.0);
        for depth in 0..=MAX_FALLBACK_DEPTH {
            let factor = 1u32 << depth;
            let mut area = 0.0;
            let mut rects = Vec::new();

            for rem_y in 0..factor {
                for rem_x in 0..factor {
                    // Any tile with these remainders; offset by a whole grid to
                    // check only the remainder matters.
                    let requested = TileCoord::new(rem_x + 3 * factor, rem_y + factor, 6);
                    let rect = crop_rect(depth, &requested, width, height);

                    assert_eq!(rect.width(), width / factor as f64);
                    assert_eq!(rect.height(), height / factor as f64);
                    assert_eq!(rect.min.x, rem_x as f64 * width / factor as f64);
                    assert_eq!(rect.min.y, rem_y as f64 * height / factor as f64);
                    area += rect.area();
                    rects.push(rect);
                }
            }

            assert_eq!(area, width * height);
            for (i, a) in rects.iter().enumerate() {
                for b in rects.iter().skip(i + 1) {
                    let overlap = a.intersection(b).map(|r| r.area()).unwrap_or(0.0);
                    assert_eq!(overlap, 0.0, "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }
}

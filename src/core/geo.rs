use crate::core::constants::{DEFAULT_CONTENT_SCALE, MAX_ZOOM};
use crate::MapError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a point in map, screen or image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A tile in the slippy map pyramid, at a given display content scale.
///
/// Identity is the full `(x, y, z, scale)` tuple; two coordinates that compare
/// equal always produce the same [`TileKey`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
    pub scale: f64,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self::with_scale(x, y, z, DEFAULT_CONTENT_SCALE)
    }

    pub fn with_scale(x: u32, y: u32, z: u8, scale: f64) -> Self {
        Self { x, y, z, scale }
    }

    /// The tile one level up that geographically contains this one.
    ///
    /// Zoom 0 has no parent; asking for one is a caller bug and yields
    /// [`MapError::InvalidArgument`].
    pub fn parent(&self) -> Result<TileCoord, MapError> {
        if self.z == 0 {
            return Err(MapError::InvalidArgument(format!(
                "tile {} is at zoom 0 and has no parent",
                self.key()
            )));
        }
        // Unsigned division floors, so odd indices land on (x - 1) / 2.
        Ok(TileCoord::with_scale(self.x / 2, self.y / 2, self.z - 1, self.scale))
    }

    /// The ancestor `depth` levels up (`depth == 0` is the tile itself).
    pub fn ancestor(&self, depth: u8) -> Result<TileCoord, MapError> {
        let mut cursor = *self;
        for _ in 0..depth {
            cursor = cursor.parent()?;
        }
        Ok(cursor)
    }

    /// Gets the child tiles at the next zoom level, row-major
    pub fn children(&self) -> Vec<TileCoord> {
        if self.z >= MAX_ZOOM {
            Vec::new()
        } else {
            let (x, y, z) = (self.x * 2, self.y * 2, self.z + 1);
            vec![
                TileCoord::with_scale(x, y, z, self.scale),
                TileCoord::with_scale(x + 1, y, z, self.scale),
                TileCoord::with_scale(x, y + 1, z, self.scale),
                TileCoord::with_scale(x + 1, y + 1, z, self.scale),
            ]
        }
    }

    /// Checks that `x` and `y` lie inside the `2^z` grid
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let max_coord = 1u32 << self.z;
        self.x < max_coord && self.y < max_coord
    }

    /// Canonical cache and dedup key, `z/x/y@scale`
    pub fn key(&self) -> TileKey {
        TileKey::from(self)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}@{:?}", self.z, self.x, self.y, self.scale)
    }
}

/// Canonical string identity of a tile: `z/x/y@scale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey(String);

impl TileKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&TileCoord> for TileKey {
    fn from(coord: &TileCoord) -> Self {
        TileKey(coord.to_string())
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_floors_odd_indices() {
        let coord = TileCoord::new(5, 3, 4);
        let parent = coord.parent().unwrap();
        assert_eq!(parent, TileCoord::new(2, 1, 3));

        let even = TileCoord::new(6, 2, 4).parent().unwrap();
        assert_eq!(even, TileCoord::new(3, 1, 3));
    }

    #[test]
    fn test_parent_matches_floor_division() {
        for z in 1..=6u8 {
            let n = 1u32 << z;
            for x in 0..n {
                for y in 0..n {
                    let parent = TileCoord::new(x, y, z).parent().unwrap();
                    assert_eq!((parent.x, parent.y, parent.z), (x >> 1, y >> 1, z - 1));
                    assert!(parent.is_valid());
                }
            }
        }
    }

    #[test]
    fn test_parent_keeps_scale() {
        let parent = TileCoord::with_scale(7, 7, 3, 2.0).parent().unwrap();
        assert_eq!(parent.scale, 2.0);
    }

    #[test]
    fn test_parent_of_root_is_invalid_argument() {
        let err = TileCoord::new(0, 0, 0).parent().unwrap_err();
        assert!(matches!(err, MapError::InvalidArgument(_)));
    }

    #[test]
    fn test_ancestor() {
        let coord = TileCoord::new(13, 6, 5);
        assert_eq!(coord.ancestor(0).unwrap(), coord);
        assert_eq!(coord.ancestor(2).unwrap(), TileCoord::new(3, 1, 3));
        assert!(coord.ancestor(6).is_err());
    }

    #[test]
    fn test_children_round_trip_to_parent() {
        let coord = TileCoord::new(2, 1, 3);
        let children = coord.children();
        assert_eq!(children.len(), 4);
        for child in children {
            assert_eq!(child.parent().unwrap(), coord);
        }
    }

    #[test]
    fn test_is_valid() {
        assert!(TileCoord::new(0, 0, 0).is_valid());
        assert!(!TileCoord::new(1, 0, 0).is_valid());
        assert!(TileCoord::new(15, 15, 4).is_valid());
        assert!(!TileCoord::new(16, 0, 4).is_valid());
    }

    #[test]
    fn test_key_format() {
        assert_eq!(TileCoord::new(5, 3, 4).key().as_str(), "4/5/3@1.0");
        assert_eq!(TileCoord::with_scale(5, 3, 4, 2.0).key().as_str(), "4/5/3@2.0");
    }

    #[test]
    fn test_equal_coords_equal_keys() {
        let a = TileCoord::with_scale(9, 4, 6, 3.0);
        let b = TileCoord::with_scale(9, 4, 6, 3.0);
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), TileCoord::with_scale(9, 4, 6, 2.0).key());
    }
}

use std::f64::consts::PI;
use std::fmt;

use crate::bounding_box::BoundingBox;
use crate::error::TileError;
use crate::math::{clamp, wrap};
use crate::projection::tile_corner_to_lat_lon;
use crate::quadkey::{quadkey_to_tile_xy, tile_xy_to_quadkey};

/// Equatorial radius of the WGS84 ellipsoid in metres.
pub const EARTH_RADIUS: f64 = 6_378_137_f64;

/// The deepest level of detail whose tile indices fit into an `i32`.
pub const MAX_LOD: u8 = 30;

/// Tiles at or below this level have no children.
pub const MAX_CHILD_LOD: u8 = 21;

/// A tile in the global quadtree raster pyramid.
///
/// The origin is the top-left (north-west) corner of the map, x grows towards
/// the east and y towards the south. One unit equals one tile of 256×256 pixels.
///
/// x wraps around the antimeridian, y is clamped at the poles.
///
/// # Example
/// ```rust
/// # use tile_downloader::TileKey;
/// let tile = TileKey::new(-1, 7, 2);
/// assert_eq!((tile.x(), tile.y(), tile.lod()), (3, 3, 2));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TileKey {
    x: i32,
    y: i32,
    lod: u8,
}

impl TileKey {
    /// Creates a normalized tile key, wrapping `x` and clamping `y` into the
    /// index range of `lod`.
    ///
    /// # Panics
    /// Panics if `lod` is greater than [`MAX_LOD`].
    pub fn new(x: i32, y: i32, lod: u8) -> Self {
        Self::with_normalize(x, y, lod, true)
    }

    /// Creates a tile key, normalizing the indices only if `normalize` is set.
    ///
    /// # Panics
    /// Panics if `lod` is greater than [`MAX_LOD`].
    pub fn with_normalize(x: i32, y: i32, lod: u8, normalize: bool) -> Self {
        assert!(lod <= MAX_LOD, "level of detail {} exceeds {}", lod, MAX_LOD);

        if !normalize {
            return Self { x, y, lod };
        }

        Self {
            x: wrap(x, min_value(lod), extent(lod)),
            y: clamp(y, min_value(lod), max_value(lod)),
            lod,
        }
    }

    /// Parses a quadkey into the tile it addresses.
    ///
    /// # Example
    /// ```rust
    /// # use tile_downloader::TileKey;
    /// let tile = TileKey::from_quadkey("33").unwrap();
    /// assert_eq!(tile, TileKey::new(3, 3, 2));
    /// ```
    pub fn from_quadkey(quadkey: &str) -> Result<Self, TileError> {
        let (x, y, lod) = quadkey_to_tile_xy(quadkey)?;
        Ok(Self::new(x, y, lod))
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn lod(&self) -> u8 {
        self.lod
    }

    pub fn west_bound(&self) -> i32 {
        self.x
    }

    pub fn north_bound(&self) -> i32 {
        self.y
    }

    /// The column east of this tile, wrapped around the antimeridian.
    pub fn east_bound(&self) -> i32 {
        wrap(self.x + 1, min_value(self.lod), extent(self.lod))
    }

    /// The row south of this tile. Not clamped, so it equals `extent(lod)`
    /// for the southernmost row.
    pub fn south_bound(&self) -> i32 {
        self.y + 1
    }

    /// The quadkey addressing this tile.
    pub fn quadkey(&self) -> String {
        tile_xy_to_quadkey(self.x, self.y, self.lod)
    }

    /// Whether `other` lies within this tile at the same or a finer level.
    pub fn is_ancestor_of(&self, other: &TileKey) -> bool {
        if self.lod > other.lod {
            return false;
        }

        let shift = u32::from(other.lod - self.lod);
        (other.x >> shift) == self.x && (other.y >> shift) == self.y
    }

    /// The tile containing this one at the coarser level `lod`.
    pub fn ancestor_at_lod(&self, lod: u8) -> Result<TileKey, TileError> {
        if lod > self.lod {
            return Err(TileError::InvalidLevel {
                lod: self.lod,
                requested: i32::from(lod),
            });
        }

        let shift = u32::from(self.lod - lod);
        Ok(TileKey::new(self.x >> shift, self.y >> shift, lod))
    }

    /// The tile one level up. Fails at level 0.
    pub fn parent(&self) -> Result<TileKey, TileError> {
        match self.lod.checked_sub(1) {
            Some(lod) => self.ancestor_at_lod(lod),
            None => Err(TileError::InvalidLevel {
                lod: self.lod,
                requested: -1,
            }),
        }
    }

    /// The four tiles covering `tile` one level down, or none once `tile` is
    /// at [`MAX_CHILD_LOD`].
    ///
    /// A key built without normalization yields the children of its
    /// normalized form.
    pub fn children_of(tile: &TileKey) -> Vec<TileKey> {
        if tile.lod >= MAX_CHILD_LOD {
            return Vec::new();
        }

        let parent = TileKey::new(tile.x, tile.y, tile.lod);
        let (x, y, lod) = (2 * parent.x, 2 * parent.y, parent.lod + 1);
        vec![
            TileKey::new(x, y, lod),
            TileKey::new(x, y + 1, lod),
            TileKey::new(x + 1, y, lod),
            TileKey::new(x + 1, y + 1, lod),
        ]
    }

    /// Moves the tile by `(dx, dy)`.
    ///
    /// The flag is false if the moved indices left the index range before
    /// normalization. With `normalize` set, x may leave the range since it
    /// wraps around. An offset overflowing `i32` returns the tile unchanged
    /// with a false flag.
    pub fn offset(&self, dx: i32, dy: i32, normalize: bool) -> (TileKey, bool) {
        let (min, max) = (min_value(self.lod), max_value(self.lod));
        let (x, y) = match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => (x, y),
            _ => return (*self, false),
        };

        let in_range =
            (normalize || (x >= min && x <= max)) && y >= min && y <= max;

        (TileKey::with_normalize(x, y, self.lod, normalize), in_range)
    }

    pub fn west(&self, normalize: bool) -> (TileKey, bool) {
        self.offset(-1, 0, normalize)
    }

    pub fn east(&self, normalize: bool) -> (TileKey, bool) {
        self.offset(1, 0, normalize)
    }

    pub fn north(&self, normalize: bool) -> (TileKey, bool) {
        self.offset(0, -1, normalize)
    }

    pub fn south(&self, normalize: bool) -> (TileKey, bool) {
        self.offset(0, 1, normalize)
    }

    /// The surrounding tiles of the 8-neighborhood that lie in range.
    ///
    /// Ordered by x offset first, then y offset, both from -1 to 1.
    pub fn neighbors(&self, normalize: bool) -> Vec<TileKey> {
        let mut neighbors = Vec::with_capacity(8);

        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let (neighbor, in_range) = self.offset(dx, dy, normalize);
                if in_range {
                    neighbors.push(neighbor);
                }
            }
        }

        neighbors
    }

    /// The geographic area covered by this tile.
    ///
    /// The south-east corner is taken from the unwrapped `(x + 1, y + 1)`
    /// corner, so the easternmost column ends at 180° instead of wrapping
    /// back to -180°.
    pub fn geo_bbox(&self) -> BoundingBox {
        let (north, west) =
            tile_corner_to_lat_lon(self.west_bound(), self.north_bound(), self.lod);
        let (south, east) =
            tile_corner_to_lat_lon(self.x + 1, self.south_bound(), self.lod);

        BoundingBox::new(south, west, north, east)
    }

    /// The `(lat, lon)` center of [`geo_bbox`](Self::geo_bbox).
    pub fn center(&self) -> (f64, f64) {
        let bbox = self.geo_bbox();
        ((bbox.south + bbox.north) / 2_f64, (bbox.west + bbox.east) / 2_f64)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.lod)
    }
}

/// Number of tiles per axis at `lod`.
pub fn extent(lod: u8) -> i32 {
    1 << lod
}

pub fn min_value(_lod: u8) -> i32 {
    0
}

pub fn max_value(lod: u8) -> i32 {
    extent(lod) - 1
}

/// Width and height of the whole map at `lod` in pixels.
pub fn map_size(lod: u8) -> u64 {
    256_u64 << lod
}

/// Ground width of a tile at `lod` along the equator in metres.
pub fn tile_size(lod: u8) -> f64 {
    tile_size_with_radius(lod, EARTH_RADIUS)
}

/// Width of a tile at `lod` along the equator of a sphere of `radius`.
pub fn tile_size_with_radius(lod: u8, radius: f64) -> f64 {
    2_f64 * PI * radius / f64::from(extent(lod))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn normalizes_any_index() {
        for lod in 0..=6 {
            for x in -70..70 {
                for y in -70..70 {
                    let tile = TileKey::new(x, y, lod);
                    assert!(tile.x() >= 0 && tile.x() <= max_value(lod));
                    assert!(tile.y() >= 0 && tile.y() <= max_value(lod));
                }
            }
        }
    }

    #[test]
    fn wraps_x_clamps_y() {
        assert_eq!(TileKey::new(4, 5, 2), TileKey::new(0, 3, 2));
        assert_eq!(TileKey::new(-1, -1, 2), TileKey::new(3, 0, 2));
        assert_eq!(TileKey::new(9, 0, 0), TileKey::new(0, 0, 0));
    }

    #[test]
    fn keeps_raw_indices_unnormalized() {
        let tile = TileKey::with_normalize(-1, 9, 2, false);
        assert_eq!((tile.x(), tile.y()), (-1, 9));
    }

    #[test]
    #[should_panic]
    fn rejects_too_deep_levels() {
        TileKey::new(0, 0, MAX_LOD + 1);
    }

    #[test]
    fn equality_and_hash_use_all_fields() {
        let set: HashSet<TileKey> = vec![
            TileKey::new(1, 2, 3),
            TileKey::new(1, 2, 3),
            TileKey::new(2, 1, 3),
            TileKey::new(1, 2, 4),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn bounds() {
        let tile = TileKey::new(3, 3, 2);
        assert_eq!(tile.west_bound(), 3);
        assert_eq!(tile.north_bound(), 3);
        assert_eq!(tile.east_bound(), 0);
        assert_eq!(tile.south_bound(), 4);

        let tile = TileKey::new(1, 2, 2);
        assert_eq!(tile.east_bound(), 2);
        assert_eq!(tile.south_bound(), 3);
    }

    #[test]
    fn display() {
        assert_eq!(TileKey::new(5, 6, 7).to_string(), "(5, 6, 7)");
    }

    #[test]
    fn ancestors() {
        let tile = TileKey::new(13, 6, 4);
        assert_eq!(tile.ancestor_at_lod(4), Ok(tile));
        assert_eq!(tile.ancestor_at_lod(2), Ok(TileKey::new(3, 1, 2)));
        assert_eq!(tile.ancestor_at_lod(0), Ok(TileKey::new(0, 0, 0)));
        assert_eq!(tile.parent(), tile.ancestor_at_lod(3));

        for lod in 0..=4 {
            let ancestor = tile.ancestor_at_lod(lod).unwrap();
            assert!(ancestor.is_ancestor_of(&tile));
        }
    }

    #[test]
    fn ancestor_at_finer_level_fails() {
        let tile = TileKey::new(1, 1, 2);
        assert_eq!(
            tile.ancestor_at_lod(3),
            Err(TileError::InvalidLevel { lod: 2, requested: 3 })
        );
        assert!(TileKey::new(0, 0, 0).parent().is_err());
    }

    #[test]
    fn ancestor_relation() {
        let tile = TileKey::new(5, 2, 3);
        assert!(TileKey::new(1, 0, 1).is_ancestor_of(&tile));
        assert!(!TileKey::new(0, 0, 1).is_ancestor_of(&tile));
        assert!(!tile.is_ancestor_of(&TileKey::new(1, 0, 1)));
        assert!(tile.is_ancestor_of(&tile));
    }

    #[test]
    fn children() {
        let tile = TileKey::new(1, 2, 3);
        let children = TileKey::children_of(&tile);
        assert_eq!(
            children,
            vec![
                TileKey::new(2, 4, 4),
                TileKey::new(2, 5, 4),
                TileKey::new(3, 4, 4),
                TileKey::new(3, 5, 4),
            ]
        );

        for child in children {
            assert_eq!(child.parent(), Ok(tile));
        }
    }

    #[test]
    fn children_stop_at_max_child_lod() {
        assert_eq!(TileKey::children_of(&TileKey::new(0, 0, 20)).len(), 4);
        assert!(TileKey::children_of(&TileKey::new(0, 0, 21)).is_empty());
        assert!(TileKey::children_of(&TileKey::new(0, 0, 25)).is_empty());
    }

    #[test]
    fn offsets() {
        let tile = TileKey::new(0, 0, 2);
        assert_eq!(tile.west(true), (TileKey::new(3, 0, 2), true));
        assert_eq!(tile.west(false), (TileKey::with_normalize(-1, 0, 2, false), false));
        assert_eq!(tile.north(true), (TileKey::new(0, 0, 2), false));
        assert_eq!(tile.east(false), (TileKey::new(1, 0, 2), true));
        assert_eq!(tile.south(true), (TileKey::new(0, 1, 2), true));
    }

    #[test]
    fn offsets_of_extreme_raw_indices() {
        let tile = TileKey::with_normalize(i32::MAX, 0, 2, false);
        assert_eq!(tile.east(false), (tile, false));
        assert_eq!(tile.east(true), (tile, false));
        assert!(!tile.offset(0, 1, false).1);

        assert!(tile.neighbors(false).is_empty());
        assert_eq!(
            tile.neighbors(true),
            vec![TileKey::new(2, 0, 2), TileKey::new(2, 1, 2), TileKey::new(3, 1, 2)]
        );

        let bottom = TileKey::with_normalize(0, i32::MAX, 2, false);
        assert_eq!(bottom.south(true), (bottom, false));
    }

    #[test]
    fn children_of_raw_key_use_normalized_parent() {
        let tile = TileKey::with_normalize(i32::MAX, 0, 2, false);
        assert_eq!(
            TileKey::children_of(&tile),
            TileKey::children_of(&TileKey::new(3, 0, 2))
        );
        assert_eq!(TileKey::children_of(&tile)[0], TileKey::new(6, 0, 3));
    }

    #[rstest]
    #[case(1, 1, true, 8)]
    #[case(1, 1, false, 8)]
    #[case(0, 1, true, 8)]
    #[case(0, 1, false, 5)]
    #[case(3, 2, false, 5)]
    #[case(1, 0, true, 5)]
    #[case(1, 0, false, 5)]
    #[case(2, 3, true, 5)]
    #[case(0, 0, true, 5)]
    #[case(0, 0, false, 3)]
    #[case(3, 3, false, 3)]
    fn neighbor_counts(
        #[case] x: i32,
        #[case] y: i32,
        #[case] normalize: bool,
        #[case] count: usize,
    ) {
        let neighbors = TileKey::new(x, y, 2).neighbors(normalize);
        assert_eq!(neighbors.len(), count);
    }

    #[test]
    fn neighbor_order() {
        let neighbors = TileKey::new(0, 0, 2).neighbors(true);
        assert_eq!(
            neighbors,
            vec![
                TileKey::new(3, 0, 2),
                TileKey::new(3, 1, 2),
                TileKey::new(0, 1, 2),
                TileKey::new(1, 0, 2),
                TileKey::new(1, 1, 2),
            ]
        );

        let neighbors = TileKey::new(0, 0, 2).neighbors(false);
        assert_eq!(
            neighbors,
            vec![
                TileKey::new(0, 1, 2),
                TileKey::new(1, 0, 2),
                TileKey::new(1, 1, 2),
            ]
        );
    }

    #[test]
    fn map_and_tile_sizes() {
        assert_eq!(extent(0), 1);
        assert_eq!(extent(3), 8);
        assert_eq!(max_value(3), 7);
        assert_eq!(map_size(0), 256);
        assert_eq!(map_size(2), 1024);
        assert!((tile_size(0) - 40_075_016.685_578_49).abs() < 1e-6);
        assert_eq!(tile_size_with_radius(1, 1_f64), PI);
    }

    #[test]
    fn world_tile_bbox() {
        let bbox = TileKey::new(0, 0, 0).geo_bbox();
        assert_eq!(bbox.west, -180_f64);
        assert_eq!(bbox.east, 180_f64);
        assert_eq!(bbox.north, crate::projection::MAX_LATITUDE);
        assert_eq!(bbox.south, crate::projection::MIN_LATITUDE);
    }

    #[test]
    fn tile_bbox_and_center() {
        let bbox = TileKey::new(1, 0, 1).geo_bbox();
        assert_eq!(bbox.west, 0_f64);
        assert_eq!(bbox.east, 180_f64);
        assert_eq!(bbox.north, crate::projection::MAX_LATITUDE);
        assert!(bbox.south.abs() < 1e-9);

        let (lat, lon) = TileKey::new(0, 1, 1).center();
        assert!(lat < 0_f64);
        assert_eq!(lon, -90_f64);
    }
}

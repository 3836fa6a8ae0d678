use std::fmt::Debug;

use crate::projection::{lat_lon_to_tile, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};
use crate::tile::TileKey;

/// A geographic bounding box with south, west, north and east boundaries
/// given in degrees.
///
/// Coordinates outside the projectable world are accepted and clamped onto
/// its border whenever they are projected to tiles.
///
/// # Example
/// ```rust
/// # use tile_downloader::BoundingBox;
/// let aachen_germany = BoundingBox::new(50.7492, 6.031, 50.811, 6.1649);
/// assert_eq!(aachen_germany.tiles(10, 10).count(), 1);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// The whole projectable world.
    pub const WORLD: BoundingBox = BoundingBox {
        south: MIN_LATITUDE,
        west: MIN_LONGITUDE,
        north: MAX_LATITUDE,
        east: MAX_LONGITUDE,
    };

    /// Create a new bounding box from coordinates given in degrees.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        BoundingBox {
            south,
            west,
            north,
            east,
        }
    }

    /// The inclusive `(x, y)` index ranges of the tiles covering the box at `lod`.
    fn tile_range(&self, lod: u8) -> ((i32, i32), (i32, i32)) {
        let from = lat_lon_to_tile(self.north, self.west, lod);
        let to = lat_lon_to_tile(self.south, self.east, lod);

        (
            (from.x().min(to.x()), from.x().max(to.x())),
            (from.y().min(to.y()), from.y().max(to.y())),
        )
    }

    /// Creates an iterator iterating over all tiles in the bounding box for
    /// every level of detail in `min_lod..=max_lod`, column by column.
    ///
    /// Yields nothing if `min_lod > max_lod`.
    pub fn tiles(
        &self,
        min_lod: u8,
        max_lod: u8,
    ) -> impl Iterator<Item = TileKey> + Debug {
        let bbox = *self;

        (min_lod..=max_lod).flat_map(move |lod| {
            let ((x0, x1), (y0, y1)) = bbox.tile_range(lod);

            (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| TileKey::new(x, y, lod)))
        })
    }

    /// Counts the tiles [`tiles`](Self::tiles) yields without enumerating them.
    pub fn tile_count(&self, min_lod: u8, max_lod: u8) -> u64 {
        (min_lod..=max_lod)
            .map(|lod| {
                let ((x0, x1), (y0, y1)) = self.tile_range(lod);
                (x1 - x0 + 1) as u64 * (y1 - y0 + 1) as u64
            })
            .sum()
    }
}

impl From<TileKey> for BoundingBox {
    fn from(tile: TileKey) -> Self {
        tile.geo_bbox()
    }
}

/// A bounding box fixture containing preset coordinates for a known geographic
/// region (a continent, country, city, etc).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fixture {
    World,
    USA,
    AachenGermany,
}

impl std::str::FromStr for Fixture {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Fixture::*;

        let s = s.to_lowercase();

        if s.starts_with("world") {
            return Ok(World);
        }

        if s.starts_with("us") {
            return Ok(USA);
        }

        if s.starts_with("aachen") {
            return Ok(AachenGermany);
        }

        Err("unrecognized fixture")
    }
}

impl std::convert::From<Fixture> for BoundingBox {
    fn from(fixture: Fixture) -> Self {
        use Fixture::*;

        match fixture {
            World => Self::WORLD,
            USA => Self::new(23.8991, -125.3321, 49.4325, -65.7421),
            AachenGermany => Self::new(50.7492, 6.031, 50.811, 6.1649),
        }
    }
}

//! Tile information reports for positions and tile indices.

use std::fmt;

use crate::bounding_box::BoundingBox;
use crate::projection::{lat_lon_to_tile, tile_to_lat_lon};
use crate::tile::TileKey;

const TABLE_WIDTH: usize = 100;
const TABLE_TITLE: &str = "Tile Info";

/// Location and extent of a single tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileInfo {
    pub tile: TileKey,

    /// Latitude of the top-left corner.
    pub lat: f64,

    /// Longitude of the top-left corner.
    pub lon: f64,

    pub bbox: BoundingBox,
}

impl TileInfo {
    pub fn new(tile: TileKey) -> Self {
        let (lat, lon) = tile_to_lat_lon(tile.x(), tile.y(), tile.lod());

        Self {
            tile,
            lat,
            lon,
            bbox: tile.geo_bbox(),
        }
    }

    /// Information about the tile containing the given position.
    pub fn from_position(lat: f64, lon: f64, lod: u8) -> Self {
        Self::new(lat_lon_to_tile(lat, lon, lod))
    }
}

/// Renders tile infos as a fixed width, numbered table.
///
/// # Example
/// ```rust
/// # use tile_downloader::{TileInfo, TileKey, TileTable};
/// let infos = [TileInfo::new(TileKey::new(0, 0, 0))];
/// let table = TileTable(&infos).to_string();
/// assert!(table.contains("-180.00000"));
/// ```
pub struct TileTable<'a>(pub &'a [TileInfo]);

impl fmt::Display for TileTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = "-".repeat((TABLE_WIDTH - TABLE_TITLE.len()) / 2);
        writeln!(f, "{}{}{}", pad, TABLE_TITLE, pad)?;
        writeln!(
            f,
            "{:<10}{:<12}{:<12}{:<10}{:<10}{:<6}{:<10}{:<10}{:<10}{:<10}",
            "Number", "Lon", "Lat", "X", "Y", "Z", "East", "South", "West", "North"
        )?;

        for (i, info) in self.0.iter().enumerate() {
            writeln!(
                f,
                "{:<10}{:<12.5}{:<12.5}{:<10}{:<10}{:<6}{:<10.5}{:<10.5}{:<10.5}{:<10.5}",
                i + 1,
                info.lon,
                info.lat,
                info.tile.x(),
                info.tile.y(),
                info.tile.lod(),
                info.bbox.east,
                info.bbox.south,
                info.bbox.west,
                info.bbox.north,
            )?;
        }

        writeln!(f, "{}", "-".repeat(TABLE_WIDTH))
    }
}

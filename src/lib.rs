//! Slippy map tile addressing and bulk tile downloading.
//!
//! The core of the crate is [`TileKey`], an address of one tile in the global
//! web mercator raster pyramid, together with the projection between WGS84
//! coordinates and tiles ([`lat_lon_to_tile`], [`tile_to_lat_lon`]) and the
//! quadkey encoding ([`tile_xy_to_quadkey`], [`quadkey_to_tile_xy`]).
//!
//! Around it sit the pieces of a tile downloader: [`BoundingBox`] enumerates
//! the tiles covering an area, [`fetch`] hands each of them to an external
//! fetcher such as `curl`, and [`copy_tiles`] re-lays out an existing cache.
//!
//! # Usage
//!
//! The `tile-downloader` binary features a helpful CLI you can access via
//! `-h` / `--help`.
//!
//! # CLI Example
//!
//! ```bash
//! tile-downloader load \
//!   --bound 50.7492 6.031 50.811 6.1649 \
//!   --min-lod 1 \
//!   --max-lod 14 \
//!   --url "https://{s}.tile.openstreetmap.de/{z}/{x}/{y}.png" \
//!   --output "./tiles/{z}/{x}/{y}.png" \
//!   --parallel 8
//! ```
//!
//! # Library Example
//! ```rust
//! use tile_downloader::{lat_lon_to_tile, TileKey};
//!
//! let tile = lat_lon_to_tile(50.7929, 6.0402, 18);
//! assert_eq!(tile, TileKey::new(135470, 87999, 18));
//!
//! let parent = tile.parent().unwrap();
//! assert!(parent.is_ancestor_of(&tile));
//! assert_eq!(TileKey::from_quadkey(&tile.quadkey()), Ok(tile));
//! ```

mod bounding_box;
mod config;
mod copy;
mod error;
mod fetch;
pub mod math;
mod projection;
mod quadkey;
mod query;
mod template;
mod tile;

pub use bounding_box::{BoundingBox, Fixture};
pub use config::{Config, DEFAULT_PARALLEL, DEFAULT_RETRY_MAX_TIME};
pub use copy::{copy_tiles, CopyReport};
pub use error::TileError;
pub use fetch::{fetch, FetchReport};
pub use projection::{
    lat_lon_to_tile, pixel_to_tile, tile_corner_to_lat_lon, tile_to_lat_lon, tile_to_pixel,
    MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE, TILE_SIZE_PX,
};
pub use quadkey::{quadkey_to_tile_xy, tile_xy_to_quadkey};
pub use query::{TileInfo, TileTable};
pub use template::Template;
pub use tile::{
    extent, map_size, max_value, min_value, tile_size, tile_size_with_radius, TileKey,
    EARTH_RADIUS, MAX_CHILD_LOD, MAX_LOD,
};

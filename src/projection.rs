//! Spherical (web) mercator projection between WGS84 coordinates, pixels of
//! the global raster pyramid and tile indices.
//!
//! ref: https://learn.microsoft.com/en-us/bingmaps/articles/bing-maps-tile-system

use std::f64::consts::PI;

use crate::math::{clamp, DEG_TO_RAD};
use crate::tile::{map_size, TileKey};

/// Southernmost latitude the mercator projection can represent.
pub const MIN_LATITUDE: f64 = -85.051_128_779_8;
/// Northernmost latitude the mercator projection can represent.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;
pub const MIN_LONGITUDE: f64 = -180_f64;
pub const MAX_LONGITUDE: f64 = 180_f64;

/// Edge length of a tile in pixels.
pub const TILE_SIZE_PX: i64 = 256;

/// Projects a WGS84 position (in degrees) to the tile containing it at `lod`.
///
/// Coordinates outside the projectable world are clamped onto its border.
///
/// # Example
/// ```rust
/// # use tile_downloader::{lat_lon_to_tile, TileKey};
/// assert_eq!(lat_lon_to_tile(0.0, 0.0, 0), TileKey::new(0, 0, 0));
/// assert_eq!(lat_lon_to_tile(-45.0, 90.0, 1), TileKey::new(1, 1, 1));
/// ```
pub fn lat_lon_to_tile(lat: f64, lon: f64, lod: u8) -> TileKey {
    let lat = clamp(lat, MIN_LATITUDE, MAX_LATITUDE);
    let lon = clamp(lon, MIN_LONGITUDE, MAX_LONGITUDE);

    let x = (lon + 180_f64) / 360_f64;
    let sin_lat = (lat * DEG_TO_RAD).sin();
    let y = 0.5 - ((1_f64 + sin_lat) / (1_f64 - sin_lat)).ln() / (4_f64 * PI);

    let size = map_size(lod) as f64;
    let pixel_x = clamp(x * size + 0.5, 0_f64, size - 1_f64) as i64;
    let pixel_y = clamp(y * size + 0.5, 0_f64, size - 1_f64) as i64;

    let (tile_x, tile_y) = pixel_to_tile(pixel_x, pixel_y);
    TileKey::new(tile_x, tile_y, lod)
}

/// Returns the `(lat, lon)` of the top-left corner of tile `(x, y)` at `lod`.
///
/// Indices past the map are clamped onto its last pixel.
pub fn tile_to_lat_lon(x: i32, y: i32, lod: u8) -> (f64, f64) {
    let (pixel_x, pixel_y) = tile_to_pixel(x, y);
    let size = map_size(lod) as f64;

    pixel_to_lat_lon(
        clamp(pixel_x as f64, 0_f64, size - 1_f64),
        clamp(pixel_y as f64, 0_f64, size - 1_f64),
        size,
    )
}

/// Returns the `(lat, lon)` of the tile grid corner `(x, y)` at `lod`.
///
/// Unlike [`tile_to_lat_lon`] the corner may sit on the far edge of the map,
/// i.e. `x` and `y` may equal `2^lod`.
pub fn tile_corner_to_lat_lon(x: i32, y: i32, lod: u8) -> (f64, f64) {
    let (pixel_x, pixel_y) = tile_to_pixel(x, y);
    pixel_to_lat_lon(pixel_x as f64, pixel_y as f64, map_size(lod) as f64)
}

fn pixel_to_lat_lon(pixel_x: f64, pixel_y: f64, size: f64) -> (f64, f64) {
    let x = pixel_x / size - 0.5;
    let y = 0.5 - pixel_y / size;

    let lat = 90_f64 - 360_f64 * (-y * 2_f64 * PI).exp().atan() / PI;
    let lon = 360_f64 * x;

    (
        clamp(lat, MIN_LATITUDE, MAX_LATITUDE),
        clamp(lon, MIN_LONGITUDE, MAX_LONGITUDE),
    )
}

/// The tile containing the pixel `(x, y)`.
pub fn pixel_to_tile(pixel_x: i64, pixel_y: i64) -> (i32, i32) {
    (
        pixel_x.div_euclid(TILE_SIZE_PX) as i32,
        pixel_y.div_euclid(TILE_SIZE_PX) as i32,
    )
}

/// The top-left pixel of the tile `(x, y)`.
pub fn tile_to_pixel(tile_x: i32, tile_y: i32) -> (i64, i64) {
    (
        i64::from(tile_x) * TILE_SIZE_PX,
        i64::from(tile_y) * TILE_SIZE_PX,
    )
}

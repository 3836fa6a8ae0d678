use anyhow::{Context, Result};
use maplit::hashmap;
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};
use strfmt::strfmt;

use crate::tile::TileKey;

const SERVER_SHARDS: &[&str] = &["a", "b", "c"];

/// A format string with tile placeholders, used for both the URL a tile is
/// fetched from and the path it is stored at.
///
/// Supported placeholders:
///
/// | placeholder                   | value                                   |
/// |-------------------------------|-----------------------------------------|
/// | `{x}`, `{y}`, `{z}`           | tile column, row and level of detail    |
/// | `{q}`                         | the tile's quadkey                      |
/// | `{south}`, `{west}`, `{north}`, `{east}` | geographic bounds in degrees |
/// | `{center_lat}`, `{center_lon}`| center of the tile in degrees           |
/// | `{s}`                         | rotating server shard `a`, `b` or `c`   |
///
/// # Example
/// ```rust
/// # use tile_downloader::{Template, TileKey};
/// let template = Template::new("https://tiles.example.com/{z}/{x}/{y}.png");
/// let url = template.render(&TileKey::new(3, 5, 4)).unwrap();
/// assert_eq!(url, "https://tiles.example.com/4/3/5.png");
/// ```
pub struct Template {
    inc: AtomicUsize,
    format_str: String,
}

impl Template {
    pub fn new(format_str: impl Into<String>) -> Self {
        Self {
            inc: AtomicUsize::new(0),
            format_str: format_str.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.format_str
    }

    fn next_shard(&self) -> &'static str {
        let inc = self.inc.fetch_add(1, Ordering::Relaxed);
        SERVER_SHARDS[inc % SERVER_SHARDS.len()]
    }

    /// Substitutes the placeholders with the values of `tile`.
    ///
    /// Fails on placeholders not listed above.
    pub fn render(&self, tile: &TileKey) -> Result<String> {
        let bbox = tile.geo_bbox();
        let (center_lat, center_lon) = tile.center();

        let vars = hashmap! {
            "s".to_owned() => self.next_shard().to_owned(),
            "x".to_owned() => tile.x().to_string(),
            "y".to_owned() => tile.y().to_string(),
            "z".to_owned() => tile.lod().to_string(),
            "q".to_owned() => tile.quadkey(),
            "south".to_owned() => bbox.south.to_string(),
            "west".to_owned() => bbox.west.to_string(),
            "north".to_owned() => bbox.north.to_string(),
            "east".to_owned() => bbox.east.to_string(),
            "center_lat".to_owned() => center_lat.to_string(),
            "center_lon".to_owned() => center_lon.to_string(),
        };

        strfmt(&self.format_str, &vars)
            .with_context(|| format!("failed formatting template {:?}", self.format_str))
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.format_str == other.format_str
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("format_str", &self.format_str)
            .finish()
    }
}

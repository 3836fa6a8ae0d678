use std::{fmt::Debug, path::PathBuf, time::Duration};

use crate::bounding_box::BoundingBox;
use crate::template::Template;
use crate::tile::TileKey;

/// Default number of parallel fetches.
pub const DEFAULT_PARALLEL: usize = 32;

/// Default upper bound for the time the fetcher spends retrying one tile.
pub const DEFAULT_RETRY_MAX_TIME: Duration = Duration::from_secs(30);

/// Tile fetching configuration.
#[derive(Debug, PartialEq)]
pub struct Config {
    /// Area to download.
    pub bounding_box: BoundingBox,

    /// The minimum level of detail to download.
    pub min_lod: u8,

    /// The maximum level of detail to download.
    pub max_lod: u8,

    /// The URL to download individual tiles from including the replacement
    /// specifiers `{x}`, `{y}` and `{z}`.
    pub url: Template,

    /// The file each tile is written to, with the same specifiers as `url`.
    pub output: Template,

    /// Proxy handed to the fetcher.
    pub proxy: Option<String>,

    /// How many times the fetcher retries a failed transfer.
    pub retries: u32,

    /// Upper bound for the time the fetcher spends retrying.
    pub retry_max_time: Duration,

    /// Maximum number of parallel downloads.
    pub parallel: usize,

    /// Whether to download tiles whose output file already exists.
    pub fetch_existing: bool,

    /// The curl compatible program used to transfer a single tile.
    pub fetcher: PathBuf,
}

impl Config {
    /// Creates a config with default transfer settings.
    pub fn new(
        bounding_box: BoundingBox,
        min_lod: u8,
        max_lod: u8,
        url: Template,
        output: Template,
    ) -> Self {
        Self {
            bounding_box,
            min_lod,
            max_lod,
            url,
            output,
            proxy: None,
            retries: 0,
            retry_max_time: DEFAULT_RETRY_MAX_TIME,
            parallel: DEFAULT_PARALLEL,
            fetch_existing: false,
            fetcher: PathBuf::from("curl"),
        }
    }

    /// Creates an iterator iterating over all tiles in the contained bounding box.
    pub fn tiles(&self) -> impl Iterator<Item = TileKey> + Debug {
        self.bounding_box.tiles(self.min_lod, self.max_lod)
    }

    /// Number of tiles [`tiles`](Self::tiles) yields.
    pub fn tile_count(&self) -> u64 {
        self.bounding_box.tile_count(self.min_lod, self.max_lod)
    }
}

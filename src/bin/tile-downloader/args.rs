use anyhow::{ensure, Context, Result};
use clap::{
    command, parser::ValueSource, value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command,
};
use log::LevelFilter;
use std::{path::PathBuf, time::Duration};

use crate::validators::*;
use tile_downloader::{
    BoundingBox, Config, Fixture, Template, TileInfo, TileKey, DEFAULT_PARALLEL, MAX_LOD,
};

const LOAD_CMD: &str = "load";
const QUERY_CMD: &str = "query";
const COPY_CMD: &str = "copy";

const VERBOSE_ARG: &str = "verbose";
const QUIET_ARG: &str = "quiet";
const BOUND_ARG: &str = "bound";
const BBOX_FIXTURE_ARG: &str = "fixture";
const LOD_ARG: &str = "lod";
const MIN_LOD_ARG: &str = "min_lod";
const MAX_LOD_ARG: &str = "max_lod";
const URL_ARG: &str = "url";
const OUTPUT_ARG: &str = "output";
const PROXY_ARG: &str = "proxy";
const RETRY_ARG: &str = "retry";
const RETRY_MAX_TIME_ARG: &str = "retry_max_time";
const PARALLEL_ARG: &str = "parallel";
const FETCH_EXISTING_ARG: &str = "should_fetch_existing";
const DRY_RUN_ARG: &str = "dry_run";
const FETCHER_ARG: &str = "fetcher";
const POSITIONS_ARG: &str = "positions";
const TILES_ARG: &str = "tiles";
const SRC_ARG: &str = "src";
const DST_ARG: &str = "dst";

pub struct Args {
    pub log_level: LevelFilter,
    pub command: Subcommand,
}

pub enum Subcommand {
    Load(LoadArgs),
    Query(Vec<TileInfo>),
    Copy(CopyArgs),
}

pub struct LoadArgs {
    pub bounding_box: BoundingBox,
    pub min_lod: u8,
    pub max_lod: u8,
    pub url: String,
    pub output: String,
    pub proxy: Option<String>,
    pub retries: u32,
    pub retry_max_time: Duration,
    pub parallel: usize,
    pub fetch_existing: bool,
    pub dry_run: bool,
    pub fetcher: PathBuf,
}

pub struct CopyArgs {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub parallel: usize,
}

impl std::convert::From<LoadArgs> for Config {
    fn from(args: LoadArgs) -> Self {
        Self {
            bounding_box: args.bounding_box,
            min_lod: args.min_lod,
            max_lod: args.max_lod,
            url: Template::new(args.url),
            output: Template::new(args.output),
            proxy: args.proxy,
            retries: args.retries,
            retry_max_time: args.retry_max_time,
            parallel: args.parallel,
            fetch_existing: args.fetch_existing,
            fetcher: args.fetcher,
        }
    }
}

impl Args {
    pub fn parse() -> Result<Self> {
        Self::from_matches(&build_command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let log_level = match i16::from(matches.get_count(VERBOSE_ARG))
            - i16::from(matches.get_count(QUIET_ARG))
        {
            i16::MIN..=-2 => LevelFilter::Off,
            -1 => LevelFilter::Error,
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        let command = match matches.subcommand() {
            Some((LOAD_CMD, sub)) => Subcommand::Load(parse_load(sub)?),
            Some((QUERY_CMD, sub)) => Subcommand::Query(parse_query(sub)?),
            Some((COPY_CMD, sub)) => Subcommand::Copy(CopyArgs {
                src: required(sub, SRC_ARG)?,
                dst: required(sub, DST_ARG)?,
                parallel: required(sub, PARALLEL_ARG)?,
            }),
            _ => anyhow::bail!("missing subcommand"),
        };

        Ok(Self { log_level, command })
    }
}

fn required<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .with_context(|| format!("missing argument {}", id))
}

fn parse_load(matches: &ArgMatches) -> Result<LoadArgs> {
    let (min_lod, max_lod) = match matches.get_one::<u8>(LOD_ARG) {
        // if `lod` is set, use it for both min/max
        Some(&lod) => (lod, lod),
        // otherwise, parse min/max separately
        None => {
            let min_lod: u8 = required(matches, MIN_LOD_ARG)?;
            let max_lod: u8 = required(matches, MAX_LOD_ARG)?;

            // a defaulted max never ends below an explicit min
            match matches.value_source(MAX_LOD_ARG) {
                Some(ValueSource::DefaultValue) => (min_lod, max_lod.max(min_lod)),
                _ => (min_lod, max_lod),
            }
        }
    };
    ensure!(min_lod <= max_lod, "min lod {} exceeds max lod {}", min_lod, max_lod);

    let bounding_box = match (
        matches.get_one::<Fixture>(BBOX_FIXTURE_ARG),
        matches.get_many::<f64>(BOUND_ARG),
    ) {
        // if a fixture is specified, construct the bounding box from that
        (Some(&fixture), _) => BoundingBox::from(fixture),
        // otherwise use the 4 coords given in south, west, north, east order
        (None, Some(values)) => match values.copied().collect::<Vec<_>>()[..] {
            [south, west, north, east] => BoundingBox::new(south, west, north, east),
            _ => anyhow::bail!("--bound takes exactly four coordinates"),
        },
        (None, None) => BoundingBox::WORLD,
    };

    Ok(LoadArgs {
        bounding_box,
        min_lod,
        max_lod,
        url: required(matches, URL_ARG)?,
        output: required(matches, OUTPUT_ARG)?,
        proxy: matches.get_one::<String>(PROXY_ARG).cloned(),
        retries: required(matches, RETRY_ARG)?,
        retry_max_time: Duration::from_secs(required(matches, RETRY_MAX_TIME_ARG)?),
        parallel: required(matches, PARALLEL_ARG)?,
        fetch_existing: matches.get_flag(FETCH_EXISTING_ARG),
        dry_run: matches.get_flag(DRY_RUN_ARG),
        fetcher: required(matches, FETCHER_ARG)?,
    })
}

fn parse_query(matches: &ArgMatches) -> Result<Vec<TileInfo>> {
    let mut infos = Vec::new();

    if let Some(values) = matches.get_many::<f64>(POSITIONS_ARG) {
        let values: Vec<f64> = values.copied().collect();
        ensure!(
            values.len() % 3 == 0,
            "--positions takes lon,lat,lod triples"
        );

        for position in values.chunks(3) {
            let (lon, lat, lod) = (position[0], position[1], position[2]);
            ensure!(
                lod >= 0_f64 && lod <= f64::from(MAX_LOD) && lod.fract() == 0_f64,
                "invalid level of detail {}",
                lod
            );
            infos.push(TileInfo::from_position(lat, lon, lod as u8));
        }
    }

    if let Some(values) = matches.get_many::<i32>(TILES_ARG) {
        let values: Vec<i32> = values.copied().collect();
        ensure!(values.len() % 3 == 0, "--tiles takes x,y,lod triples");

        for tile in values.chunks(3) {
            let (x, y, lod) = (tile[0], tile[1], tile[2]);
            ensure!(
                (0..=i32::from(MAX_LOD)).contains(&lod),
                "invalid level of detail {}",
                lod
            );
            infos.push(TileInfo::new(TileKey::new(x, y, lod as u8)));
        }
    }

    Ok(infos)
}

pub fn build_command() -> Command {
    command!()
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(VERBOSE_ARG)
                .help("Log more, repeat for even more output")
                .action(ArgAction::Count)
                .global(true)
                .short('v')
                .long("verbose"),
        )
        .arg(
            Arg::new(QUIET_ARG)
                .help("Log less, repeat to silence logging")
                .action(ArgAction::Count)
                .global(true)
                .short('q')
                .long("quiet"),
        )
        .subcommand(load_command())
        .subcommand(query_command())
        .subcommand(copy_command())
}

fn load_command() -> Command {
    Command::new(LOAD_CMD)
        .about("Download all tiles inside a bounding box")
        .arg(
            Arg::new(BOUND_ARG)
                .help("Bounding box to download, in degrees. Defaults to the whole world.")
                .value_names(["SOUTH", "WEST", "NORTH", "EAST"])
                .num_args(4)
                .value_parser(is_geo_coord)
                .allow_hyphen_values(true)
                .conflicts_with(BBOX_FIXTURE_ARG)
                .short('b')
                .long("bound"),
        )
        .arg(
            Arg::new(BBOX_FIXTURE_ARG)
                .help("Use a known, named bounding box (world, usa, aachen)")
                .value_parser(is_bb_fixture)
                .short('f')
                .long("fixture"),
        )
        .arg(
            Arg::new(MIN_LOD_ARG)
                .help("The minimum level of detail to fetch")
                .value_parser(is_lod)
                .default_value("0")
                .long("min-lod"),
        )
        .arg(
            Arg::new(MAX_LOD_ARG)
                .help("The maximum level of detail to fetch, raised to the minimum when not given")
                .value_parser(is_lod)
                .default_value("18")
                .long("max-lod"),
        )
        .arg(
            Arg::new(LOD_ARG)
                .help("Only fetch a single level of detail (implies min=x/max=x)")
                .value_parser(is_lod)
                .conflicts_with_all([MIN_LOD_ARG, MAX_LOD_ARG])
                .short('z')
                .long("lod"),
        )
        .arg(
            Arg::new(URL_ARG)
                .help("The URL with format specifiers `{x}`, `{y}`, `{z}` to fetch the tiles from. Also supports `{q}` (quadkey), `{south}`, `{west}`, `{north}`, `{east}`, `{center_lat}`, `{center_lon}` and `{s}`, which is replaced with `a`, `b` or `c` in turn to spread the load between different servers.")
                .required(true)
                .short('u')
                .long("url"),
        )
        .arg(
            Arg::new(OUTPUT_ARG)
                .help("The file to write each tile to, with the same format specifiers as the URL.")
                .default_value("Download/{z}/{x}/{y}.jpg")
                .short('o')
                .long("output"),
        )
        .arg(
            Arg::new(PROXY_ARG)
                .help("Proxy to download the tiles through")
                .long("proxy"),
        )
        .arg(
            Arg::new(RETRY_ARG)
                .help("The amount of times to retry a failed transfer.")
                .value_parser(value_parser!(u32))
                .default_value("0")
                .long("retry"),
        )
        .arg(
            Arg::new(RETRY_MAX_TIME_ARG)
                .help("The time (in seconds) after which a tile is no longer retried.")
                .value_parser(value_parser!(u64))
                .default_value("30")
                .long("retry-max-time"),
        )
        .arg(
            Arg::new(PARALLEL_ARG)
                .help("The amount of tiles fetched in parallel.")
                .value_parser(is_numeric_min(1))
                .default_value(DEFAULT_PARALLEL.to_string())
                .short('p')
                .long("parallel"),
        )
        .arg(
            Arg::new(FETCHER_ARG)
                .help("The curl compatible program used to fetch a single tile")
                .value_parser(value_parser!(PathBuf))
                .default_value("curl")
                .long("fetcher"),
        )
        .arg(
            Arg::new(FETCH_EXISTING_ARG)
                .help("Fetch tiles that we've already downloaded (this usually isn't required)")
                .action(ArgAction::SetTrue)
                .long("fetch-existing"),
        )
        .arg(
            Arg::new(DRY_RUN_ARG)
                .help("Don't actually fetch anything, just determine how many tiles would be fetched.")
                .action(ArgAction::SetTrue)
                .long("dry-run"),
        )
}

fn query_command() -> Command {
    Command::new(QUERY_CMD)
        .about("Print information about tiles")
        .arg(
            Arg::new(POSITIONS_ARG)
                .help("WGS84 positions as lon1,lat1,lod1,lon2,lat2,lod2,...")
                .value_parser(is_geo_coord)
                .value_delimiter(',')
                .num_args(1..)
                .allow_hyphen_values(true)
                .long("positions"),
        )
        .arg(
            Arg::new(TILES_ARG)
                .help("Tile indices as x1,y1,lod1,x2,y2,lod2,...")
                .value_parser(value_parser!(i32))
                .value_delimiter(',')
                .num_args(1..)
                .allow_hyphen_values(true)
                .long("tiles"),
        )
        .group(
            ArgGroup::new("input")
                .args([POSITIONS_ARG, TILES_ARG])
                .multiple(true)
                .required(true),
        )
}

fn copy_command() -> Command {
    Command::new(COPY_CMD)
        .about("Copy a <lod>/<x>/<y>/<file> tile cache into the <lod>/<x>/<y>.<ext> layout")
        .arg(
            Arg::new(SRC_ARG)
                .help("The cache to copy from")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new(DST_ARG)
                .help("The directory to copy to")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new(PARALLEL_ARG)
                .help("The amount of files copied in parallel.")
                .value_parser(is_numeric_min(1))
                .default_value(DEFAULT_PARALLEL.to_string())
                .short('p')
                .long("parallel"),
        )
}

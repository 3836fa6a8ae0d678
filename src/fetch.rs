use anyhow::{ensure, Context, Result};
use futures::{prelude::*, stream};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    path::PathBuf,
    process::Stdio,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::{fs, process::Command, sync::Mutex};

use crate::config::Config;
use crate::tile::TileKey;

/// Summary of a [`fetch`] run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchReport {
    /// Number of tiles in the requested area.
    pub total: u64,

    /// Tiles left alone because their output file already existed.
    pub skipped: u64,

    /// Tiles that could not be fetched, ordered by level, column and row.
    pub failed: Vec<TileKey>,
}

impl FetchReport {
    pub fn succeeded(&self) -> u64 {
        self.total - self.skipped - self.failed.len() as u64
    }
}

enum Outcome {
    Fetched,
    Skipped,
}

/// Asynchronously fetch the tiles specified in `cfg` and save them to the
/// file system.
///
/// Every tile is transferred by a separate run of `cfg.fetcher`, at most
/// `cfg.parallel` at a time. A tile fails if its templates can't be rendered,
/// the fetcher can't be started or it exits unsuccessfully; failures are
/// collected in the report instead of aborting the run.
///
/// # Example
/// ```rust,no_run
/// use tile_downloader::{fetch, BoundingBox, Config, Template};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = Config::new(
///     BoundingBox::new(50.7492, 6.031, 50.811, 6.1649),
///     1,
///     12,
///     Template::new("https://{s}.tile.openstreetmap.de/{z}/{x}/{y}.png"),
///     Template::new("./tiles/{z}/{x}/{y}.png"),
/// );
///
/// let report = fetch(config).await.expect("failed fetching tiles");
/// assert!(report.failed.is_empty());
/// # }
/// ```
pub async fn fetch(cfg: Config) -> Result<FetchReport> {
    let total = cfg.tile_count();
    log::info!(
        "fetching {} tiles at levels {}..={} with {} parallel transfers",
        total,
        cfg.min_lod,
        cfg.max_lod,
        cfg.parallel,
    );

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} ETA: {eta} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("##-"),
    );

    let skipped = AtomicU64::new(0);
    let failed = Mutex::new(Vec::new());

    let cfg = &cfg;
    let (skipped_ref, failed_ref) = (&skipped, &failed);

    stream::iter(pb.wrap_iter(cfg.tiles()))
        .for_each_concurrent(cfg.parallel.max(1), |tile| async move {
            match fetch_tile(cfg, tile).await {
                Ok(Outcome::Fetched) => {}
                Ok(Outcome::Skipped) => {
                    skipped_ref.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    log::warn!("failed fetching tile {}: {:#}", tile, e);
                    failed_ref.lock().await.push(tile);
                }
            }
        })
        .await;

    pb.finish_and_clear();

    let mut failed = failed.into_inner();
    failed.sort_by_key(|tile| (tile.lod(), tile.x(), tile.y()));

    let report = FetchReport {
        total,
        skipped: skipped.into_inner(),
        failed,
    };

    log::info!(
        "fetched {} tiles, skipped {}, failed {}",
        report.succeeded(),
        report.skipped,
        report.failed.len(),
    );

    Ok(report)
}

async fn fetch_tile(cfg: &Config, tile: TileKey) -> Result<Outcome> {
    let url = cfg.url.render(&tile)?;
    let output_file = PathBuf::from(cfg.output.render(&tile)?);

    // if the tile's already been downloaded, skip it
    if !cfg.fetch_existing && output_file.exists() {
        log::debug!("skipping tile {}, {:?} exists", tile, output_file);
        return Ok(Outcome::Skipped);
    }

    if let Some(dir) = output_file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await.with_context(|| {
            format!("failed creating output directory for tile {}", tile)
        })?;
    }

    let mut command = Command::new(&cfg.fetcher);
    command
        .arg("--silent")
        .arg("--fail")
        .arg("--output")
        .arg(&output_file)
        .arg("--retry")
        .arg(cfg.retries.to_string())
        .arg("--retry-max-time")
        .arg(cfg.retry_max_time.as_secs().to_string());

    if let Some(proxy) = &cfg.proxy {
        command.arg("--proxy").arg(proxy);
    }

    log::debug!("fetching tile {} from {}", tile, url);

    let status = command
        .arg(&url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .with_context(|| format!("failed starting {:?}", cfg.fetcher))?;

    ensure!(status.success(), "{:?} exited with {}", cfg.fetcher, status);

    Ok(Outcome::Fetched)
}

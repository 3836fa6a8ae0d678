mod args;
mod validators;

use anyhow::{ensure, Result};
use args::{Args, Subcommand};
use tile_downloader::{copy_tiles, fetch, Config, TileTable};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp(None)
        .init();

    match args.command {
        Subcommand::Load(load) => {
            let dry_run = load.dry_run;
            let config: Config = load.into();

            if dry_run {
                let tile_count = config.tile_count();

                eprintln!(
                    "would download {} tiles (approx {}, assuming 10 kb per tile)",
                    tile_count,
                    pretty_bytes::converter::convert((tile_count as f64) * 10_000f64)
                );

                return Ok(());
            }

            let report = fetch(config).await?;
            for tile in &report.failed {
                eprintln!("failed fetching tile {}", tile);
            }
            eprintln!(
                "done: {} fetched, {} skipped, {} failed",
                report.succeeded(),
                report.skipped,
                report.failed.len()
            );

            ensure!(report.failed.is_empty(), "{} tiles failed", report.failed.len());
            Ok(())
        }
        Subcommand::Query(infos) => {
            println!("{}", TileTable(&infos));
            Ok(())
        }
        Subcommand::Copy(copy) => {
            let report = copy_tiles(&copy.src, &copy.dst, copy.parallel).await?;
            eprintln!(
                "done: {} copied, {} skipped, {} failed",
                report.copied,
                report.skipped.len(),
                report.failed.len()
            );

            ensure!(report.failed.is_empty(), "{} files failed", report.failed.len());
            Ok(())
        }
    }
}

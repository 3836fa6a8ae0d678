//! Re-layout of a tile cache stored as `<lod>/<x>/<y>/<file>` into the flat
//! `<lod>/<x>/<y>.<ext>` layout.

use anyhow::{ensure, Context, Result};
use futures::{prelude::*, stream};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Component, Path, PathBuf};
use tokio::{fs, sync::Mutex};
use walkdir::{DirEntry, WalkDir};

/// Summary of a [`copy_tiles`] run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CopyReport {
    /// Number of tiles written to the destination.
    pub copied: u64,

    /// Files that don't sit at `<lod>/<x>/<y>/<file>` and were left alone.
    pub skipped: Vec<PathBuf>,

    /// Files that matched the layout but could not be copied.
    pub failed: Vec<PathBuf>,
}

/// Copies every tile below `src` into `dst`, renaming
/// `<lod>/<x>/<y>/<name>.<ext>` to `<lod>/<x>/<y>.<ext>`.
///
/// At most `parallel` files are copied at a time.
pub async fn copy_tiles(src: &Path, dst: &Path, parallel: usize) -> Result<CopyReport> {
    ensure!(src.is_dir(), "source {:?} is not a directory", src);

    let files = list_files(src).await?;
    log::info!("copying {} files from {:?} to {:?}", files.len(), src, dst);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("##-"),
    );

    let mut report = CopyReport::default();
    let mut jobs = Vec::with_capacity(files.len());
    for file in files {
        match destination(src, &file, dst) {
            Some(target) => jobs.push((file, target)),
            None => {
                pb.inc(1);
                log::debug!("skipping {:?}, not a tile", file);
                report.skipped.push(file);
            }
        }
    }

    let job_count = jobs.len() as u64;
    let failed = Mutex::new(Vec::new());
    let failed_ref = &failed;

    stream::iter(pb.wrap_iter(jobs.into_iter()))
        .for_each_concurrent(parallel.max(1), |(file, target)| async move {
            if let Err(e) = copy_file(&file, &target).await {
                log::warn!("failed copying {:?}: {:#}", file, e);
                failed_ref.lock().await.push(file);
            }
        })
        .await;

    pb.finish_and_clear();

    report.failed = failed.into_inner();
    report.failed.sort();
    report.copied = job_count - report.failed.len() as u64;

    log::info!(
        "copied {} tiles, skipped {} files, failed {}",
        report.copied,
        report.skipped.len(),
        report.failed.len(),
    );

    Ok(report)
}

async fn copy_file(file: &Path, target: &Path) -> Result<()> {
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed creating directory {:?}", dir))?;
    }

    fs::copy(file, target)
        .await
        .with_context(|| format!("failed copying to {:?}", target))?;

    Ok(())
}

/// Maps `src/<lod>/<x>/<y>/<name>.<ext>` to `dst/<lod>/<x>/<y>.<ext>`.
fn destination(src: &Path, file: &Path, dst: &Path) -> Option<PathBuf> {
    let relative = file.strip_prefix(src).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let (lod, x, y, name) = match parts.as_slice() {
        [lod, x, y, name] => (lod, x, y, name),
        _ => return None,
    };

    let mut file_name = y.to_os_string();
    if let Some(ext) = Path::new(name).extension() {
        file_name.push(".");
        file_name.push(ext);
    }

    Some(dst.join(lod).join(x).join(file_name))
}

/// Recursively lists all regular files below `root`, sorted. Symbolic links
/// are followed, so a linked tile counts as a file.
async fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();

    tokio::task::spawn_blocking(move || {
        WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("skipping unreadable entry below {:?}: {}", root, e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(DirEntry::into_path)
            .collect::<Vec<_>>()
    })
    .await
    .context("failed listing source files")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn destination_layout() {
        let (src, dst) = (Path::new("/cache"), Path::new("/out"));

        assert_eq!(
            destination(src, Path::new("/cache/1/0/1/tile.png"), dst),
            Some(PathBuf::from("/out/1/0/1.png"))
        );
        assert_eq!(
            destination(src, Path::new("/cache/5/17/9/data"), dst),
            Some(PathBuf::from("/out/5/17/9"))
        );
        assert_eq!(destination(src, Path::new("/cache/1/0/1.png"), dst), None);
        assert_eq!(destination(src, Path::new("/cache/a/b/c/d/e.png"), dst), None);
        assert_eq!(destination(src, Path::new("/elsewhere/1/0/1/t.png"), dst), None);
    }

    #[tokio::test]
    async fn copies_cache() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        write(src.path(), "1/0/1/tile.png", b"one");
        write(src.path(), "2/3/2/tile.jpg", b"two");
        write(src.path(), "README", b"not a tile");

        let report = copy_tiles(src.path(), dst.path(), 2).await.unwrap();

        assert_eq!(report.copied, 2);
        assert_eq!(report.skipped, vec![src.path().join("README")]);
        assert!(report.failed.is_empty());
        assert_eq!(std::fs::read(dst.path().join("1/0/1.png")).unwrap(), b"one");
        assert_eq!(std::fs::read(dst.path().join("2/3/2.jpg")).unwrap(), b"two");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copies_linked_tiles() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();

        write(store.path(), "tile.png", b"linked");
        std::fs::create_dir_all(src.path().join("1/0/1")).unwrap();
        std::os::unix::fs::symlink(store.path().join("tile.png"), src.path().join("1/0/1/tile.png"))
            .unwrap();

        let report = copy_tiles(src.path(), dst.path(), 1).await.unwrap();

        assert_eq!(report.copied, 1);
        assert!(report.skipped.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(std::fs::read(dst.path().join("1/0/1.png")).unwrap(), b"linked");
    }

    #[tokio::test]
    async fn lists_files_in_path_order() {
        let src = TempDir::new().unwrap();
        write(src.path(), "2/0/0/b.png", b"");
        write(src.path(), "1/1/0/a.png", b"");
        write(src.path(), "1/0/3/c.png", b"");

        assert_eq!(
            list_files(src.path()).await.unwrap(),
            vec![
                src.path().join("1/0/3/c.png"),
                src.path().join("1/1/0/a.png"),
                src.path().join("2/0/0/b.png"),
            ]
        );
    }

    #[tokio::test]
    async fn rejects_missing_source() {
        let dst = TempDir::new().unwrap();
        let missing = dst.path().join("missing");
        assert!(copy_tiles(&missing, dst.path(), 1).await.is_err());
    }
}

//! Node.js runtime archive cache.
//!
//! Maps a (version, target) key to a ready-to-inject runtime binary under the
//! cache root, downloading and extracting the release archive on a miss.
//!
//! # Layout
//!
//! For the key `v20.10.0` / `linux-x64` the cache root holds:
//!
//! - `node-v20.10.0-linux-x64` - extracted runtime binary (kept indefinitely)
//! - `node-v20.10.0-linux-x64.tar.gz` - release archive (removed unless kept)
//! - `node/node-v20.10.0-linux-x64/` - tar extraction scratch (removed unless kept)
//! - `node-v20.10.0-linux-x64.lock` - advisory lock for populating the key
//!
//! A present final binary is trusted without verification. Binaries and
//! archives only ever appear at their final path through an atomic rename, so
//! presence implies completeness.

mod extract;
mod lock;

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    platform::ArchiveKind,
    settings::Target,
    utils::{
        fs::{self, PartialFile, ScratchDir},
        http,
    },
};
use std::{
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};

pub use extract::{read_zip_entry, unpack_tar_gz};

/// Scratch directory (relative to the cache root) for tar extraction.
const EXTRACT_DIR: &str = "node";

/// Fetches a URL into a local file.
///
/// The cache hands implementations a temporary path and moves the file into
/// place itself, so implementations need not care about atomicity.
pub trait Downloader: Send + Sync + 'static {
    /// Writes the full body of `url` to `dest`.
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// [`Downloader`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Creates a downloader whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
        })
    }
}

impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        http::download_to_file(&self.client, url, dest).await?;
        Ok(())
    }
}

/// Name shared by the archive root directory, the archive file and the cached
/// binary, e.g. `node-v20.10.0-win-x64`.
pub fn archive_base(version: &str, target: &Target) -> String {
    format!("node-{}-{}", version, target)
}

/// Cache of extracted Node.js runtime binaries.
#[derive(Debug)]
pub struct ArchiveCache<D> {
    root: PathBuf,
    mirror: String,
    keep_intermediate: bool,
    downloader: D,
    locks: lock::KeyLocks,
}

impl<D> ArchiveCache<D> {
    /// Returns the cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the downloader.
    pub fn downloader(&self) -> &D {
        &self.downloader
    }
}

impl<D: Downloader> ArchiveCache<D> {
    /// Creates a cache rooted at `root` fetching from `mirror`.
    ///
    /// With `keep_intermediate` set, archives and extraction scratch
    /// directories stay on disk after the binary has been extracted.
    pub fn new(root: PathBuf, mirror: &str, keep_intermediate: bool, downloader: D) -> Self {
        Self {
            root,
            mirror: mirror.trim_end_matches('/').to_string(),
            keep_intermediate,
            downloader,
            locks: lock::KeyLocks::default(),
        }
    }

    /// Where the runtime binary for (version, target) lives once cached.
    pub fn binary_path(&self, version: &str, target: &Target) -> PathBuf {
        self.root.join(archive_base(version, target))
    }

    /// Where the release archive for (version, target) is downloaded to.
    pub fn archive_path(&self, version: &str, target: &Target) -> PathBuf {
        self.root.join(archive_file(version, target))
    }

    /// Release archive URL for (version, target).
    pub fn archive_url(&self, version: &str, target: &Target) -> String {
        format!("{}/{}/{}", self.mirror, version, archive_file(version, target))
    }

    /// Returns the path of a cached runtime binary for (version, target),
    /// downloading and extracting it first if needed.
    ///
    /// Idempotent: once a key is cached, further calls return the same path
    /// without network or extraction work. Concurrent calls for one key are
    /// serialized; the loser of the race observes the winner's result.
    ///
    /// # Errors
    ///
    /// - [`Error::Download`] if the archive cannot be fetched
    /// - [`Error::MissingExecutable`] if the archive lacks the runtime executable
    pub async fn ensure(&self, version: &str, target: &Target) -> Result<PathBuf> {
        let base = archive_base(version, target);
        let binary = self.root.join(&base);

        if fs::exists(&binary).await {
            log::debug!("Found existing: {}", base);
            return Ok(binary);
        }

        let key_lock = self.locks.handle(&base);
        let _key_guard = key_lock.lock().await;
        fs::create_dir_all(&self.root).await?;
        let _file_lock = lock::lock_file(self.root.join(format!("{}.lock", base))).await?;

        // Another task or process may have finished while we waited.
        if fs::exists(&binary).await {
            log::debug!("Found existing: {}", base);
            return Ok(binary);
        }

        let kind = target.strategy().archive;
        let archive = self.archive_path(version, target);
        if fs::exists(&archive).await {
            log::debug!("Found existing archive: {}", archive.display());
        } else {
            self.fetch(&self.archive_url(version, target), &archive)
                .await?;
        }

        log::debug!("Extracting: {}", archive.display());
        match kind {
            ArchiveKind::TarGz => self.extract_tar_gz(&base, &archive, &binary).await?,
            ArchiveKind::Zip => self.extract_zip(&base, &archive, &binary).await?,
        }

        if !self.keep_intermediate {
            log::debug!("Removing intermediate: {}", archive.display());
            fs::remove_file(&archive).await?;
        }

        Ok(binary)
    }

    /// Recursively deletes the cache root.
    pub async fn clear(&self) -> Result<()> {
        log::debug!("Removing cached files: {}", self.root.display());
        fs::remove_dir_all(&self.root).await
    }

    async fn fetch(&self, url: &str, archive: &Path) -> Result<()> {
        let part = PartialFile::sibling_of(archive);
        self.downloader
            .download(url, part.path())
            .await
            .map_err(|e| match e {
                Error::Download { .. } => e,
                other => Error::Download {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;
        part.persist(archive).await
    }

    async fn extract_tar_gz(&self, base: &str, archive: &Path, binary: &Path) -> Result<()> {
        let scratch = self.root.join(EXTRACT_DIR);
        let _extracted =
            (!self.keep_intermediate).then(|| ScratchDir::new(scratch.join(base)));

        let archive_owned = archive.to_path_buf();
        let scratch_owned = scratch.clone();
        tokio::task::spawn_blocking(move || unpack_tar_gz(&archive_owned, &scratch_owned))
            .await
            .map_err(|e| Error::GenericError(format!("Extraction task panicked: {}", e)))??;

        let executable = scratch.join(ArchiveKind::TarGz.executable_entry(base));
        if !fs::exists(&executable).await {
            return Err(Error::MissingExecutable {
                archive: archive.to_path_buf(),
                entry: ArchiveKind::TarGz.executable_entry(base),
            });
        }

        let staged = PartialFile::sibling_of(binary);
        tokio::fs::copy(&executable, staged.path())
            .await
            .fs_context("copying runtime executable", staged.path())?;
        staged.persist(binary).await
    }

    async fn extract_zip(&self, base: &str, archive: &Path, binary: &Path) -> Result<()> {
        let entry = ArchiveKind::Zip.executable_entry(base);
        let archive_owned = archive.to_path_buf();
        let data = tokio::task::spawn_blocking(move || read_zip_entry(&archive_owned, &entry))
            .await
            .map_err(|e| Error::GenericError(format!("Extraction task panicked: {}", e)))??;

        let staged = PartialFile::sibling_of(binary);
        tokio::fs::write(staged.path(), &data)
            .await
            .fs_context("writing runtime executable", staged.path())?;
        staged.persist(binary).await
    }
}

fn archive_file(version: &str, target: &Target) -> String {
    format!(
        "{}.{}",
        archive_base(version, target),
        target.strategy().archive.extension()
    )
}

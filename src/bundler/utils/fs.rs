//! File system utilities for building SEA binaries.
//!
//! Provides idempotent directory operations, file copies that create parent
//! directories, and guards that remove partially written files and scratch
//! directories.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Removes a file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing file", path),
    }
}

/// Whether `path` exists. Unreadable metadata counts as absent.
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// An existing destination is overwritten. Fails if the source path is a
/// directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    let metadata = fs::metadata(from)
        .await
        .fs_context("reading source metadata", from)?;
    if !metadata.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await.fs_context("copying file", to)
}

/// A file that is deleted on drop unless it was persisted.
///
/// Used for downloads and extracted binaries so that failures and
/// cancellation never leave half-written files behind in the cache.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    /// Guards `path`. Nothing is created on disk.
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// A guarded sibling of `dest` with a unique name.
    pub fn sibling_of(dest: &Path) -> Self {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dest.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));
        Self::new(tmp)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically moves the file to `dest` and disarms the guard.
    pub async fn persist(mut self, dest: &Path) -> Result<()> {
        fs::rename(&self.path, dest)
            .await
            .fs_context("moving file into place", dest)?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => log::debug!("Removed partial file: {}", self.path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!(
                    "Failed to remove partial file {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

/// A directory tree that is removed on drop.
///
/// Covers every exit from an extraction, including errors and cancellation.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Guards `path`. Nothing is created on disk.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("Removed intermediate: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove intermediate {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

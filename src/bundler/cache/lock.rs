//! Mutual exclusion for cache population.
//!
//! Two layers guard each (version, target) key: an async mutex shared by all
//! tasks of this process, and an advisory `flock` on `<base>.lock` shared by
//! all processes using the same cache root.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};

/// In-process locks, one per cache key.
#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    /// Returns the lock for `key`, creating it on first use.
    pub(crate) fn handle(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }
}

/// Held advisory lock on a cache key's lock file. Released on drop.
#[derive(Debug)]
pub(crate) struct KeyFileLock {
    #[cfg(unix)]
    _lock: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _file: File,
}

/// Blocks (off the async runtime) until the lock file at `path` is held.
pub(crate) async fn lock_file(path: PathBuf) -> Result<KeyFileLock> {
    tokio::task::spawn_blocking(move || {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .fs_context("opening cache lock file", &path)?;
        acquire(file, &path)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Cache lock task panicked: {}", e)))?
}

#[cfg(unix)]
fn acquire(file: File, path: &std::path::Path) -> Result<KeyFileLock> {
    use nix::fcntl::{Flock, FlockArg};

    let lock = Flock::lock(file, FlockArg::LockExclusive)
        .map_err(|(_, errno)| std::io::Error::from(errno))
        .fs_context("locking cache entry", path)?;
    Ok(KeyFileLock { _lock: lock })
}

#[cfg(not(unix))]
fn acquire(file: File, _path: &std::path::Path) -> Result<KeyFileLock> {
    Ok(KeyFileLock { _file: file })
}

//! Core Settings struct and implementations.

use super::Target;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Everything one xsea invocation needs to know.
///
/// Constructed once per invocation via [`SettingsBuilder`] and never mutated
/// afterwards.
///
/// # Examples
///
/// ```no_run
/// use xsea::bundler::{SettingsBuilder, Target};
///
/// # fn example() -> xsea::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .entry("app.js")
///     .node_version("v20.10.0")
///     .targets(vec!["linux-x64".parse()?, "win-x64".parse()?])
///     .cache_dir("/tmp/xsea-cache")
///     .build()?;
///
/// assert_eq!(settings.output_prefix().as_deref(), Some("app-"));
/// # Ok(())
/// # }
/// ```
///
/// # See Also
///
/// - [`SettingsBuilder`] - Builder for constructing Settings
///
/// [`SettingsBuilder`]: super::SettingsBuilder
#[derive(Clone, Debug)]
pub struct Settings {
    /// Application entry point, absent for clean-only invocations.
    entry: Option<PathBuf>,

    /// Explicit output prefix (`-o`).
    output: Option<String>,

    /// Node.js version such as `v20.10.0`; `None` means the host's `node`.
    node_version: Option<String>,

    /// Distinct targets in request order.
    targets: Vec<Target>,

    /// Directory holding runtime archives and extracted binaries.
    cache_dir: PathBuf,

    /// Base URL of the Node.js release mirror.
    mirror: String,

    /// Upper bound for one runtime download.
    download_timeout: Duration,

    /// Concurrent target assemblies.
    jobs: usize,

    /// Keep downloaded archives and extraction scratch directories.
    keep: bool,

    /// Remove the cache root before building.
    clean: bool,
}

impl Settings {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        entry: Option<PathBuf>,
        output: Option<String>,
        node_version: Option<String>,
        targets: Vec<Target>,
        cache_dir: PathBuf,
        mirror: String,
        download_timeout: Duration,
        jobs: usize,
        flags: Flags,
    ) -> Self {
        Self {
            entry,
            output,
            node_version,
            targets,
            cache_dir,
            mirror,
            download_timeout,
            jobs,
            keep: flags.keep,
            clean: flags.clean,
        }
    }

    /// Returns the entry point, if one was given.
    pub fn entry(&self) -> Option<&Path> {
        self.entry.as_deref()
    }

    /// Returns the requested Node.js version, if one was given.
    pub fn node_version(&self) -> Option<&str> {
        self.node_version.as_deref()
    }

    /// Returns the distinct targets in request order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Returns the cache root.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the release mirror base URL, without a trailing slash.
    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    /// Returns the timeout applied to each runtime download.
    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    /// Returns the number of targets assembled concurrently.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Whether intermediate archives and scratch directories are kept.
    pub fn keep_intermediate(&self) -> bool {
        self.keep
    }

    /// Whether the cache root is removed before building.
    pub fn clean(&self) -> bool {
        self.clean
    }

    /// Name of the entry point without directory and extension.
    pub fn entry_name(&self) -> Option<String> {
        self.entry
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// Prefix every output path starts with.
    ///
    /// Defaults to the entry name. A prefix ending in a word character gets a
    /// `-` appended, so `app` becomes `app-` while `dist/` stays `dist/`.
    pub fn output_prefix(&self) -> Option<String> {
        let mut prefix = self.output.clone().or_else(|| self.entry_name())?;
        if prefix
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            prefix.push('-');
        }
        Some(prefix)
    }

    /// Directory that must exist before outputs are written.
    ///
    /// Returns `None` when outputs land in the working directory.
    pub fn output_dir(&self) -> Option<PathBuf> {
        let prefix = self.output_prefix()?;
        if prefix.ends_with('/') || prefix.ends_with(std::path::MAIN_SEPARATOR) {
            return Some(PathBuf::from(prefix));
        }
        Path::new(&prefix)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    /// Output path for one target, e.g. `app-win-x64.exe`.
    pub fn output_path(&self, target: &Target) -> Option<PathBuf> {
        self.output_prefix()
            .map(|prefix| PathBuf::from(format!("{}{}", prefix, target.output_suffix())))
    }
}

/// Boolean switches of a build request.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct Flags {
    pub keep: bool,
    pub clean: bool,
}

//! Builder for constructing Settings.

use super::{Settings, Target, core::Flags};
use crate::bundler::Result;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Default Node.js release mirror.
pub const DEFAULT_MIRROR: &str = "https://nodejs.org/dist";

/// Default upper bound for one runtime download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Builder for constructing [`Settings`].
///
/// Every field is optional. Unset targets default to the host target, an
/// unset cache directory to `<user cache dir>/xsea`, unset jobs to the CPU
/// count capped at the number of targets.
///
/// # Examples
///
/// ```no_run
/// use xsea::bundler::SettingsBuilder;
///
/// # fn example() -> xsea::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .entry("app.js")
///     .targets(vec!["darwin-arm64".parse()?])
///     .keep(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    entry: Option<PathBuf>,
    output: Option<String>,
    node_version: Option<String>,
    targets: Vec<Target>,
    cache_dir: Option<PathBuf>,
    mirror: Option<String>,
    download_timeout: Option<Duration>,
    jobs: Option<usize>,
    flags: Flags,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the application entry point.
    pub fn entry<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.entry = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output prefix.
    ///
    /// Default: the entry point's file stem
    pub fn output<S: Into<String>>(mut self, prefix: S) -> Self {
        self.output = Some(prefix.into());
        self
    }

    /// Sets the Node.js version, e.g. `v20.10.0`.
    ///
    /// Default: the version reported by the host's `node`
    pub fn node_version<S: Into<String>>(mut self, version: S) -> Self {
        self.node_version = Some(version.into());
        self
    }

    /// Sets the targets to build. Duplicates are dropped, first one wins.
    ///
    /// Default: the host target
    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the cache root.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the Node.js release mirror.
    ///
    /// Default: [`DEFAULT_MIRROR`]
    pub fn mirror<S: Into<String>>(mut self, mirror: S) -> Self {
        self.mirror = Some(mirror.into());
        self
    }

    /// Sets the per-download timeout.
    ///
    /// Default: [`DEFAULT_DOWNLOAD_TIMEOUT`]
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Sets the number of concurrent target assemblies, capped at the number
    /// of targets.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Keep downloaded archives and extraction scratch directories.
    pub fn keep(mut self, keep: bool) -> Self {
        self.flags.keep = keep;
        self
    }

    /// Remove the cache root before building.
    pub fn clean(mut self, clean: bool) -> Self {
        self.flags.clean = clean;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// - the mirror is not an absolute URL
    /// - `jobs` is zero
    /// - no cache directory was given and the platform has none
    /// - no targets were given and the host is not a Node.js platform
    pub fn build(self) -> Result<Settings> {
        use crate::bundler::error::Context;

        let mirror = self.mirror.unwrap_or_else(|| DEFAULT_MIRROR.to_string());
        url::Url::parse(&mirror).context(format!("invalid mirror URL '{}'", mirror))?;
        let mirror = mirror.trim_end_matches('/').to_string();

        let mut targets: Vec<Target> = Vec::with_capacity(self.targets.len());
        for target in self.targets {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        if targets.is_empty() {
            targets.push(Target::host()?);
        }

        let jobs = match self.jobs {
            Some(0) => crate::bail!("jobs must be at least 1"),
            Some(jobs) => jobs.min(targets.len()),
            None => num_cpus::get().clamp(1, targets.len()),
        };

        let cache_dir = match self.cache_dir {
            Some(dir) => dir,
            None => default_cache_dir()?,
        };

        Ok(Settings::new(
            self.entry,
            self.output,
            self.node_version,
            targets,
            cache_dir,
            mirror,
            self.download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT),
            jobs,
            self.flags,
        ))
    }
}

/// `<user cache dir>/xsea`, e.g. `~/.cache/xsea` on Linux.
pub fn default_cache_dir() -> Result<PathBuf> {
    use crate::bundler::error::Context;

    dirs::cache_dir()
        .map(|dir| dir.join("xsea"))
        .context("could not determine the user cache directory; pass --cache-dir")
}

//! Main build orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator: it clears the cache on
//! request, builds the payload once and fans the target assemblies out over a
//! bounded worker pool.

use super::{
    assembler::TargetAssembler,
    report::{AssemblyStep, BuildReport, TargetOutcome, TargetStatus},
    signing::{CodeSigner, Codesign},
    tool_detection,
};
use crate::bundler::{
    Error, Result, Settings,
    cache::{ArchiveCache, Downloader, HttpDownloader},
    error::Context,
    inject::{Injector, Postject},
    payload::{NodeSeaConfig, PayloadGenerator},
    utils::fs,
};
use std::{future::Future, sync::Arc};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// The external capabilities a build drives.
///
/// Tests swap individual members for doubles; production code uses
/// [`Toolchain::system`].
#[derive(Debug, Clone)]
pub struct Toolchain<P, D, I, S> {
    /// Produces the payload blob.
    pub payload: P,
    /// Fetches runtime archives.
    pub downloader: D,
    /// Embeds the payload into runtime binaries.
    pub injector: I,
    /// Strips and applies macOS code signatures.
    pub signer: S,
}

/// The toolchain backed by `node`, reqwest, `postject` and `codesign`.
pub type SystemToolchain = Toolchain<NodeSeaConfig, HttpDownloader, Postject, Codesign>;

impl SystemToolchain {
    /// Creates the production toolchain for `settings`.
    pub fn system(settings: &Settings) -> Result<Self> {
        Ok(Self {
            payload: NodeSeaConfig::new(settings.keep_intermediate()),
            downloader: HttpDownloader::new(settings.download_timeout())?,
            injector: Postject,
            signer: Codesign,
        })
    }
}

/// Main build orchestrator.
///
/// # Examples
///
/// ```no_run
/// use xsea::bundler::{Bundler, SettingsBuilder, Toolchain};
///
/// # async fn example() -> xsea::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .entry("app.js")
///     .targets(vec!["linux-x64".parse()?, "win-x64".parse()?])
///     .build()?;
/// let toolchain = Toolchain::system(&settings)?;
///
/// let report = Bundler::new(settings, toolchain).bundle().await?;
/// for artifact in report.artifacts() {
///     println!("Created: {} ({} bytes)", artifact.path.display(), artifact.size);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Bundler<P, D, I, S> {
    settings: Arc<Settings>,
    generator: P,
    cache: Arc<ArchiveCache<D>>,
    injector: Arc<I>,
    signer: Arc<S>,
    cancel: CancellationToken,
}

impl<P, D, I, S> std::fmt::Debug for Bundler<P, D, I, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field("cache_root", &self.cache.root())
            .finish_non_exhaustive()
    }
}

impl<P, D, I, S> Bundler<P, D, I, S>
where
    P: PayloadGenerator,
    D: Downloader,
    I: Injector,
    S: CodeSigner,
{
    /// Creates a new bundler from the build request and its toolchain.
    pub fn new(settings: Settings, toolchain: Toolchain<P, D, I, S>) -> Self {
        let cache = ArchiveCache::new(
            settings.cache_dir().to_path_buf(),
            settings.mirror(),
            settings.keep_intermediate(),
            toolchain.downloader,
        );
        Self {
            settings: Arc::new(settings),
            generator: toolchain.payload,
            cache: Arc::new(cache),
            injector: Arc::new(toolchain.injector),
            signer: Arc::new(toolchain.signer),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a reference to the build settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the archive cache.
    pub fn cache(&self) -> &ArchiveCache<D> {
        &self.cache
    }

    /// Returns a token that stops [`Bundler::bundle`] when cancelled.
    ///
    /// In-flight assemblies are aborted and awaited before `bundle` returns
    /// [`Error::Cancelled`], so their partial files are already gone.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn until_cancelled<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = work => result,
        }
    }

    /// Runs the build.
    ///
    /// # Process
    ///
    /// 1. Remove the cache root if `clean` is set; stop if there is no entry point
    /// 2. Resolve the runtime version and create the output directory
    /// 3. Build the payload once
    /// 4. Assemble every target, at most `jobs` at a time
    ///
    /// # Errors
    ///
    /// Only invocation-wide failures are errors: clearing the cache, resolving
    /// the runtime version, building the payload, or cancellation through
    /// [`Bundler::cancellation_token`]. Target failures are recorded in the
    /// returned [`BuildReport`].
    pub async fn bundle(&self) -> Result<BuildReport> {
        let cache_cleared = self.settings.clean();
        if cache_cleared {
            self.cache.clear().await?;
        }

        let Some(entry) = self.settings.entry() else {
            return Ok(BuildReport::new(Vec::new(), cache_cleared));
        };

        let prefix = self
            .settings
            .output_prefix()
            .context("could not derive an output prefix from the entry point")?;
        log::debug!("Prefix: {}", prefix);

        let version = match self.settings.node_version() {
            Some(version) => version.to_string(),
            None => self.until_cancelled(tool_detection::node_version()).await?,
        };
        log::debug!("Node version: {}", version);

        let payload = self
            .until_cancelled(self.generator.build_payload(entry, self.cache.root()))
            .await?;

        if let Some(dir) = self.settings.output_dir() {
            fs::create_dir_all(&dir).await?;
        }

        let assembler = TargetAssembler::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.injector),
            Arc::clone(&self.signer),
            &version,
            &prefix,
        );

        let targets = self.settings.targets();
        let semaphore = Arc::new(Semaphore::new(self.settings.jobs()));
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().copied().enumerate() {
            let assembler = assembler.clone();
            let payload = payload.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition only fails if
                // it is; run unthrottled rather than skip the target.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, assembler.assemble(target, &payload).await)
            });
        }

        let mut outcomes: Vec<Option<TargetOutcome>> = targets.iter().map(|_| None).collect();
        loop {
            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    log::debug!("Cancelled, aborting {} assemblies", tasks.len());
                    tasks.shutdown().await;
                    return Err(Error::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => log::error!("Assembly task failed: {}", e),
            }
        }

        let outcomes = outcomes
            .into_iter()
            .zip(targets)
            .map(|(outcome, target)| {
                outcome.unwrap_or_else(|| TargetOutcome {
                    target: *target,
                    status: TargetStatus::Failed {
                        step: AssemblyStep::Task,
                        error: Error::GenericError(format!(
                            "assembly of {} ended without a result",
                            target
                        )),
                    },
                })
            })
            .collect();

        Ok(BuildReport::new(outcomes, cache_cleared))
    }
}

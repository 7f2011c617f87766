//! Per-target assembly.
//!
//! Turns one cached runtime binary into one SEA executable. Every failure is
//! caught here and reported as a [`TargetStatus::Failed`] so that the other
//! targets of the invocation carry on.

use super::{
    checksum::calculate_sha256,
    report::{AssemblyStep, BundledArtifact, TargetOutcome, TargetStatus},
    signing::CodeSigner,
};
use crate::bundler::{
    cache::{ArchiveCache, Downloader},
    error::Result,
    inject::{InjectOptions, Injector, SEA_RESOURCE_NAME},
    payload::PayloadBlob,
    settings::Target,
    utils::fs,
};
use std::{path::PathBuf, sync::Arc};

/// Assembles targets for one invocation. Cheap to clone into worker tasks.
pub(crate) struct TargetAssembler<D, I, S> {
    cache: Arc<ArchiveCache<D>>,
    injector: Arc<I>,
    signer: Arc<S>,
    version: Arc<str>,
    prefix: Arc<str>,
}

impl<D, I, S> Clone for TargetAssembler<D, I, S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            injector: Arc::clone(&self.injector),
            signer: Arc::clone(&self.signer),
            version: Arc::clone(&self.version),
            prefix: Arc::clone(&self.prefix),
        }
    }
}

/// Tags an error with the assembly step it happened in.
trait StepExt<T> {
    fn step(self, step: AssemblyStep) -> std::result::Result<T, (AssemblyStep, crate::bundler::Error)>;
}

impl<T> StepExt<T> for Result<T> {
    fn step(self, step: AssemblyStep) -> std::result::Result<T, (AssemblyStep, crate::bundler::Error)> {
        self.map_err(|e| (step, e))
    }
}

impl<D: Downloader, I: Injector, S: CodeSigner> TargetAssembler<D, I, S> {
    pub(crate) fn new(
        cache: Arc<ArchiveCache<D>>,
        injector: Arc<I>,
        signer: Arc<S>,
        version: &str,
        prefix: &str,
    ) -> Self {
        Self {
            cache,
            injector,
            signer,
            version: Arc::from(version),
            prefix: Arc::from(prefix),
        }
    }

    /// Output path for `target`: prefix, target identifier, `.exe` on Windows.
    pub(crate) fn output_path(&self, target: &Target) -> PathBuf {
        PathBuf::from(format!("{}{}", self.prefix, target.output_suffix()))
    }

    /// Builds the SEA executable for `target`. Never fails; failures are
    /// logged and returned as part of the outcome.
    pub(crate) async fn assemble(&self, target: Target, payload: &PayloadBlob) -> TargetOutcome {
        log::info!("Creating SEA for: {}", target);

        let status = match self.try_assemble(&target, payload).await {
            Ok(artifact) => TargetStatus::Built(artifact),
            Err((step, error)) => {
                log::error!("{}: failed while {}: {}", target, step, error);
                TargetStatus::Failed { step, error }
            }
        };
        TargetOutcome { target, status }
    }

    async fn try_assemble(
        &self,
        target: &Target,
        payload: &PayloadBlob,
    ) -> std::result::Result<BundledArtifact, (AssemblyStep, crate::bundler::Error)> {
        let output = self.output_path(target);
        let strategy = target.strategy();

        let runtime = self
            .cache
            .ensure(&self.version, target)
            .await
            .step(AssemblyStep::Fetch)?;

        log::debug!("Copying {} to {}", runtime.display(), output.display());
        fs::copy_file(&runtime, &output)
            .await
            .step(AssemblyStep::Copy)?;

        let resign = target.requires_adhoc_signature();
        if resign {
            self.signer
                .remove_signature(&output)
                .await
                .step(AssemblyStep::StripSignature)?;
        }

        log::debug!("Injecting: {}", output.display());
        self.injector
            .inject_payload(
                &output,
                SEA_RESOURCE_NAME,
                payload.as_bytes(),
                &InjectOptions::sea(strategy.macho_segment),
            )
            .await
            .step(AssemblyStep::Inject)?;

        if resign {
            self.signer
                .sign_adhoc(&output)
                .await
                .step(AssemblyStep::Sign)?;
        }

        let size = tokio::fs::metadata(&output)
            .await
            .map(|m| m.len())
            .map_err(crate::bundler::Error::from)
            .step(AssemblyStep::Checksum)?;
        let checksum = calculate_sha256(&output)
            .await
            .step(AssemblyStep::Checksum)?;

        Ok(BundledArtifact {
            target: *target,
            path: output,
            size,
            checksum,
        })
    }
}

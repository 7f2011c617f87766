//! Results of a build invocation.

use crate::bundler::{Error, settings::Target};
use std::{fmt, path::PathBuf};

/// An assembled executable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundledArtifact {
    /// Target the executable runs on.
    pub target: Target,
    /// Where the executable was written.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the executable.
    pub checksum: String,
}

/// Stage of a target assembly, used to report where it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblyStep {
    /// Obtaining the runtime binary from the archive cache.
    Fetch,
    /// Copying the runtime binary to the output path.
    Copy,
    /// Stripping the existing code signature.
    StripSignature,
    /// Injecting the payload.
    Inject,
    /// Applying the ad-hoc code signature.
    Sign,
    /// Hashing the finished executable.
    Checksum,
    /// The assembly task itself died.
    Task,
}

impl fmt::Display for AssemblyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssemblyStep::Fetch => "fetching the runtime",
            AssemblyStep::Copy => "copying the runtime",
            AssemblyStep::StripSignature => "removing the code signature",
            AssemblyStep::Inject => "injecting the payload",
            AssemblyStep::Sign => "signing the executable",
            AssemblyStep::Checksum => "hashing the executable",
            AssemblyStep::Task => "running the assembly task",
        })
    }
}

/// Outcome of assembling one target.
#[derive(Debug)]
pub enum TargetStatus {
    Built(BundledArtifact),
    Failed { step: AssemblyStep, error: Error },
}

/// One requested target and what happened to it.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: Target,
    pub status: TargetStatus,
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, TargetStatus::Built(_))
    }
}

/// Everything a build invocation did.
///
/// A partially successful build is a normal report, not an error.
#[derive(Debug, Default)]
pub struct BuildReport {
    outcomes: Vec<TargetOutcome>,
    cache_cleared: bool,
}

impl BuildReport {
    pub(crate) fn new(outcomes: Vec<TargetOutcome>, cache_cleared: bool) -> Self {
        Self {
            outcomes,
            cache_cleared,
        }
    }

    /// One outcome per distinct requested target, in request order.
    pub fn outcomes(&self) -> &[TargetOutcome] {
        &self.outcomes
    }

    /// Whether the cache root was removed first.
    pub fn cache_cleared(&self) -> bool {
        self.cache_cleared
    }

    /// Successfully assembled executables.
    pub fn artifacts(&self) -> impl Iterator<Item = &BundledArtifact> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            TargetStatus::Built(artifact) => Some(artifact),
            TargetStatus::Failed { .. } => None,
        })
    }

    /// Targets that were skipped, with the failed step and its error.
    pub fn failures(&self) -> impl Iterator<Item = (&Target, AssemblyStep, &Error)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            TargetStatus::Failed { step, error } => Some((&o.target, *step, error)),
            TargetStatus::Built(_) => None,
        })
    }

    /// Whether every attempted target was assembled.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(TargetOutcome::is_success)
    }
}

//! Error types for SEA build operations.
//!
//! Errors fall into two groups: failures that abort the whole invocation
//! (payload generation, invalid targets) and failures scoped to one target
//! (download, extraction, injection, signing).

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building SEA binaries.
#[derive(Error, Debug)]
pub enum Error {
    /// Raw IO failure without further context.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// IO failure with a description and the path involved.
    #[error("{context} ({}): {error}", path.display())]
    Fs {
        /// What was being done
        context: String,
        /// Path being operated on
        path: PathBuf,
        /// Underlying IO error
        #[source]
        error: std::io::Error,
    },

    /// The SEA payload could not be produced.
    #[error("Failed to build payload: {0}")]
    PayloadBuild(String),

    /// The runtime archive could not be fetched.
    #[error("Failed to download {url}: {reason}")]
    Download {
        /// URL that was requested
        url: String,
        /// Reason for the failure
        reason: String,
    },

    /// The runtime archive has no executable where one is expected.
    #[error("Missing node executable in {}: {entry}", archive.display())]
    MissingExecutable {
        /// Archive that was searched
        archive: PathBuf,
        /// Entry name that was expected
        entry: String,
    },

    /// Payload injection failed.
    #[error("Failed to inject payload into {}: {reason}", path.display())]
    Injection {
        /// Binary being injected
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// Code signing or signature removal failed.
    #[error("Failed to sign {}: {reason}", path.display())]
    Signing {
        /// Binary being signed
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// A target identifier could not be understood.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// An external command could not be started.
    #[error("Failed to run {command}: {error}")]
    CommandFailed {
        /// Command that failed
        command: String,
        /// Underlying IO error
        #[source]
        error: std::io::Error,
    },

    /// The build was cancelled before it finished.
    #[error("Build cancelled")]
    Cancelled,

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Whether this error should only skip the target it happened in.
    pub fn is_per_target(&self) -> bool {
        matches!(
            self,
            Self::Download { .. }
                | Self::MissingExecutable { .. }
                | Self::Injection { .. }
                | Self::Signing { .. }
        )
    }
}

/// Attaches a description and a path to IO failures.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`Error::Fs`].
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Adds a message to failures and missing values.
pub trait Context<T> {
    /// Converts the failure into [`Error::GenericError`] prefixed with `context`.
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {}", context, e)))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

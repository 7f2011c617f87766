//! Top-level error types for xsea.
//!
//! Usage errors live here; build errors come from [`crate::bundler::Error`].

use thiserror::Error;

/// Result type alias for CLI-level operations
pub type Result<T> = std::result::Result<T, XseaError>;

/// Main error type for the xsea binary
#[derive(Error, Debug)]
pub enum XseaError {
    /// CLI argument errors
    #[error("{0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundler errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Conflicting arguments
    #[error("Can not use both {}", arguments.join(" and "))]
    ConflictingArguments {
        /// Arguments that conflict
        arguments: Vec<String>,
    },
}

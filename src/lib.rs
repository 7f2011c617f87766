//! Single executable application builder library.
//!
//! This library provides the core functionality for turning one Node.js entry
//! point into self-contained executables for many platforms:
//! - Runtime archive cache (download, extract, reuse)
//! - SEA payload generation
//! - Per-target assembly (copy, inject, sign)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result, XseaError};

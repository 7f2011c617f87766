//! Configuration structures for SEA builds.
//!
//! This module provides the build request ([`Settings`]), its builder, and the
//! target model (operating system family plus architecture).

mod arch;
mod builder;
mod core;
mod target;

// Re-export all public types
pub use arch::Arch;
pub use builder::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_MIRROR, SettingsBuilder, default_cache_dir};
pub use core::Settings;
pub use target::{PlatformFamily, Target};

//! SEA build pipeline.
//!
//! Builds Node.js single executable applications for several targets from
//! one entry point:
//!
//! - [`cache`] - downloads and caches Node.js runtime binaries per (version, target)
//! - [`payload`] - produces the application payload once per invocation
//! - [`inject`] - embeds the payload into a copied runtime binary
//! - [`builder`] - per-target assembly and the [`Bundler`] orchestrator
//! - [`platform`] - per-family rules (archive format, executable suffix, signing)
//! - [`settings`] - the build request and target model

pub mod builder;
pub mod cache;
pub mod error;
pub mod inject;
pub mod payload;
pub mod platform;
pub mod settings;
pub mod utils;

pub use builder::{
    AssemblyStep, BuildReport, BundledArtifact, Bundler, CodeSigner, Codesign, SystemToolchain,
    TargetOutcome, TargetStatus, Toolchain,
};
pub use cache::{ArchiveCache, Downloader, HttpDownloader};
pub use error::{Error, Result};
pub use inject::{InjectOptions, Injector, Postject, SEA_RESOURCE_NAME, SEA_SENTINEL_FUSE};
pub use payload::{NodeSeaConfig, PayloadBlob, PayloadGenerator};
pub use settings::{Arch, PlatformFamily, Settings, SettingsBuilder, Target};

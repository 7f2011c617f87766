//! Build orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that turns one
//! entry point into SEA executables for every requested target.
//!
//! # Overview
//!
//! The bundler:
//! 1. Reads the build request from [`Settings`](crate::bundler::Settings)
//! 2. Builds the payload once
//! 3. Assembles each target (fetch runtime, copy, inject, sign)
//! 4. Calculates checksums and returns a [`BuildReport`]
//!
//! # Module Organization
//!
//! - [`assembler`] - Per-target assembly with failure isolation
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`Bundler`] struct and the worker pool
//! - [`report`] - Build outcomes
//! - [`signing`] - macOS code signature handling
//! - [`tool_detection`] - External tool availability checking

mod assembler;
mod checksum;
mod orchestrator;
mod report;
mod signing;
pub(crate) mod tool_detection;

pub use checksum::calculate_sha256;
pub use orchestrator::{Bundler, SystemToolchain, Toolchain};
pub use report::{AssemblyStep, BuildReport, BundledArtifact, TargetOutcome, TargetStatus};
pub use signing::{CodeSigner, Codesign};

//! Payload injection into runtime binaries.
//!
//! Injection locates the resource marker inside a copied Node.js binary,
//! embeds the payload there and flips the sentinel fuse so the runtime boots
//! into the embedded application.

use crate::bundler::{
    builder::tool_detection,
    error::{Error, ErrorExt, Result},
};
use std::{future::Future, path::Path};

/// Resource name Node.js looks up at startup.
pub const SEA_RESOURCE_NAME: &str = "NODE_SEA_BLOB";

/// Fuse that marks a Node.js binary as carrying a SEA payload.
pub const SEA_SENTINEL_FUSE: &str = "NODE_SEA_FUSE_fce680ab2cc467b6e072b8b5df1996b2";

/// Format-specific injection options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InjectOptions {
    /// Sentinel fuse to flip.
    pub sentinel_fuse: &'static str,
    /// Mach-O segment to place the resource in (macOS only).
    pub macho_segment_name: Option<&'static str>,
}

impl InjectOptions {
    /// Options for a Node.js SEA with the given Mach-O segment.
    pub fn sea(macho_segment_name: Option<&'static str>) -> Self {
        Self {
            sentinel_fuse: SEA_SENTINEL_FUSE,
            macho_segment_name,
        }
    }
}

/// Embeds a payload into a binary in place.
pub trait Injector: Send + Sync + 'static {
    /// Rewrites `binary` so that it carries `payload` under `resource_name`.
    ///
    /// Must fail if the binary lacks the marker or sentinel fuse.
    fn inject_payload(
        &self,
        binary: &Path,
        resource_name: &str,
        payload: &[u8],
        options: &InjectOptions,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// [`Injector`] that runs the `postject` tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postject;

impl Injector for Postject {
    async fn inject_payload(
        &self,
        binary: &Path,
        resource_name: &str,
        payload: &[u8],
        options: &InjectOptions,
    ) -> Result<()> {
        let injection_error = |reason: String| Error::Injection {
            path: binary.to_path_buf(),
            reason,
        };

        let tool = tool_detection::postject().map_err(|e| injection_error(e.to_string()))?;

        let blob = tempfile::Builder::new()
            .prefix("xsea-")
            .suffix(".blob")
            .tempfile()
            .map_err(|e| injection_error(format!("Failed to stage payload: {}", e)))?;
        tokio::fs::write(blob.path(), payload)
            .await
            .fs_context("staging payload", blob.path())?;

        let mut command = tokio::process::Command::new(&tool.program);
        command
            .args(&tool.leading_args)
            .arg(binary)
            .arg(resource_name)
            .arg(blob.path())
            .arg("--sentinel-fuse")
            .arg(options.sentinel_fuse);
        if let Some(segment) = options.macho_segment_name {
            command.arg("--macho-segment-name").arg(segment);
        }

        log::debug!("Injecting: {}", binary.display());
        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::CommandFailed {
                command: tool.to_string(),
                error: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(injection_error(format!(
                "{} exited with {}: {}",
                tool,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

//! macOS code signature handling.
//!
//! Injection rewrites Mach-O sections, which invalidates any existing
//! signature. Apple Silicon refuses to run unsigned binaries, so the
//! signature is stripped before injection and an ad-hoc one applied after.

use super::tool_detection;
use crate::bundler::error::{Error, Result};
use std::{future::Future, path::Path};

/// Removes and applies code signatures.
pub trait CodeSigner: Send + Sync + 'static {
    /// Strips any existing signature from `binary`.
    fn remove_signature(&self, binary: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Applies an ad-hoc signature to `binary`.
    fn sign_adhoc(&self, binary: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// [`CodeSigner`] that runs Apple's `codesign`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codesign;

impl Codesign {
    async fn run(&self, binary: &Path, args: &[&str]) -> Result<()> {
        let signing_error = |reason: String| Error::Signing {
            path: binary.to_path_buf(),
            reason,
        };

        let codesign = tool_detection::codesign().map_err(|e| signing_error(e.to_string()))?;
        let output = tokio::process::Command::new(&codesign)
            .args(args)
            .arg(binary)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| signing_error(format!("failed to run codesign: {}", e)))?;

        if !output.status.success() {
            return Err(signing_error(format!(
                "codesign {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl CodeSigner for Codesign {
    async fn remove_signature(&self, binary: &Path) -> Result<()> {
        log::debug!("Removing signature: {}", binary.display());
        self.run(binary, &["--remove-signature"]).await
    }

    async fn sign_adhoc(&self, binary: &Path) -> Result<()> {
        log::debug!("Signing binary: {}", binary.display());
        self.run(binary, &["--sign", "-"]).await
    }
}

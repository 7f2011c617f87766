//! SEA payload generation.
//!
//! The payload is produced once per invocation by Node.js itself
//! (`node --experimental-sea-config`) and shared read-only by every target.

use crate::bundler::{
    builder::tool_detection,
    error::{Error, ErrorExt, Result},
    utils::fs,
};
use bytes::Bytes;
use serde::Serialize;
use std::{
    future::Future,
    path::{Path, PathBuf},
};

/// Serialized application payload, cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadBlob(Bytes);

impl PayloadBlob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Turns an entry point into a payload blob.
pub trait PayloadGenerator: Send + Sync {
    /// Builds the payload for `entry`, using `scratch_dir` for transient files.
    fn build_payload(
        &self,
        entry: &Path,
        scratch_dir: &Path,
    ) -> impl Future<Output = Result<PayloadBlob>> + Send;
}

/// Contents of the `--experimental-sea-config` descriptor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeaConfig<'a> {
    main: &'a Path,
    output: &'a Path,
    #[serde(rename = "disableExperimentalSEAWarning")]
    disable_experimental_sea_warning: bool,
}

/// [`PayloadGenerator`] that runs the host's `node --experimental-sea-config`.
#[derive(Debug, Clone, Default)]
pub struct NodeSeaConfig {
    node: Option<PathBuf>,
    keep_intermediate: bool,
}

impl NodeSeaConfig {
    /// Uses the `node` found on `PATH`.
    pub fn new(keep_intermediate: bool) -> Self {
        Self {
            node: None,
            keep_intermediate,
        }
    }

    /// Uses a specific `node` executable.
    pub fn with_node(mut self, node: PathBuf) -> Self {
        self.node = Some(node);
        self
    }

    fn node(&self) -> Result<PathBuf> {
        match &self.node {
            Some(node) => Ok(node.clone()),
            None => tool_detection::node()
                .map_err(|e| Error::PayloadBuild(e.to_string())),
        }
    }
}

impl PayloadGenerator for NodeSeaConfig {
    async fn build_payload(&self, entry: &Path, scratch_dir: &Path) -> Result<PayloadBlob> {
        if !fs::exists(entry).await {
            return Err(Error::PayloadBuild(format!(
                "entry point {} does not exist",
                entry.display()
            )));
        }

        let name = entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::PayloadBuild(format!("entry point {} has no file name", entry.display()))
            })?;

        fs::create_dir_all(scratch_dir).await?;
        let config_path = scratch_dir.join(format!("{}.json", name));
        let blob_path = scratch_dir.join(format!("{}.blob", name));

        let config = serde_json::to_vec(&SeaConfig {
            main: entry,
            output: &blob_path,
            disable_experimental_sea_warning: true,
        })
        .map_err(|e| Error::PayloadBuild(format!("Failed to serialize SEA config: {}", e)))?;
        tokio::fs::write(&config_path, config)
            .await
            .fs_context("writing SEA config", &config_path)?;

        let node = self.node()?;
        log::debug!(
            "Running {} --experimental-sea-config {}",
            node.display(),
            config_path.display()
        );
        let status = tokio::process::Command::new(&node)
            .arg("--experimental-sea-config")
            .arg(&config_path)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| Error::CommandFailed {
                command: format!("{} --experimental-sea-config", node.display()),
                error: e,
            })?;

        if !status.success() {
            return Err(Error::PayloadBuild(format!(
                "node --experimental-sea-config exited with {}",
                status
            )));
        }

        let blob = match tokio::fs::read(&blob_path).await {
            Ok(data) => data,
            Err(e) => {
                return Err(Error::PayloadBuild(format!(
                    "blob {} was not produced: {}",
                    blob_path.display(),
                    e
                )));
            }
        };

        if !self.keep_intermediate {
            log::debug!("Removing intermediate: {}", config_path.display());
            fs::remove_file(&config_path).await?;
            log::debug!("Removing intermediate: {}", blob_path.display());
            fs::remove_file(&blob_path).await?;
        }

        let payload = PayloadBlob::new(blob);
        if payload.is_empty() {
            return Err(Error::PayloadBuild(format!(
                "blob {} is empty",
                blob_path.display()
            )));
        }
        log::debug!("Payload: {} bytes", payload.len());
        Ok(payload)
    }
}

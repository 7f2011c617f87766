//! HTTP utilities for downloading Node.js runtime archives.

use crate::bundler::error::{Error, ErrorExt, Result};
use futures_lite::StreamExt;
use std::{path::Path, time::Duration};
use tokio::io::AsyncWriteExt;

/// Builds the HTTP client used for runtime downloads.
///
/// `timeout` bounds each whole request, body included.
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("xsea/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .build()
        .map_err(|e| Error::GenericError(format!("Failed to create HTTP client: {}", e)))
}

/// Streams the body of `url` into `dest`.
///
/// Non-success status codes are errors. Returns the number of bytes written.
pub async fn download_to_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    log::debug!("Fetching: {}", url);

    let download_error = |reason: String| Error::Download {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| download_error(e.to_string()))?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .fs_context("creating download file", dest)?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| download_error(format!("Failed to read response: {}", e)))?;
        file.write_all(&chunk)
            .await
            .fs_context("writing download file", dest)?;
        written += chunk.len() as u64;
    }
    file.flush().await.fs_context("flushing download file", dest)?;

    log::debug!("Downloaded {} bytes to {}", written, dest.display());
    Ok(written)
}

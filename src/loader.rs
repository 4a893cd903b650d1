//! Spec document loading.
//!
//! The input location is either a local path (resolved against the project
//! root) or an http(s) URL. Remote documents are buffered in full before
//! parsing; there is no streaming parse. A missing file or failed fetch
//! aborts the run.

use std::fs;
use std::path::Path;
use tracing::debug;

/// Load the raw spec text from a local path or remote location.
pub async fn load_spec_text(location: &str, project_root: &Path) -> Result<String, String> {
    if location.starts_with("http://") || location.starts_with("https://") {
        fetch_remote(location).await
    } else {
        let path = project_root.join(location);
        debug!(path = %path.display(), "Reading API description from disk.");
        fs::read_to_string(&path)
            .map_err(|err| format!("Failed to read spec at {}: {err}", path.display()))
    }
}

async fn fetch_remote(url: &str) -> Result<String, String> {
    debug!(url = %url, "Fetching API description.");
    let response = reqwest::get(url)
        .await
        .map_err(|err| format!("Failed to fetch spec from {url}: {err}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status} when fetching {url}"));
    }

    response
        .text()
        .await
        .map_err(|err| format!("Failed to read spec response body: {err}"))
}

//! HTTP boundary for progscout.
//!
//! Program pages and curriculum documents are fetched through one
//! [`Fetcher`]. Single-attempt by design: timeouts and non-success statuses
//! surface as [`ProgScoutError::Fetch`] and the caller decides what to do.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use progscout_shared::{FetchConfig, ProgScoutError, Result};

/// HTTP client wrapper, the only network I/O boundary in the workspace.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    download_timeout: Duration,
}

impl Fetcher {
    /// Build a client with the configured User-Agent, a redirect limit, and
    /// the page timeout as the per-request default.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .build()
            .map_err(|e| ProgScoutError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        })
    }

    /// Fetch a program page and decode the body as text.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        debug!("fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ProgScoutError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProgScoutError::Fetch(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ProgScoutError::Fetch(format!("{url}: body read failed: {e}")))
    }

    /// Download a curriculum document as raw bytes. Documents run larger
    /// than pages, so the longer download timeout applies here.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn download_document(&self, url: &Url) -> Result<Vec<u8>> {
        debug!("downloading document");

        let response = self
            .client
            .get(url.as_str())
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| ProgScoutError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProgScoutError::Fetch(format!("{url}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProgScoutError::Fetch(format!("{url}: body read failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}

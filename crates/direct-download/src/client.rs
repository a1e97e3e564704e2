//! HTTP fetch for intercepted navigations.
//!
//! The host performs the request itself, so the whole body is fetched in
//! one go and handed to the finalizer without chunking.

use blobbridge_transfer::{BridgeHost, StagedFile, generate_transfer_id};
use reqwest::Url;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::DownloadError;
use crate::filename::derive_filename;
use crate::matcher::DownloadMatcher;

/// A fetched resource.
#[derive(Debug, Clone)]
pub struct Download {
    /// Sanitized filename derived from the response.
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fetches downloadable navigations and stages them through the bridge host.
pub struct DirectDownloader {
    http: reqwest::Client,
    matcher: DownloadMatcher,
}

impl DirectDownloader {
    pub fn new(matcher: DownloadMatcher) -> Result<Self, DownloadError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, matcher })
    }

    pub fn matcher(&self) -> &DownloadMatcher {
        &self.matcher
    }

    /// Fetches `url` and derives its filename.
    pub async fn fetch(&self, url: &str) -> Result<Download, DownloadError> {
        let url = Url::parse(url).map_err(|e| DownloadError::InvalidUrl(e.to_string()))?;
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
            });
        }

        let disposition = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        // The final URL reflects redirects.
        let filename = derive_filename(disposition, resp.url());
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = resp.bytes().await?.to_vec();
        debug!(url = %url, filename = %filename, size = bytes.len(), "direct download fetched");

        Ok(Download {
            filename,
            content_type,
            bytes,
        })
    }

    /// Handles a navigation: downloads and shares it if the URL matches,
    /// otherwise returns `Ok(None)` and the navigation proceeds normally.
    pub async fn intercept(
        &self,
        url: &str,
        host: &BridgeHost,
    ) -> Result<Option<StagedFile>, DownloadError> {
        if !self.matcher.matches(url) {
            return Ok(None);
        }
        self.download_to(url, host).await.map(Some)
    }

    /// Downloads `url` and routes it through the host's finalizer and share
    /// facility. The start is announced under the URL's name before the
    /// request goes out; failures are reported through the host's events.
    pub async fn download_to(
        &self,
        url: &str,
        host: &BridgeHost,
    ) -> Result<StagedFile, DownloadError> {
        let id = generate_transfer_id();
        info!(id = %id, url, "intercepted download");

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                let err = DownloadError::InvalidUrl(e.to_string());
                host.report_failure(&id, &err.to_string());
                return Err(err);
            }
        };
        host.announce(&id, &derive_filename(None, &parsed));

        let download = match self.fetch(url).await {
            Ok(d) => d,
            Err(e) => {
                host.report_failure(&id, &e.to_string());
                return Err(e);
            }
        };

        let staged = host
            .stage_and_share(&id, &download.filename, &download.bytes)
            .await?;
        Ok(staged)
    }
}

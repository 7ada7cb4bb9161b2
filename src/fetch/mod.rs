//! Fetching external import maps
//!
//! The network layer is a collaborator: anything implementing [`Fetcher`] can
//! supply payload bytes. Integrity metadata is checked here, after the fetch.

pub mod integrity;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::IngestError;

/// Source of external resource bytes
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body of `url`
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, IngestError>;
}

/// Fetch `url` as UTF-8 text, honouring declared integrity metadata
pub async fn fetch_text(
    fetcher: &dyn Fetcher,
    url: &Url,
    integrity: Option<&str>,
) -> Result<String, IngestError> {
    let bytes = fetcher.fetch(url).await?;

    if let Some(metadata) = integrity {
        integrity::verify(metadata, &bytes).map_err(|reason| {
            warn!("Integrity check failed for {}: {}", url, reason);
            IngestError::IntegrityMismatch {
                url: url.to_string(),
                reason,
            }
        })?;
    }

    String::from_utf8(bytes).map_err(|e| IngestError::FetchFailed {
        url: url.to_string(),
        reason: format!("response is not valid UTF-8: {}", e),
    })
}

/// Reads `file:` URLs from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, IngestError> {
        let path = url.to_file_path().map_err(|_| IngestError::FetchFailed {
            url: url.to_string(),
            reason: "not a file URL".to_string(),
        })?;
        debug!("Reading {:?}", path);
        tokio::fs::read(&path)
            .await
            .map_err(|e| IngestError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Fetches over HTTP(S)
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, IngestError> {
        let failed = |reason: String| IngestError::FetchFailed {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        Ok(body.to_vec())
    }
}

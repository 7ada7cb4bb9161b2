//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

use importmap_ingest::error::{format_error, MODULE_LOAD_FAILURE_CODE};
use importmap_ingest::import_map::LiteralComposer;
use importmap_ingest::{
    Fetcher, ImportBootstrap, IngestError, MemoryDocument, ModuleImporter, ModuleLoadError,
};

pub const BASE_URL: &str = "https://site.com/";

pub fn base_url() -> Url {
    Url::parse(BASE_URL).unwrap()
}

pub fn url(path: &str) -> Url {
    base_url().join(path).unwrap()
}

/// Fetcher whose responses are released by the test, one URL at a time
#[derive(Default)]
pub struct GatedFetcher {
    gates: Mutex<HashMap<String, oneshot::Receiver<Result<Vec<u8>, IngestError>>>>,
    requested: Mutex<Vec<String>>,
}

/// Test-side handle releasing one gated response
pub struct Gate(oneshot::Sender<Result<Vec<u8>, IngestError>>);

impl Gate {
    pub fn release(self, body: &str) {
        let _ = self.0.send(Ok(body.as_bytes().to_vec()));
    }

    pub fn fail(self, reason: &str) {
        let _ = self.0.send(Err(IngestError::FetchFailed {
            url: "gated".to_string(),
            reason: reason.to_string(),
        }));
    }
}

impl GatedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `url` and get the handle that will complete its fetch
    pub fn gate(&self, url: &Url) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(url.to_string(), rx);
        Gate(tx)
    }

    /// URLs fetched so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, IngestError> {
        self.requested.lock().unwrap().push(url.to_string());
        let gate = self.gates.lock().unwrap().remove(url.as_str());
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(IngestError::FetchFailed {
                    url: url.to_string(),
                    reason: "gate dropped".to_string(),
                })
            }),
            None => Err(IngestError::FetchFailed {
                url: url.to_string(),
                reason: "404".to_string(),
            }),
        }
    }
}

/// Fetcher serving fixed bodies after fixed delays
#[derive(Default)]
pub struct DelayedFetcher {
    responses: HashMap<String, (Duration, String)>,
}

impl DelayedFetcher {
    pub fn with_response(mut self, url: &Url, delay: Duration, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), (delay, body.to_string()));
        self
    }
}

#[async_trait]
impl Fetcher for DelayedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, IngestError> {
        let (delay, body) = self
            .responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| IngestError::FetchFailed {
                url: url.to_string(),
                reason: "404".to_string(),
            })?;
        tokio::time::sleep(delay).await;
        Ok(body.into_bytes())
    }
}

/// Importer recording every specifier and failing the configured ones
#[derive(Default)]
pub struct RecordingImporter {
    imported: Mutex<Vec<String>>,
    failures: HashMap<String, String>,
}

impl RecordingImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `specifier` with a genuine load-failure message
    pub fn failing_load(mut self, specifier: &str) -> Self {
        let message = format_error(
            MODULE_LOAD_FAILURE_CODE,
            &format!("Error loading {}", specifier),
        );
        self.failures.insert(specifier.to_string(), message);
        self
    }

    /// Fail `specifier` with an arbitrary message
    pub fn failing_with(mut self, specifier: &str, message: &str) -> Self {
        self.failures
            .insert(specifier.to_string(), message.to_string());
        self
    }

    pub fn imported(&self) -> Vec<String> {
        self.imported.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModuleImporter for RecordingImporter {
    async fn import(&self, specifier: &str) -> Result<(), ModuleLoadError> {
        self.imported.lock().unwrap().push(specifier.to_string());
        match self.failures.get(specifier) {
            Some(message) => Err(ModuleLoadError::new(specifier, message.clone())),
            None => Ok(()),
        }
    }
}

/// Bootstrap over `document` with verbatim merging, without a start-up scan
pub fn literal_bootstrap(
    document: Arc<MemoryDocument>,
    fetcher: Arc<dyn Fetcher>,
    importer: Arc<dyn ModuleImporter>,
) -> ImportBootstrap {
    ImportBootstrap::builder(base_url())
        .with_document(document)
        .with_fetcher(fetcher)
        .with_importer(importer)
        .with_composer(Arc::new(LiteralComposer))
        .with_scan_on_start(false)
        .build()
}

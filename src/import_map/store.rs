//! Shared import map store
//!
//! Owns the one live [`ImportMap`] and the base URL used as default merge
//! context. Queued merges and direct ingestion both end up in [`ImportMapStore::apply`].

use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use url::Url;

use crate::error::IngestError;
use crate::import_map::{ImportMap, ImportMapComposer};

/// Import map payload as delivered by a declaration
#[derive(Debug, Clone, PartialEq)]
pub enum MapPayload {
    /// Raw JSON text (inline body or fetched response)
    Text(String),
    /// Already parsed JSON
    Json(Value),
}

impl MapPayload {
    fn into_json(self) -> Result<Value, serde_json::Error> {
        match self {
            MapPayload::Text(text) => serde_json::from_str(&text),
            MapPayload::Json(value) => Ok(value),
        }
    }
}

impl From<String> for MapPayload {
    fn from(text: String) -> Self {
        MapPayload::Text(text)
    }
}

impl From<&str> for MapPayload {
    fn from(text: &str) -> Self {
        MapPayload::Text(text.to_string())
    }
}

impl From<Value> for MapPayload {
    fn from(value: Value) -> Self {
        MapPayload::Json(value)
    }
}

struct StoreInner {
    map: RwLock<ImportMap>,
    base_url: Url,
    composer: Arc<dyn ImportMapComposer>,
}

/// Handle to the live import map (cheap to clone)
#[derive(Clone)]
pub struct ImportMapStore {
    inner: Arc<StoreInner>,
}

impl ImportMapStore {
    pub fn new(base_url: Url, composer: Arc<dyn ImportMapComposer>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                map: RwLock::new(ImportMap::new()),
                base_url,
                composer,
            }),
        }
    }

    /// Process-wide base URL
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Copy of the current merged map
    pub fn snapshot(&self) -> ImportMap {
        self.read(ImportMap::clone)
    }

    /// Run `f` against the live map
    pub fn read<R>(&self, f: impl FnOnce(&ImportMap) -> R) -> R {
        let guard = self.inner.map.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Parse and merge `payload` with `map_url` as merge context
    ///
    /// Parse and merge failures both come back as
    /// [`IngestError::MalformedImportMapPayload`].
    pub fn apply(&self, payload: MapPayload, map_url: &Url) -> Result<(), IngestError> {
        let document = payload.into_json().map_err(IngestError::malformed)?;

        let mut map = self.inner.map.write().unwrap_or_else(|e| e.into_inner());
        self.inner
            .composer
            .compose(&document, map_url, &mut map)
            .map_err(IngestError::malformed)?;

        debug!(
            "Merged import map from {} ({} imports, {} scopes)",
            map_url,
            map.imports.len(),
            map.scopes.len()
        );
        Ok(())
    }

    /// Merge import map text directly against the base URL
    ///
    /// Bypasses the ingestion queue entirely: the merge is visible as soon as
    /// this returns, and a failure here never affects queued merges.
    pub fn ingest(&self, text: &str) -> Result<(), IngestError> {
        let base_url = self.inner.base_url.clone();
        self.apply(MapPayload::from(text), &base_url).map_err(|e| {
            warn!("Direct import map ingestion failed: {}", e);
            IngestError::DirectIngestFailure(e.to_string())
        })
    }
}

impl std::fmt::Debug for ImportMapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportMapStore")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

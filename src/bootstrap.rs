//! Import map bootstrap
//!
//! [`ImportBootstrap`] is the single owned state object: it creates the store,
//! the queue, the scanner and the trigger once, wires them to the host
//! collaborators, and exposes the surface the resolver and runtime use.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;
use url::Url;

use crate::config::BootstrapConfig;
use crate::document::{DocumentScanner, HostDocument, NoDocument, ScanReport};
use crate::error::IngestError;
use crate::fetch::{FileFetcher, Fetcher};
use crate::import_map::{ImportMap, ImportMapComposer, ImportMapStore, ResolvingComposer};
use crate::ingest::{ImportTrigger, IngestionQueue};
use crate::loader::{ModuleImporter, NoopImporter};

/// Builder for [`ImportBootstrap`]
pub struct BootstrapBuilder {
    base_url: Url,
    document: Arc<dyn HostDocument>,
    importer: Arc<dyn ModuleImporter>,
    fetcher: Arc<dyn Fetcher>,
    composer: Arc<dyn ImportMapComposer>,
    scan_on_start: bool,
    runtime: Option<Handle>,
}

impl BootstrapBuilder {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            document: Arc::new(NoDocument),
            importer: Arc::new(NoopImporter),
            fetcher: Arc::new(FileFetcher),
            composer: Arc::new(ResolvingComposer),
            scan_on_start: true,
            runtime: None,
        }
    }

    /// Builder seeded from configuration (base URL, composer, start-up scan)
    pub fn from_config(config: &BootstrapConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.base_url()?)
            .with_composer(config.composer.build())
            .with_scan_on_start(config.scan_on_start))
    }

    pub fn with_document(mut self, document: Arc<dyn HostDocument>) -> Self {
        self.document = document;
        self
    }

    pub fn with_importer(mut self, importer: Arc<dyn ModuleImporter>) -> Self {
        self.importer = importer;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_composer(mut self, composer: Arc<dyn ImportMapComposer>) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_scan_on_start(mut self, scan_on_start: bool) -> Self {
        self.scan_on_start = scan_on_start;
        self
    }

    /// Runtime for the queue worker, payload fetches and module imports
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the bootstrap
    ///
    /// With a document context and `scan_on_start`, the document is scanned
    /// before this returns.
    ///
    /// # Panics
    /// Panics when no runtime was given with [`BootstrapBuilder::with_runtime`]
    /// and this is called outside a tokio runtime.
    pub fn build(self) -> ImportBootstrap {
        let handle = self.runtime.unwrap_or_else(Handle::current);
        let store = ImportMapStore::new(self.base_url, self.composer);
        let queue = IngestionQueue::with_handle(store.clone(), handle);
        let scanner = Arc::new(DocumentScanner::new(
            Arc::clone(&self.document),
            store.clone(),
            queue.clone(),
            self.importer,
            self.fetcher,
        ));
        let trigger = ImportTrigger::new(Arc::clone(&scanner), queue.clone());

        let has_document = self.document.has_document_context();
        info!(
            "Import map bootstrap ready (base {}, document: {})",
            store.base_url(),
            has_document
        );

        let bootstrap = ImportBootstrap {
            store,
            queue,
            scanner,
            trigger,
        };
        if has_document && self.scan_on_start {
            bootstrap.scan();
        }
        bootstrap
    }
}

/// Owner of the import map store, queue, scanner and resolver gate
#[derive(Debug)]
pub struct ImportBootstrap {
    store: ImportMapStore,
    queue: IngestionQueue,
    scanner: Arc<DocumentScanner>,
    trigger: ImportTrigger,
}

impl ImportBootstrap {
    pub fn builder(base_url: Url) -> BootstrapBuilder {
        BootstrapBuilder::new(base_url)
    }

    /// Gate for the resolver; see [`ImportTrigger::prepare_import`]
    pub fn prepare_import(
        &self,
        force_process: bool,
    ) -> impl Future<Output = Result<(), IngestError>> + Send + 'static {
        self.trigger.prepare_import(force_process)
    }

    /// Merge import map text directly against the base URL
    pub fn ingest_import_map(&self, text: &str) -> Result<(), IngestError> {
        self.store.ingest(text)
    }

    /// Copy of the merged import map
    pub fn import_map(&self) -> ImportMap {
        self.store.snapshot()
    }

    /// Run a discovery pass now (callable from any thread)
    pub fn scan(&self) -> ScanReport {
        self.scanner.scan()
    }

    /// Document-ready signal (effective once)
    pub fn document_ready(&self) -> Option<ScanReport> {
        self.trigger.document_ready()
    }

    pub fn base_url(&self) -> &Url {
        self.store.base_url()
    }

    pub fn store(&self) -> &ImportMapStore {
        &self.store
    }

    pub fn queue(&self) -> &IngestionQueue {
        &self.queue
    }

    pub fn scanner(&self) -> &DocumentScanner {
        &self.scanner
    }
}

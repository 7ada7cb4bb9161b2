//! Declaration discovery
//!
//! A scan walks the host document in order and dispatches every recognised
//! declaration that has not been dispatched before. The processed set is
//! updated before anything else happens to an element, and a whole pass runs
//! under one lock, so overlapping scans can neither double-dispatch an element
//! nor interleave their enqueue order.

use futures::FutureExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::document::{
    DeclarationElement, DeclarationKind, DeclarationSource, ElementId, ErrorEvent, HostDocument,
};
use crate::error::{IngestError, ModuleLoadError};
use crate::fetch::{fetch_text, Fetcher};
use crate::import_map::{ImportMapStore, MapPayload};
use crate::ingest::queue::{IngestionQueue, PayloadFuture};
use crate::loader::ModuleImporter;
use crate::url_resolve::resolve_url;

/// Prefix marking a module `src` as a literal specifier rather than a URL
pub const IMPORT_SPECIFIER_PREFIX: &str = "import:";

/// A module import started by a scan
///
/// Dropping it leaves the import running; awaiting [`PendingImport::wait`]
/// surfaces its failure.
#[derive(Debug)]
pub struct PendingImport {
    pub element: ElementId,
    pub specifier: String,
    handle: JoinHandle<Result<(), ModuleLoadError>>,
}

impl PendingImport {
    /// Wait for the import to finish
    pub async fn wait(self) -> Result<(), ModuleLoadError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ModuleLoadError::new(
                self.specifier,
                format!("import task failed: {}", e),
            )),
        }
    }
}

/// What a single scan pass did
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Module imports started, in document order
    pub imports: Vec<PendingImport>,
    /// Import maps enqueued, with their queue sequence numbers
    pub import_maps: Vec<(ElementId, u64)>,
    /// Recognised elements skipped because an earlier scan handled them
    pub already_processed: usize,
    /// Module declarations without a `src`
    pub empty_modules: usize,
}

impl ScanReport {
    /// Whether this pass dispatched anything
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.import_maps.is_empty()
    }
}

/// Scans the host document for module and import map declarations
pub struct DocumentScanner {
    document: Arc<dyn HostDocument>,
    store: ImportMapStore,
    queue: IngestionQueue,
    importer: Arc<dyn ModuleImporter>,
    fetcher: Arc<dyn Fetcher>,
    processed: Mutex<HashSet<ElementId>>,
    passes: AtomicU64,
}

impl DocumentScanner {
    pub fn new(
        document: Arc<dyn HostDocument>,
        store: ImportMapStore,
        queue: IngestionQueue,
        importer: Arc<dyn ModuleImporter>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            document,
            store,
            queue,
            importer,
            fetcher,
            processed: Mutex::new(HashSet::new()),
            passes: AtomicU64::new(0),
        }
    }

    pub fn document(&self) -> &Arc<dyn HostDocument> {
        &self.document
    }

    /// Number of scan passes run so far
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Whether `element` has been dispatched
    pub fn is_processed(&self, element: ElementId) -> bool {
        self.processed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&element)
    }

    /// Dispatch every recognised, not yet processed declaration
    ///
    /// Imports and fetches run on the queue's runtime, so any thread may scan.
    pub fn scan(&self) -> ScanReport {
        let mut processed = self.processed.lock().unwrap_or_else(|e| e.into_inner());
        let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        let mut report = ScanReport::default();

        for element in self.document.declarations() {
            if element.kind == DeclarationKind::Unrecognized {
                continue;
            }
            if !processed.insert(element.id) {
                report.already_processed += 1;
                continue;
            }

            match element.kind {
                DeclarationKind::Module => match self.dispatch_module(&element) {
                    Some(import) => report.imports.push(import),
                    None => report.empty_modules += 1,
                },
                DeclarationKind::ImportMap => {
                    let seq = self.dispatch_import_map(&element);
                    report.import_maps.push((element.id, seq));
                }
                DeclarationKind::Unrecognized => {}
            }
        }

        info!(
            "Scan pass {}: {} module imports, {} import maps, {} already processed",
            pass,
            report.imports.len(),
            report.import_maps.len(),
            report.already_processed
        );
        report
    }

    /// Module specifier for a module declaration's `src`
    fn module_specifier(&self, src: &str) -> String {
        match src.strip_prefix(IMPORT_SPECIFIER_PREFIX) {
            Some(specifier) => specifier.to_string(),
            None => resolve_url(src, self.store.base_url()).unwrap_or_else(|| src.to_string()),
        }
    }

    fn dispatch_module(&self, element: &DeclarationElement) -> Option<PendingImport> {
        let DeclarationSource::External(src) = &element.source else {
            debug!("Module declaration {} has no src, nothing to import", element.id);
            return None;
        };

        let specifier = self.module_specifier(src);
        debug!("Importing {} for module declaration {}", specifier, element.id);

        let importer = Arc::clone(&self.importer);
        let document = Arc::clone(&self.document);
        let element_id = element.id;
        let import_specifier = specifier.clone();
        let handle = self.queue.handle().spawn(async move {
            importer.import(&import_specifier).await.map_err(|e| {
                if e.is_load_failure() {
                    document.dispatch_error_event(element_id, ErrorEvent::load_error());
                }
                warn!("Module import {} failed: {}", import_specifier, e);
                e
            })
        });

        Some(PendingImport {
            element: element.id,
            specifier,
            handle,
        })
    }

    fn dispatch_import_map(&self, element: &DeclarationElement) -> u64 {
        let base_url = self.store.base_url();
        let (map_url, payload): (Url, PayloadFuture) = match &element.source {
            DeclarationSource::Inline(text) => {
                let text = text.clone();
                let payload = async move { Ok::<_, IngestError>(MapPayload::Text(text)) };
                (base_url.clone(), payload.boxed())
            }
            DeclarationSource::External(src) => {
                match resolve_url(src, base_url).and_then(|u| Url::parse(&u).ok()) {
                    Some(url) => {
                        let fetcher = Arc::clone(&self.fetcher);
                        let integrity = element.integrity.clone();
                        let fetch_url = url.clone();
                        let payload = async move {
                            fetch_text(fetcher.as_ref(), &fetch_url, integrity.as_deref())
                                .await
                                .map(MapPayload::Text)
                        };
                        (url, payload.boxed())
                    }
                    None => {
                        let err = IngestError::FetchFailed {
                            url: src.clone(),
                            reason: "invalid URL".to_string(),
                        };
                        let payload = async move { Err::<MapPayload, _>(err) };
                        (base_url.clone(), payload.boxed())
                    }
                }
            }
        };

        debug!("Enqueueing import map declaration {} ({})", element.id, map_url);
        self.queue.enqueue(map_url, payload)
    }
}

impl std::fmt::Debug for DocumentScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentScanner")
            .field("passes", &self.passes())
            .finish_non_exhaustive()
    }
}

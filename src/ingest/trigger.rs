//! Resolver gate
//!
//! The resolver awaits [`ImportTrigger::prepare_import`] before resolving any
//! specifier. The first call in a document environment runs a scan so that
//! declarations present at startup are always seen.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::document::{DocumentScanner, ScanReport};
use crate::error::IngestError;
use crate::ingest::queue::IngestionQueue;

/// Synchronisation point between declaration discovery and resolution
pub struct ImportTrigger {
    scanner: Arc<DocumentScanner>,
    queue: IngestionQueue,
    process_first: AtomicBool,
    ready_handled: AtomicBool,
}

impl ImportTrigger {
    pub fn new(scanner: Arc<DocumentScanner>, queue: IngestionQueue) -> Self {
        let has_document = scanner.document().has_document_context();
        Self {
            scanner,
            queue,
            process_first: AtomicBool::new(has_document),
            ready_handled: AtomicBool::new(false),
        }
    }

    fn has_document(&self) -> bool {
        self.scanner.document().has_document_context()
    }

    /// Gate resolution on all import maps queued so far
    ///
    /// Scans first if this is the first call or `force_process` is set, but
    /// only when a document exists. The returned future covers the tasks
    /// enqueued up to and including that scan.
    pub fn prepare_import(
        &self,
        force_process: bool,
    ) -> impl Future<Output = Result<(), IngestError>> + Send + 'static {
        let first = self.process_first.swap(false, Ordering::SeqCst);
        if (first || force_process) && self.has_document() {
            debug!("Scanning before import (first: {}, forced: {})", first, force_process);
            // module imports keep running; failures are reported on their element
            self.scanner.scan();
        }
        self.queue.settled()
    }

    /// Document-ready signal; scans at most once per lifetime
    pub fn document_ready(&self) -> Option<ScanReport> {
        if !self.has_document() || self.ready_handled.swap(true, Ordering::SeqCst) {
            return None;
        }
        debug!("Document ready, scanning declarations");
        Some(self.scanner.scan())
    }
}

impl std::fmt::Debug for ImportTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportTrigger")
            .field("process_first", &self.process_first.load(Ordering::SeqCst))
            .field("ready_handled", &self.ready_handled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

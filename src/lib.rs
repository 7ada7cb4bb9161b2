//! Import map bootstrap ingestion
//!
//! This crate is the discovery and ingestion layer that sits in front of a
//! module resolver. It finds module and import map declarations in a host
//! document, dispatches each one exactly once, and merges any number of
//! import maps into one map strictly in document order, no matter in which
//! order their payloads arrive.
//!
//! ## Components
//!
//! 1. [`ImportMapStore`] - the live merged map and the base URL
//! 2. [`IngestionQueue`] - ordered, single-consumer merge queue
//! 3. [`DocumentScanner`] - exactly-once declaration dispatch
//! 4. [`ImportTrigger`] - the gate the resolver awaits before resolving
//!
//! [`ImportBootstrap`] wires them together.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use importmap_ingest::{ImportBootstrap, MemoryDocument};
//! use url::Url;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Arc::new(MemoryDocument::new());
//! document.add_inline_import_map(r#"{"imports":{"app":"/app/main.js"}}"#);
//!
//! let bootstrap = ImportBootstrap::builder(Url::parse("https://example.com/")?)
//!     .with_document(document)
//!     .build();
//! bootstrap.prepare_import(false).await?;
//! assert_eq!(
//!     bootstrap.import_map().resolve("app", None).as_deref(),
//!     Some("https://example.com/app/main.js")
//! );
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod import_map;
pub mod ingest;
pub mod loader;
pub mod url_resolve;
pub mod utils;

pub use bootstrap::{BootstrapBuilder, ImportBootstrap};
pub use config::BootstrapConfig;
pub use document::{
    DeclarationElement, DeclarationKind, DeclarationSource, DocumentScanner, ElementId,
    HostDocument, MemoryDocument, NoDocument, ScanReport,
};
pub use error::{IngestError, ModuleLoadError};
pub use fetch::{FileFetcher, Fetcher};
pub use import_map::{ImportMap, ImportMapComposer, ImportMapStore, MapPayload};
pub use ingest::{ImportTrigger, IngestionQueue, QueueStats};
pub use loader::{ModuleImporter, NoopImporter};

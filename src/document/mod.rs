//! Host document abstraction
//!
//! The scanner never touches a real DOM. It sees the document through
//! [`HostDocument`], which enumerates declaration elements and delivers error
//! events back to them. [`NoDocument`] stands in for headless environments.

pub mod html;
pub mod memory;
pub mod scanner;

use serde::{Deserialize, Serialize};

pub use memory::MemoryDocument;
pub use scanner::{DocumentScanner, PendingImport, ScanReport};

/// Stable identity of an element within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a declaration element asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// Eagerly import a module
    Module,
    /// Merge an import map
    ImportMap,
    /// Any other script type; never touched
    Unrecognized,
}

/// Where a declaration's content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationSource {
    /// Element body (no `src` attribute)
    Inline(String),
    /// `src` attribute value
    External(String),
}

/// A script-like element of the host document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationElement {
    pub id: ElementId,
    pub kind: DeclarationKind,
    pub source: DeclarationSource,
    pub integrity: Option<String>,
}

/// `type` attribute values that mark declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationTypes {
    #[serde(default = "default_module_type")]
    pub module: String,
    #[serde(default = "default_import_map_type")]
    pub import_map: String,
}

fn default_module_type() -> String {
    "systemjs-module".to_string()
}

fn default_import_map_type() -> String {
    "systemjs-importmap".to_string()
}

impl Default for DeclarationTypes {
    fn default() -> Self {
        Self {
            module: default_module_type(),
            import_map: default_import_map_type(),
        }
    }
}

impl DeclarationTypes {
    /// Classify an element by its `type` attribute
    pub fn classify(&self, type_attr: &str) -> DeclarationKind {
        if type_attr == self.module {
            DeclarationKind::Module
        } else if type_attr == self.import_map {
            DeclarationKind::ImportMap
        } else {
            DeclarationKind::Unrecognized
        }
    }
}

/// Synthetic event delivered to a declaration element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEvent {
    pub event_type: &'static str,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl ErrorEvent {
    /// Non-bubbling, non-cancelable `error` event
    pub const fn load_error() -> Self {
        Self {
            event_type: "error",
            bubbles: false,
            cancelable: false,
        }
    }
}

/// Capability interface onto the host document
pub trait HostDocument: Send + Sync {
    /// Whether a document exists at all in this environment
    fn has_document_context(&self) -> bool;

    /// All current declaration elements, in document order
    fn declarations(&self) -> Vec<DeclarationElement>;

    /// Deliver `event` to the element, if it still exists
    fn dispatch_error_event(&self, element: ElementId, event: ErrorEvent);
}

/// Headless environment: no document, nothing to scan
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocument;

impl HostDocument for NoDocument {
    fn has_document_context(&self) -> bool {
        false
    }

    fn declarations(&self) -> Vec<DeclarationElement> {
        Vec::new()
    }

    fn dispatch_error_event(&self, _element: ElementId, _event: ErrorEvent) {}
}

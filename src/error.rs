//! Error types for import-map ingestion
//!
//! Every failure in this layer is either returned from a future the caller awaits
//! or returned synchronously. Nothing is retried.

use thiserror::Error;

/// Base of the documentation link appended to coded error messages
pub const ERROR_DOCS_URL: &str = "https://git.io/JvFET";

/// Error code for an import map payload that failed to parse or compose
pub const INVALID_IMPORT_MAP_CODE: u32 = 1;

/// Error code the module loader uses when a module genuinely failed to load
pub const MODULE_LOAD_FAILURE_CODE: u32 = 3;

/// Format a coded diagnostic message
///
/// The message always ends with the documentation link for `code`, which is what
/// [`is_load_failure_message`] matches on.
pub fn format_error(code: u32, detail: &str) -> String {
    if detail.is_empty() {
        format!("Error#{} {}#{}", code, ERROR_DOCS_URL, code)
    } else {
        format!("{} ({}#{})", detail, ERROR_DOCS_URL, code)
    }
}

/// Whether a module loader message carries the load-failure signature
pub fn is_load_failure_message(message: &str) -> bool {
    message.contains(&format!("{}#{}", ERROR_DOCS_URL, MODULE_LOAD_FAILURE_CODE))
}

/// Import map ingestion errors
///
/// Cloneable so that the first failure of the queue can be handed to every
/// completion future observing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// JSON parse or merge failure while applying a queued import map
    #[error("{message}: {cause}")]
    MalformedImportMapPayload { message: String, cause: String },

    /// The external import map could not be fetched
    #[error("Failed to fetch import map {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// Fetched bytes did not match the declared integrity metadata
    #[error("Integrity check failed for {url}: {reason}")]
    IntegrityMismatch { url: String, reason: String },

    /// Parse or merge failure from direct programmatic ingestion
    #[error("Direct import map ingestion failed: {0}")]
    DirectIngestFailure(String),

    /// The queue worker is no longer running
    #[error("Import map queue closed")]
    QueueClosed,
}

impl IngestError {
    /// Build the coded payload error for a parse or merge failure
    pub fn malformed(cause: impl ToString) -> Self {
        IngestError::MalformedImportMapPayload {
            message: format_error(INVALID_IMPORT_MAP_CODE, "import map contains invalid JSON"),
            cause: cause.to_string(),
        }
    }
}

/// Failure reported by the module loader for an eagerly started import
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to import {specifier}: {message}")]
pub struct ModuleLoadError {
    pub specifier: String,
    pub message: String,
}

impl ModuleLoadError {
    pub fn new(specifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            message: message.into(),
        }
    }

    /// Whether this failure means the module really failed to load
    pub fn is_load_failure(&self) -> bool {
        is_load_failure_message(&self.message)
    }
}

/// Errors from the merge algorithm
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("Import map is null")]
    Null,
}

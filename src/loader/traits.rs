//! Module loader traits

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModuleLoadError;

/// Import operation of the module resolver/loader
///
/// Implementations are expected to gate bare specifier resolution on
/// [`ImportBootstrap::prepare_import`](crate::ImportBootstrap::prepare_import).
#[async_trait]
pub trait ModuleImporter: Send + Sync {
    /// Import the module named by `specifier` (a URL or a bare specifier)
    async fn import(&self, specifier: &str) -> Result<(), ModuleLoadError>;
}

/// Importer that accepts every request without loading anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopImporter;

#[async_trait]
impl ModuleImporter for NoopImporter {
    async fn import(&self, specifier: &str) -> Result<(), ModuleLoadError> {
        debug!("Ignoring module import of {}", specifier);
        Ok(())
    }
}

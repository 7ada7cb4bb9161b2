//! Configuration management for import map bootstrap
//!
//! Handles configuration loading (JSON or TOML) and defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use url::Url;

use crate::document::DeclarationTypes;
use crate::import_map::{ImportMapComposer, LiteralComposer, ResolvingComposer};
use crate::url_resolve::parse_base_url;

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "importmap_ingest=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,
}

/// Which merge algorithm to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposerKind {
    /// Resolve entries against the map URL and through the existing map
    #[default]
    Resolving,
    /// Copy entries verbatim
    Literal,
}

impl ComposerKind {
    pub fn build(self) -> Arc<dyn ImportMapComposer> {
        match self {
            ComposerKind::Resolving => Arc::new(ResolvingComposer),
            ComposerKind::Literal => Arc::new(LiteralComposer),
        }
    }
}

/// Bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Process-wide base URL (URL or absolute directory path)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `type` attribute values of declaration elements
    #[serde(default)]
    pub declaration_types: DeclarationTypes,

    /// Merge algorithm
    #[serde(default)]
    pub composer: ComposerKind,

    /// Scan the document once when the bootstrap is built
    #[serde(default = "default_true")]
    pub scan_on_start: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost/".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            declaration_types: DeclarationTypes::default(),
            composer: ComposerKind::default(),
            scan_on_start: true,
            logging: None,
        }
    }
}

impl BootstrapConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BootstrapConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BootstrapConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            _ => Self::from_json_file(path),
        }
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parsed base URL
    pub fn base_url(&self) -> anyhow::Result<Url> {
        parse_base_url(&self.base_url)
            .map_err(|e| anyhow::anyhow!("invalid base_url {:?}: {}", self.base_url, e))
    }
}

//! Import map data model
//!
//! The merged map is a plain value: top-level `imports`, prefix `scopes`,
//! `depcache` preload lists and `integrity` metadata. Lookups follow the
//! longest-matching-prefix rule, scopes first and then `imports`.

pub mod compose;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use compose::{ImportMapComposer, LiteralComposer, ResolvingComposer};
pub use store::{ImportMapStore, MapPayload};

/// Specifier to URL mappings of one scope or of the top level
pub type Packages = HashMap<String, String>;

/// Merged import map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    /// Specifier -> URL
    #[serde(default)]
    pub imports: Packages,
    /// Path prefix -> scoped specifier mappings
    #[serde(default)]
    pub scopes: HashMap<String, Packages>,
    /// URL -> dependency URLs to preload
    #[serde(default)]
    pub depcache: HashMap<String, Vec<String>>,
    /// URL -> integrity metadata
    #[serde(default)]
    pub integrity: HashMap<String, String>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.scopes.is_empty()
            && self.depcache.is_empty()
            && self.integrity.is_empty()
    }

    /// Map a resolved URL or bare specifier through the import map
    ///
    /// `parent_url` selects the scopes that apply. Returns `None` when nothing
    /// matches and the specifier is not itself a URL.
    pub fn resolve(&self, resolved_or_plain: &str, parent_url: Option<&str>) -> Option<String> {
        let mut scope_url = parent_url.and_then(|parent| get_match(parent, &self.scopes));
        while let Some(scope) = scope_url {
            if let Some(resolved) = apply_packages(resolved_or_plain, &self.scopes[scope]) {
                return Some(resolved);
            }
            let parent_scope = &scope[..scope.rfind('/').unwrap_or(0)];
            // the empty scope is its own parent
            if parent_scope.len() >= scope.len() {
                break;
            }
            scope_url = get_match(parent_scope, &self.scopes);
        }

        apply_packages(resolved_or_plain, &self.imports).or_else(|| {
            resolved_or_plain
                .contains(':')
                .then(|| resolved_or_plain.to_string())
        })
    }
}

/// Find the longest key of `map` that is `path` itself or a `/`-terminated prefix of it
fn get_match<'a, V>(path: &str, map: &'a HashMap<String, V>) -> Option<&'a str> {
    if let Some((key, _)) = map.get_key_value(path) {
        return Some(key.as_str());
    }
    let mut sep_index = path.len();
    loop {
        let end = (sep_index + 1).min(path.len());
        if let Some((key, _)) = map.get_key_value(&path[..end]) {
            return Some(key.as_str());
        }
        if sep_index == 0 {
            return None;
        }
        sep_index = path[..sep_index].rfind('/')?;
    }
}

fn apply_packages(id: &str, packages: &Packages) -> Option<String> {
    let name = get_match(id, packages)?;
    let target = &packages[name];
    Some(format!("{}{}", target, &id[name.len()..]))
}

//! Import map composition
//!
//! Merges a freshly parsed import map document into the live map. The merge is
//! behind [`ImportMapComposer`] so runtimes can swap in their own algorithm.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::ComposeError;
use crate::import_map::ImportMap;
use crate::url_resolve::{resolve_if_not_plain_or_url, resolve_url};

/// Merge algorithm applied to every ingested import map
pub trait ImportMapComposer: Send + Sync {
    /// Merge `document` into `target`, resolving relative entries against `map_url`
    fn compose(&self, document: &Value, map_url: &Url, target: &mut ImportMap)
        -> Result<(), ComposeError>;
}

/// Standard composition with URL resolution
///
/// New targets are resolved against the map URL and then mapped through the
/// current map, so a later map can refer to specifiers an earlier map defined.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvingComposer;

/// Copies entries verbatim without URL resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralComposer;

/// Sections of a document; `null` is an error, other non-objects have none
fn as_object(document: &Value) -> Result<Option<&Map<String, Value>>, ComposeError> {
    match document {
        Value::Null => Err(ComposeError::Null),
        Value::Object(sections) => Ok(Some(sections)),
        _ => {
            debug!("Import map document is not an object, nothing to merge");
            Ok(None)
        }
    }
}

/// Object-valued entries of a section; anything else is skipped
fn object_entries<'a>(
    document: &'a Map<String, Value>,
    section: &str,
) -> impl Iterator<Item = (&'a String, &'a Map<String, Value>)> {
    document
        .get(section)
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter_map(|(k, v)| v.as_object().map(|obj| (k, obj)))
}

fn string_entries<'a>(
    packages: &'a Map<String, Value>,
) -> impl Iterator<Item = (&'a String, &'a str)> {
    packages.iter().filter_map(|(k, v)| match v.as_str() {
        Some(s) => Some((k, s)),
        None => {
            debug!("Ignoring non-string import map target for {}", k);
            None
        }
    })
}

fn depcache_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn resolve_key(key: &str, map_url: &Url) -> String {
    resolve_url(key, map_url).unwrap_or_else(|| {
        warn!("Import map key {} cannot be resolved against {}, kept as is", key, map_url);
        key.to_string()
    })
}

impl ResolvingComposer {
    fn compose_packages(
        packages: &Map<String, Value>,
        map_url: &Url,
        target: &mut ImportMap,
        scope: Option<&str>,
    ) {
        for (lhs, rhs) in string_entries(packages) {
            let resolved_lhs =
                resolve_if_not_plain_or_url(lhs, map_url).unwrap_or_else(|| lhs.clone());
            let resolved_rhs =
                resolve_if_not_plain_or_url(rhs, map_url).unwrap_or_else(|| rhs.to_string());

            let Some(mapped) = target.resolve(&resolved_rhs, scope) else {
                warn!(
                    "Import map target {} for {} is neither a URL nor a mapped specifier, ignoring",
                    rhs, lhs
                );
                continue;
            };

            match scope {
                None => target.imports.insert(resolved_lhs, mapped),
                Some(scope) => target
                    .scopes
                    .entry(scope.to_string())
                    .or_default()
                    .insert(resolved_lhs, mapped),
            };
        }
    }
}

impl ImportMapComposer for ResolvingComposer {
    fn compose(
        &self,
        document: &Value,
        map_url: &Url,
        target: &mut ImportMap,
    ) -> Result<(), ComposeError> {
        let Some(document) = as_object(document)? else {
            return Ok(());
        };

        if let Some(imports) = document.get("imports").and_then(Value::as_object) {
            Self::compose_packages(imports, map_url, target, None);
        }

        for (scope, packages) in object_entries(document, "scopes") {
            let resolved_scope = resolve_key(scope, map_url);
            target.scopes.entry(resolved_scope.clone()).or_default();
            Self::compose_packages(packages, map_url, target, Some(&resolved_scope));
        }

        if let Some(depcache) = document.get("depcache").and_then(Value::as_object) {
            for (url, deps) in depcache {
                match depcache_list(deps) {
                    Some(deps) => {
                        target.depcache.insert(resolve_key(url, map_url), deps);
                    }
                    None => debug!("Ignoring malformed depcache entry for {}", url),
                }
            }
        }

        if let Some(integrity) = document.get("integrity").and_then(Value::as_object) {
            for (url, hash) in string_entries(integrity) {
                target
                    .integrity
                    .insert(resolve_key(url, map_url), hash.to_string());
            }
        }

        Ok(())
    }
}

impl ImportMapComposer for LiteralComposer {
    fn compose(
        &self,
        document: &Value,
        _map_url: &Url,
        target: &mut ImportMap,
    ) -> Result<(), ComposeError> {
        let Some(document) = as_object(document)? else {
            return Ok(());
        };

        if let Some(imports) = document.get("imports").and_then(Value::as_object) {
            for (k, v) in string_entries(imports) {
                target.imports.insert(k.clone(), v.to_string());
            }
        }
        for (scope, packages) in object_entries(document, "scopes") {
            let scoped = target.scopes.entry(scope.clone()).or_default();
            for (k, v) in string_entries(packages) {
                scoped.insert(k.clone(), v.to_string());
            }
        }
        if let Some(depcache) = document.get("depcache").and_then(Value::as_object) {
            for (url, deps) in depcache {
                if let Some(deps) = depcache_list(deps) {
                    target.depcache.insert(url.clone(), deps);
                }
            }
        }
        if let Some(integrity) = document.get("integrity").and_then(Value::as_object) {
            for (url, hash) in string_entries(integrity) {
                target.integrity.insert(url.clone(), hash.to_string());
            }
        }
        Ok(())
    }
}

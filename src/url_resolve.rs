//! URL resolution helpers
//!
//! Distinguishes bare specifiers (`lodash`, `app/main`) from URL-like ones
//! (`/x.js`, `./x.js`, `../x.js`, `https://...`) and resolves the relative forms
//! against a base URL.

use url::Url;

/// Whether `specifier` is a relative URL that must be resolved against a base
fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('/')
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
}

/// Resolve a relative specifier against `base`
///
/// Returns `None` for bare specifiers and for specifiers that are already
/// absolute URLs.
pub fn resolve_if_not_plain_or_url(specifier: &str, base: &Url) -> Option<String> {
    let specifier = specifier.replace('\\', "/");
    if !is_relative(&specifier) {
        return None;
    }
    base.join(&specifier).ok().map(String::from)
}

/// Resolve any specifier to a URL string
///
/// Relative specifiers are joined onto `base`, anything containing a scheme
/// separator is kept as is, and bare names are treated as `./name`.
pub fn resolve_url(specifier: &str, base: &Url) -> Option<String> {
    if let Some(resolved) = resolve_if_not_plain_or_url(specifier, base) {
        return Some(resolved);
    }
    if specifier.contains(':') {
        return Some(specifier.to_string());
    }
    resolve_if_not_plain_or_url(&format!("./{}", specifier), base)
}

/// Parse a base URL, falling back to a `file:` URL for filesystem paths
pub fn parse_base_url(base: &str) -> Result<Url, url::ParseError> {
    match Url::parse(base) {
        Ok(url) => Ok(url),
        Err(e) => {
            let path = std::path::Path::new(base);
            if path.is_absolute() {
                Url::from_directory_path(path).map_err(|_| e)
            } else {
                Err(e)
            }
        }
    }
}

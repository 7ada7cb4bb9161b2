//! Minimal `<script>` extraction from HTML text
//!
//! Enough to populate a [`MemoryDocument`](super::MemoryDocument) from a static
//! page. Not an HTML parser: comments and CDATA are not special-cased.

use regex::Regex;
use std::sync::OnceLock;

/// Attributes and body of one `<script>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptTag {
    pub type_attr: Option<String>,
    pub src: Option<String>,
    pub integrity: Option<String>,
    pub body: String,
}

fn script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("static regex")
    })
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("static regex")
    })
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// All `<script>` elements of `html`, in document order
pub fn extract_scripts(html: &str) -> Vec<ScriptTag> {
    script_regex()
        .captures_iter(html)
        .map(|caps| {
            let mut tag = ScriptTag {
                body: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                ..Default::default()
            };
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            for attr in attr_regex().captures_iter(attrs) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                match attr[1].to_ascii_lowercase().as_str() {
                    "type" => tag.type_attr = Some(value),
                    // an empty src is the same as no src
                    "src" if !value.is_empty() => tag.src = Some(value),
                    "integrity" => tag.integrity = Some(value),
                    _ => {}
                }
            }
            tag
        })
        .collect()
}

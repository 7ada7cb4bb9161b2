//! In-memory host document
//!
//! A mutable list of declaration elements. Elements can be appended or
//! removed while scans are running, the same way a live page changes.

use std::sync::Mutex;
use tracing::debug;

use crate::document::html::{extract_scripts, ScriptTag};
use crate::document::{
    DeclarationElement, DeclarationSource, DeclarationTypes, ElementId, ErrorEvent, HostDocument,
};

#[derive(Default)]
struct MemoryState {
    elements: Vec<DeclarationElement>,
    next_id: u64,
    events: Vec<(ElementId, ErrorEvent)>,
}

/// Host document held entirely in memory
#[derive(Default)]
pub struct MemoryDocument {
    types: DeclarationTypes,
    state: Mutex<MemoryState>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(types: DeclarationTypes) -> Self {
        Self {
            types,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Build a document from the `<script>` elements of an HTML page
    pub fn from_html(html: &str, types: DeclarationTypes) -> Self {
        let document = Self::with_types(types);
        let scripts = extract_scripts(html);
        debug!("Extracted {} script elements from HTML", scripts.len());
        for script in scripts {
            document.add_tag(script);
        }
        document
    }

    fn add_tag(&self, tag: ScriptTag) -> ElementId {
        let source = match tag.src {
            Some(src) => DeclarationSource::External(src),
            None => DeclarationSource::Inline(tag.body),
        };
        self.add_script(
            tag.type_attr.as_deref().unwrap_or_default(),
            source,
            tag.integrity.as_deref(),
        )
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a script element with the given `type` attribute
    pub fn add_script(
        &self,
        type_attr: &str,
        source: DeclarationSource,
        integrity: Option<&str>,
    ) -> ElementId {
        let mut state = self.state();
        let id = ElementId(state.next_id);
        state.next_id += 1;
        state.elements.push(DeclarationElement {
            id,
            kind: self.types.classify(type_attr),
            source,
            integrity: integrity.map(str::to_string),
        });
        id
    }

    /// Append a module declaration pointing at `src`
    pub fn add_module(&self, src: &str) -> ElementId {
        let module_type = self.types.module.clone();
        self.add_script(
            &module_type,
            DeclarationSource::External(src.to_string()),
            None,
        )
    }

    /// Append an import map declaration with an inline JSON body
    pub fn add_inline_import_map(&self, body: &str) -> ElementId {
        let map_type = self.types.import_map.clone();
        self.add_script(&map_type, DeclarationSource::Inline(body.to_string()), None)
    }

    /// Append an import map declaration fetched from `src`
    pub fn add_external_import_map(&self, src: &str, integrity: Option<&str>) -> ElementId {
        let map_type = self.types.import_map.clone();
        self.add_script(
            &map_type,
            DeclarationSource::External(src.to_string()),
            integrity,
        )
    }

    /// Remove an element; returns whether it existed
    pub fn remove(&self, id: ElementId) -> bool {
        let mut state = self.state();
        let before = state.elements.len();
        state.elements.retain(|e| e.id != id);
        state.elements.len() != before
    }

    pub fn len(&self) -> usize {
        self.state().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Error events delivered so far, oldest first
    pub fn error_events(&self) -> Vec<(ElementId, ErrorEvent)> {
        self.state().events.clone()
    }
}

impl HostDocument for MemoryDocument {
    fn has_document_context(&self) -> bool {
        true
    }

    fn declarations(&self) -> Vec<DeclarationElement> {
        self.state().elements.clone()
    }

    fn dispatch_error_event(&self, element: ElementId, event: ErrorEvent) {
        let mut state = self.state();
        if state.elements.iter().any(|e| e.id == element) {
            state.events.push((element, event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DeclarationKind;

    #[test]
    fn test_elements_keep_document_order() {
        let doc = MemoryDocument::new();
        let a = doc.add_inline_import_map("{}");
        let b = doc.add_module("/main.js");
        let c = doc.add_script("text/javascript", DeclarationSource::Inline(String::new()), None);

        let decls = doc.declarations();
        assert_eq!(decls.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(decls[0].kind, DeclarationKind::ImportMap);
        assert_eq!(decls[1].kind, DeclarationKind::Module);
        assert_eq!(decls[2].kind, DeclarationKind::Unrecognized);
    }

    #[test]
    fn test_events_only_reach_live_elements() {
        let doc = MemoryDocument::new();
        let a = doc.add_module("/a.js");
        let b = doc.add_module("/b.js");
        assert!(doc.remove(b));
        assert!(!doc.remove(b));

        doc.dispatch_error_event(a, ErrorEvent::load_error());
        doc.dispatch_error_event(b, ErrorEvent::load_error());
        assert_eq!(doc.error_events(), vec![(a, ErrorEvent::load_error())]);
    }

    #[test]
    fn test_from_html() {
        let html = r#"
            <script type="systemjs-importmap">{"imports":{"a":"/a.js"}}</script>
            <script type="systemjs-importmap" src="/map.json" integrity="sha256-x"></script>
            <script type="systemjs-module" src="import:a"></script>
        "#;
        let doc = MemoryDocument::from_html(html, DeclarationTypes::default());
        let decls = doc.declarations();

        assert_eq!(decls.len(), 3);
        assert_eq!(
            decls[0].source,
            DeclarationSource::Inline(r#"{"imports":{"a":"/a.js"}}"#.to_string())
        );
        assert_eq!(decls[1].source, DeclarationSource::External("/map.json".to_string()));
        assert_eq!(decls[1].integrity.as_deref(), Some("sha256-x"));
        assert_eq!(decls[2].kind, DeclarationKind::Module);
    }
}

//! Exactly-once dispatch and module import reporting

mod common;

use common::*;
use std::collections::HashSet;
use std::sync::Arc;

use importmap_ingest::document::ErrorEvent;
use importmap_ingest::{MemoryDocument, NoopImporter};

#[tokio::test]
async fn test_repeated_scans_dispatch_each_element_once() {
    let doc = Arc::new(MemoryDocument::new());
    doc.add_inline_import_map(r#"{"imports":{"a":"/a.js"}}"#);
    doc.add_module("/main.js");
    doc.add_module("import:app");

    let importer = Arc::new(RecordingImporter::new());
    let bootstrap = literal_bootstrap(doc.clone(), Arc::new(GatedFetcher::new()), importer.clone());

    let mut imports = Vec::new();
    for _ in 0..5 {
        imports.extend(bootstrap.scan().imports);
    }
    for import in imports {
        import.wait().await.unwrap();
    }

    assert_eq!(bootstrap.scanner().passes(), 5);
    assert_eq!(bootstrap.queue().last_enqueued(), 1);
    let mut imported = importer.imported();
    imported.sort();
    assert_eq!(imported, vec!["app", "https://site.com/main.js"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_never_double_dispatch() {
    let doc = Arc::new(MemoryDocument::new());
    for i in 0..20 {
        doc.add_inline_import_map(&format!(r#"{{"imports":{{"m{}":"/m{}.js"}}}}"#, i, i));
        doc.add_module(&format!("import:module-{}", i));
    }

    let importer = Arc::new(RecordingImporter::new());
    let bootstrap = Arc::new(literal_bootstrap(
        doc.clone(),
        Arc::new(GatedFetcher::new()),
        importer.clone(),
    ));

    let mut scans = Vec::new();
    for _ in 0..8 {
        let bootstrap = Arc::clone(&bootstrap);
        scans.push(tokio::spawn(async move {
            let report = bootstrap.scan();
            let mut imports = Vec::new();
            for import in report.imports {
                imports.push(import.specifier.clone());
                import.wait().await.unwrap();
            }
            (imports, report.import_maps)
        }));
    }

    let mut specifiers = Vec::new();
    let mut sequences = Vec::new();
    for scan in scans {
        let (imports, maps) = scan.await.unwrap();
        specifiers.extend(imports);
        sequences.extend(maps.into_iter().map(|(_, seq)| seq));
    }

    assert_eq!(specifiers.len(), 20);
    assert_eq!(specifiers.iter().collect::<HashSet<_>>().len(), 20);
    assert_eq!(sequences.len(), 20);
    assert_eq!(importer.imported().len(), 20);
    assert_eq!(bootstrap.queue().last_enqueued(), 20);

    bootstrap.prepare_import(false).await.unwrap();
    assert_eq!(bootstrap.import_map().imports.len(), 20);
}

#[tokio::test]
async fn test_load_failure_dispatches_error_event() {
    let doc = Arc::new(MemoryDocument::new());
    let broken = doc.add_module("import:broken");
    let fine = doc.add_module("import:fine");

    let importer = Arc::new(RecordingImporter::new().failing_load("broken"));
    let bootstrap = literal_bootstrap(doc.clone(), Arc::new(GatedFetcher::new()), importer);

    let mut results = Vec::new();
    for import in bootstrap.scan().imports {
        results.push((import.element, import.wait().await));
    }

    assert_eq!(results[0].0, broken);
    let err = results[0].1.as_ref().unwrap_err();
    assert!(err.is_load_failure());
    assert_eq!(err.specifier, "broken");
    assert_eq!(results[1], (fine, Ok(())));

    assert_eq!(doc.error_events(), vec![(broken, ErrorEvent::load_error())]);
    let event = doc.error_events()[0].1;
    assert_eq!(event.event_type, "error");
    assert!(!event.bubbles);
    assert!(!event.cancelable);
}

#[tokio::test]
async fn test_other_failures_surface_without_event() {
    let doc = Arc::new(MemoryDocument::new());
    doc.add_module("import:throws");

    let importer =
        Arc::new(RecordingImporter::new().failing_with("throws", "ReferenceError: x is not defined"));
    let bootstrap = literal_bootstrap(doc.clone(), Arc::new(GatedFetcher::new()), importer);

    let import = bootstrap.scan().imports.pop().unwrap();
    let err = import.wait().await.unwrap_err();
    assert!(!err.is_load_failure());
    assert_eq!(err.message, "ReferenceError: x is not defined");
    assert!(doc.error_events().is_empty());
}

#[tokio::test]
async fn test_removed_element_gets_no_event() {
    let doc = Arc::new(MemoryDocument::new());
    let element = doc.add_module("import:broken");

    let importer = Arc::new(RecordingImporter::new().failing_load("broken"));
    let bootstrap = literal_bootstrap(doc.clone(), Arc::new(GatedFetcher::new()), importer);

    let import = bootstrap.scan().imports.pop().unwrap();
    doc.remove(element);
    assert!(import.wait().await.is_err());
    assert!(doc.error_events().is_empty());
}

#[tokio::test]
async fn test_unrecognized_types_are_left_alone() {
    let doc = Arc::new(MemoryDocument::new());
    let plain = doc.add_script(
        "module",
        importmap_ingest::DeclarationSource::External("/plain.js".into()),
        None,
    );
    let map = doc.add_script(
        "importmap",
        importmap_ingest::DeclarationSource::Inline(r#"{"imports":{}}"#.into()),
        None,
    );

    let bootstrap = literal_bootstrap(doc, Arc::new(GatedFetcher::new()), Arc::new(NoopImporter));
    let report = bootstrap.scan();

    assert!(report.is_empty());
    assert_eq!(report.already_processed, 0);
    assert!(!bootstrap.scanner().is_processed(plain));
    assert!(!bootstrap.scanner().is_processed(map));
}

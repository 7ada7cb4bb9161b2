//! Resolver gate behaviour across document and headless environments

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;

use importmap_ingest::{ImportBootstrap, MemoryDocument, NoDocument, NoopImporter};

#[tokio::test]
async fn test_first_prepare_scans_and_later_ones_do_not() {
    let doc = Arc::new(MemoryDocument::new());
    doc.add_inline_import_map(r#"{"imports":{"a":"/a.js"}}"#);
    let bootstrap = literal_bootstrap(doc.clone(), Arc::new(GatedFetcher::new()), Arc::new(NoopImporter));
    assert_eq!(bootstrap.scanner().passes(), 0);

    bootstrap.prepare_import(false).await.unwrap();
    assert_eq!(bootstrap.scanner().passes(), 1);
    assert_eq!(bootstrap.import_map().imports["a"], "/a.js");

    // added after the first scan and only seen when forced
    doc.add_inline_import_map(r#"{"imports":{"b":"/b.js"}}"#);
    for _ in 0..3 {
        bootstrap.prepare_import(false).await.unwrap();
    }
    assert_eq!(bootstrap.scanner().passes(), 1);
    assert!(!bootstrap.import_map().imports.contains_key("b"));

    bootstrap.prepare_import(true).await.unwrap();
    assert_eq!(bootstrap.scanner().passes(), 2);
    assert_eq!(bootstrap.import_map().imports["b"], "/b.js");
}

#[tokio::test]
async fn test_headless_never_scans() {
    let bootstrap = ImportBootstrap::builder(base_url())
        .with_document(Arc::new(NoDocument))
        .build();

    bootstrap.prepare_import(false).await.unwrap();
    bootstrap.prepare_import(true).await.unwrap();
    assert!(bootstrap.document_ready().is_none());
    assert_eq!(bootstrap.scanner().passes(), 0);
}

#[tokio::test]
async fn test_prepare_waits_for_pending_fetches() {
    let doc = Arc::new(MemoryDocument::new());
    doc.add_external_import_map("/slow.json", None);
    let fetcher = Arc::new(GatedFetcher::new());
    let gate = fetcher.gate(&url("/slow.json"));
    let bootstrap = literal_bootstrap(doc, fetcher, Arc::new(NoopImporter));

    let ready = tokio::spawn(bootstrap.prepare_import(false));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!ready.is_finished());

    gate.release(r#"{"imports":{"slow":"/slow.js"}}"#);
    ready.await.unwrap().unwrap();
    assert_eq!(bootstrap.import_map().imports["slow"], "/slow.js");
}

#[tokio::test]
async fn test_document_ready_scans_once_then_prepare_scans_again() {
    let doc = Arc::new(MemoryDocument::new());
    doc.add_inline_import_map(r#"{"imports":{"a":"/a.js"}}"#);
    let bootstrap = literal_bootstrap(doc, Arc::new(GatedFetcher::new()), Arc::new(NoopImporter));

    let report = bootstrap.document_ready().unwrap();
    assert_eq!(report.import_maps.len(), 1);
    assert!(bootstrap.document_ready().is_none());

    // the first prepare still scans, but finds nothing new
    bootstrap.prepare_import(false).await.unwrap();
    assert_eq!(bootstrap.scanner().passes(), 2);
    assert_eq!(bootstrap.queue().last_enqueued(), 1);
}

#[tokio::test]
async fn test_html_page_end_to_end() {
    let html = r#"
        <html><head>
          <script type="systemjs-importmap">
            {"imports": {"app": "./app/main.js", "lib/": "https://cdn.example.com/lib/"}}
          </script>
          <script type="systemjs-importmap" src="/maps/extra.json"></script>
          <script type="systemjs-module" src="import:app"></script>
          <script src="/legacy.js"></script>
        </head></html>
    "#;
    let doc = Arc::new(MemoryDocument::from_html(html, Default::default()));
    let fetcher = DelayedFetcher::default().with_response(
        &url("/maps/extra.json"),
        Duration::from_millis(5),
        r#"{"imports": {"app": "lib/app.js"}}"#,
    );
    let importer = Arc::new(RecordingImporter::new());

    let bootstrap = ImportBootstrap::builder(base_url())
        .with_document(doc)
        .with_fetcher(Arc::new(fetcher))
        .with_importer(importer.clone())
        .build();
    bootstrap.prepare_import(false).await.unwrap();

    let map = bootstrap.import_map();
    assert_eq!(map.imports["app"], "https://cdn.example.com/lib/app.js");
    assert_eq!(
        map.resolve("lib/util.js", None).as_deref(),
        Some("https://cdn.example.com/lib/util.js")
    );
    assert_eq!(importer.imported(), vec!["app"]);
}

#[test]
fn test_host_threads_outside_the_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let doc = Arc::new(MemoryDocument::new());
    doc.add_inline_import_map(r#"{"imports":{"a":"/a.js"}}"#);
    doc.add_module("import:app");
    let importer = Arc::new(RecordingImporter::new());
    let bootstrap = Arc::new(
        ImportBootstrap::builder(base_url())
            .with_document(doc.clone())
            .with_importer(importer.clone())
            .with_runtime(runtime.handle().clone())
            .with_scan_on_start(false)
            .build(),
    );

    // a document-ready callback on a plain thread
    let host = Arc::clone(&bootstrap);
    let ready = std::thread::spawn(move || host.document_ready())
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(ready.import_maps.len(), 1);

    doc.add_inline_import_map(r#"{"imports":{"b":"/b.js"}}"#);
    let host = Arc::clone(&bootstrap);
    let rescan = std::thread::spawn(move || host.scan()).join().unwrap();
    assert_eq!(rescan.import_maps.len(), 1);

    runtime.block_on(async {
        for import in ready.imports {
            import.wait().await.unwrap();
        }
        bootstrap.prepare_import(false).await.unwrap();
    });

    let map = bootstrap.import_map();
    assert_eq!(map.imports["a"], "https://site.com/a.js");
    assert_eq!(map.imports["b"], "https://site.com/b.js");
    assert_eq!(importer.imported(), vec!["app"]);
}

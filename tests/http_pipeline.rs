//! End-to-end tests: HTTP fetcher against a mock image host, into real sinks.

mod common;

use std::collections::BTreeMap;

use common::{GalleryServer, item_bytes, read_archive};
use gallery_fetch::{Event, Pipeline, run_pipeline};

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn gallery_is_packed_into_archive() {
    let host = GalleryServer::start().await;
    let items = ["001.jpg", "002.jpg", "003.png", "004.gif", "005.jpg"];
    for item in items {
        host.serve(item).await;
    }
    let temp = tempfile::tempdir().unwrap();
    let mut config = host.config(temp.path());
    config.gallery_name = Some("holiday".into());
    let destination = config.destination();

    let summary = run_pipeline(config, names(&items), &destination)
        .await
        .unwrap();

    assert!(summary.is_complete(), "{summary:?}");
    assert_eq!(destination.path(), temp.path().join("holiday.zip"));

    let entries: BTreeMap<String, Vec<u8>> = read_archive(destination.path()).into_iter().collect();
    assert_eq!(entries.len(), items.len());
    for item in items {
        assert_eq!(entries[item], item_bytes(item), "{item}");
    }
}

#[tokio::test]
async fn gallery_is_written_into_directory() {
    let host = GalleryServer::start().await;
    host.serve("a.jpg").await;
    host.serve("b.jpg").await;
    let temp = tempfile::tempdir().unwrap();
    let mut config = host.config(temp.path());
    config.output.compress = false;
    let destination = config.destination();

    let summary = run_pipeline(config, names(&["a.jpg", "b.jpg"]), &destination)
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 2);
    let dir = temp.path().join(common::GALLERY_ID);
    assert_eq!(std::fs::read(dir.join("a.jpg")).unwrap(), item_bytes("a.jpg"));
    assert_eq!(std::fs::read(dir.join("b.jpg")).unwrap(), item_bytes("b.jpg"));
}

#[tokio::test]
async fn missing_items_are_retried_then_skipped() {
    let host = GalleryServer::start().await;
    host.serve("ok.jpg").await;
    host.fail("gone.jpg", 404, 2).await;
    host.flaky("slow.jpg", 1).await;
    let temp = tempfile::tempdir().unwrap();
    let config = host.config(temp.path());
    let destination = config.destination();
    let pipeline = Pipeline::with_http(config).unwrap();
    let mut events = pipeline.subscribe();

    let summary = pipeline
        .run(names(&["ok.jpg", "gone.jpg", "slow.jpg"]), &destination)
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.success_count(), 2);
    assert_eq!(summary.fetch_failed, 1);
    assert!(!summary.is_complete());

    let mut written: Vec<String> = read_archive(destination.path())
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    written.sort();
    assert_eq!(written, vec!["ok.jpg", "slow.jpg"]);

    let mut failed = Vec::new();
    let mut retried = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            Event::DownloadFailed { url } => failed.push(url),
            Event::Redownloading { url, .. } => retried.push(url),
            _ => {}
        }
    }
    assert_eq!(failed.len(), 1);
    assert!(failed[0].ends_with("/4242/gone.jpg"));
    retried.sort();
    assert_eq!(retried.len(), 2, "gone.jpg and slow.jpg each retried once");
    assert!(retried.iter().any(|u| u.ends_with("gone.jpg")));
    assert!(retried.iter().any(|u| u.ends_with("slow.jpg")));
}

#[tokio::test]
async fn invalid_entry_names_do_not_abort_the_run() {
    let host = GalleryServer::start().await;
    host.serve("fine.jpg").await;
    host.serve("..").await;
    let temp = tempfile::tempdir().unwrap();
    let mut config = host.config(temp.path());
    config.output.compress = false;
    let destination = config.destination();
    let pipeline = Pipeline::with_http(config).unwrap();
    let mut events = pipeline.subscribe();

    let summary = pipeline
        .run(names(&["fine.jpg", ".."]), &destination)
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.success_count() + summary.failure_count(), 2);
    assert!(destination.path().join("fine.jpg").exists());

    let write_failures = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| matches!(e, Event::WriteFailed { .. }))
        .count();
    // ".." either fails to fetch (URL normalization) or fails to write; never both
    assert_eq!(summary.write_failed, write_failures);
    assert_eq!(summary.failure_count(), 1);
}

//! End-to-end batch runs over temporary site trees

use std::path::{Path, PathBuf};

use dom::utils::structurally_equivalent;
use dom::Document;
use navasync::{
    run_batch, BatchEvent, BatchOrchestrator, NavAsyncConfig, NavAsyncError, NavLocator,
    PageOutcome, SkipReason,
};

const NAV: &str = "<ul class=\"md-nav__list\">\
    <li class=\"md-nav__item\"><a href=\"/a/\">Page A</a></li>\
    <li class=\"md-nav__item\"><a href=\"/b/\">Page B</a></li>\
    </ul>";

fn page(title: &str, with_nav: bool) -> String {
    let nav = if with_nav { NAV } else { "" };
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head>\
         <body><nav class=\"md-nav\">{nav}</nav><article><h1>{title}</h1></article></body></html>"
    )
}

fn write(dir: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

fn site(files: &[(&str, bool)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, with_nav) in files {
        write(dir.path(), rel, page(rel, *with_nav).as_bytes());
    }
    dir
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_three_page_site() {
    let dir = site(&[("a.html", true), ("b.html", true), ("c.html", true)]);

    let result = run_batch(dir.path(), "/en/").await.unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.processed, 3);
    assert_eq!(result.skipped, 0);
    assert_eq!(result.failed, 0);
    assert_eq!(result.fragment_path, Some(dir.path().join("nav.html")));

    let fragment = read(dir.path().join("nav.html"));
    assert!(fragment.contains("Page A"));
    assert!(dir.path().join("bars-rotate-fade.svg").exists());

    for name in ["a.html", "b.html", "c.html"] {
        let html = read(dir.path().join(name));
        assert!(!html.contains("Page A"), "{name} still carries the navigation");
        assert_eq!(html.matches("id=\"loading-spinner\"").count(), 1);
        assert_eq!(html.matches("id=\"nav-async-loader\"").count(), 1);
        assert!(html.contains("/en/bars-rotate-fade.svg"));
        assert!(html.contains("/en/nav.html"));
        // Content outside the navigation survives
        assert!(html.contains(&format!("<h1>{name}</h1>")));
    }
}

#[tokio::test]
async fn test_page_without_navigation_left_untouched() {
    let dir = site(&[("a.html", true), ("b.html", true)]);
    let stub = b"<html><body><p>Not found</p></body></html>\n";
    let stub_path = write(dir.path(), "404.html", stub);
    // 404.html sorts first, so move the source to something earlier
    let source = write(dir.path(), "!source.html", page("source", true).as_bytes());

    let result = run_batch(dir.path(), "").await.unwrap();

    assert_eq!(result.total, 4);
    assert_eq!(result.processed, 3);
    assert_eq!(result.skipped, 1);
    assert_eq!(std::fs::read(&stub_path).unwrap(), stub);
    assert!(read(source).contains("loading-spinner"));
}

#[tokio::test]
async fn test_source_without_navigation_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "a.html", page("a", false).as_bytes());
    let other = write(dir.path(), "b.html", page("b", true).as_bytes());
    let before = std::fs::read(&other).unwrap();

    let err = run_batch(dir.path(), "").await.unwrap_err();

    match err {
        NavAsyncError::NavigationNotFound { path, selector } => {
            assert_eq!(path, source);
            assert_eq!(selector, "ul[class=\"md-nav__list\"]");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read(&other).unwrap(), before);
    assert!(!dir.path().join("nav.html").exists());
    assert!(!dir.path().join("bars-rotate-fade.svg").exists());
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let dir = site(&[("a.html", true), ("b.html", true), ("sub/c.html", true)]);
    run_batch(dir.path(), "").await.unwrap();

    let snapshot: Vec<_> = ["a.html", "b.html", "sub/c.html", "nav.html"]
        .iter()
        .map(|rel| std::fs::read(dir.path().join(rel)).unwrap())
        .collect();

    let result = run_batch(dir.path(), "").await.unwrap();

    assert_eq!(result.processed, 0);
    assert_eq!(result.skipped, 3);
    assert_eq!(result.failed, 0);
    for (rel, bytes) in ["a.html", "b.html", "sub/c.html", "nav.html"].iter().zip(&snapshot) {
        assert_eq!(&std::fs::read(dir.path().join(rel)).unwrap(), bytes, "{rel} changed");
    }
}

#[tokio::test]
async fn test_worker_count_does_not_change_outcome() {
    let mut counts = Vec::new();
    for workers in [1, 4] {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..20 {
            let with_nav = i % 5 != 3;
            write(
                dir.path(),
                &format!("p{i:02}.html"),
                page(&i.to_string(), with_nav).as_bytes(),
            );
        }

        let mut config = NavAsyncConfig::new(dir.path(), "");
        config.workers = workers;
        let result = BatchOrchestrator::new(config).run().await.unwrap();
        counts.push((result.processed, result.skipped, result.failed));
    }

    assert_eq!(counts[0], counts[1]);
    assert_eq!(counts[0], (16, 4, 0));
}

#[tokio::test]
async fn test_fragment_matches_source_navigation() {
    let dir = site(&[("a.html", true)]);
    let original = Document::parse_str(&page("a.html", true));

    run_batch(dir.path(), "").await.unwrap();

    let fragment = Document::parse_fragment(&std::fs::read(dir.path().join("nav.html")).unwrap())
        .unwrap();
    let locator = NavLocator::default();
    assert!(structurally_equivalent(
        original.arena(),
        locator.locate(&original).unwrap(),
        fragment.arena(),
        locator.locate(&fragment).unwrap(),
    )
    .unwrap());
}

#[tokio::test]
async fn test_undecodable_page_is_reported() {
    let dir = site(&[("a.html", true), ("b.html", true)]);
    let broken = write(dir.path(), "c.html", b"<ul class=\"md-nav__list\">\xff\xfe</ul>");

    let result = run_batch(dir.path(), "").await.unwrap();

    assert_eq!(result.processed, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.failures[0].path, broken);
}

#[tokio::test]
async fn test_progress_events() {
    let dir = site(&[("a.html", true), ("b.html", true), ("c.html", false)]);
    let orchestrator = BatchOrchestrator::new(NavAsyncConfig::new(dir.path(), ""));
    let mut rx = orchestrator.event_bus.subscribe();

    let result = orchestrator.run().await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(BatchEvent::Started { total: 3, .. })));
    assert!(matches!(events.get(1), Some(BatchEvent::SourceExtracted { .. })));
    let finished: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::PageFinished {
                outcome, completed, ..
            } => Some((outcome.clone(), *completed)),
            _ => None,
        })
        .collect();
    assert_eq!(finished.len(), 3);
    assert_eq!(finished.iter().map(|(_, c)| *c).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(finished
        .iter()
        .any(|(outcome, _)| *outcome == PageOutcome::Skipped(SkipReason::NoNavigation)));
    match events.last() {
        Some(BatchEvent::Finished { run_id, processed, skipped, .. }) => {
            assert_eq!(*run_id, result.run_id);
            assert_eq!((*processed, *skipped), (2, 1));
        }
        other => panic!("expected Finished, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_navigation_signature() {
    let dir = tempfile::tempdir().unwrap();
    let html = "<html><body><ol data-nav=\"main\" class=\"x\"><li>Home</li></ol></body></html>";
    write(dir.path(), "index.html", html.as_bytes());

    let mut config = NavAsyncConfig::new(dir.path(), "docs");
    config.nav_tag = "ol".to_string();
    config.nav_attr = "data-nav".to_string();
    config.nav_value = "main".to_string();
    config.nav_file_name = "menu.html".to_string();
    let result = BatchOrchestrator::new(config).run().await.unwrap();

    assert_eq!(result.processed, 1);
    assert!(read(dir.path().join("menu.html")).contains("Home"));
    let rewritten = read(dir.path().join("index.html"));
    assert!(rewritten.contains("<ol data-nav=\"main\"><div id=\"loading-spinner\""));
    assert!(rewritten.contains("/docs/menu.html"));
}

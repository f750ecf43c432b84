//! Integration tests for the harvester
//!
//! These tests use wiremock to serve an index page, its sub-pages and their
//! images, and run the full harvest cycle end-to-end into a temp directory.

use gallery_harvester::config::HarvestConfig;
use gallery_harvester::crawler::run_harvest;
use gallery_harvester::{HarvestError, Harvester, ProgressEvent, SubPageState};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Serves raw image bytes at `route`
async fn mount_image(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Builds an index page linking to the given hrefs
fn index_html(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{}">set</a></li>"#, href))
        .collect();
    format!(
        r#"<html><body><a href="/about">About</a><ul>{}</ul></body></html>"#,
        anchors
    )
}

/// Builds a sub-page showing the given image sources
fn sub_page_html(srcs: &[&str]) -> String {
    let images: String = srcs
        .iter()
        .map(|src| format!(r#"<p><img src="{}"></p>"#, src))
        .collect();
    format!("<html><body>{}</body></html>", images)
}

/// Lists a directory tree as relative path -> file contents
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    for entry in std::fs::read_dir(root).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type().unwrap().is_dir() {
            for (inner, data) in snapshot(&entry.path()) {
                files.insert(format!("{}/{}", name, inner), data);
            }
        } else {
            files.insert(name, std::fs::read(entry.path()).unwrap());
        }
    }
    files
}

fn logs(events: &[ProgressEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Log(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

fn assert_single_terminal_last(events: &[ProgressEvent]) {
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "expected exactly one terminal event: {:?}", events);
    assert!(events.last().unwrap().is_terminal());
}

/// Mounts a gallery of two sub-pages with three relative images each
async fn mount_two_sets(server: &MockServer) {
    mount_page(server, "/gallery/", &index_html(&["NO.1.html", "NO.2.html"])).await;
    for set in 1..=2 {
        mount_page(
            server,
            &format!("/gallery/NO.{}.html", set),
            &sub_page_html(&["img/a.jpg", "img/b.png", "/static/c.gif"]),
        )
        .await;
    }
    mount_image(server, "/gallery/img/a.jpg", b"jpeg-bytes").await;
    mount_image(server, "/gallery/img/b.png", b"png-bytes").await;
    mount_image(server, "/static/c.gif", b"gif-bytes").await;
}

#[tokio::test]
async fn test_full_harvest_two_sub_pages() {
    let server = MockServer::start().await;
    mount_two_sets(&server).await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/gallery/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.sub_pages_found, 2);
    assert_eq!(summary.sub_pages_completed(), 2);
    assert_eq!(summary.images_downloaded(), 6);
    assert_eq!(summary.images_failed(), 0);

    let files = snapshot(dir.path());
    let names: Vec<_> = files.keys().cloned().collect();
    assert_eq!(
        names,
        vec![
            "NO.1.html/001.jpg",
            "NO.1.html/002.png",
            "NO.1.html/003.gif",
            "NO.2.html/001.jpg",
            "NO.2.html/002.png",
            "NO.2.html/003.gif",
        ]
    );
    assert_eq!(files["NO.2.html/002.png"], b"png-bytes");

    assert_single_terminal_last(&events);
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
    assert!(events.contains(&ProgressEvent::SubPageTotal(2)));
    assert!(events.contains(&ProgressEvent::SubPageProgress(2)));
    assert!(events.contains(&ProgressEvent::ImageTotal { sub_page: 1, total: 3 }));
    assert!(events.contains(&ProgressEvent::ImageProgress { sub_page: 1, done: 3 }));
    assert!(events.contains(&ProgressEvent::ImageProgress { sub_page: 2, done: 3 }));
    assert!(logs(&events).contains(&"found 2 sub-pages"));
    assert_eq!(logs(&events).iter().filter(|l| **l == "found 3 images").count(), 2);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let server = MockServer::start().await;
    mount_two_sets(&server).await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/gallery/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;
    assert!(result.is_ok());

    let mut last_sub_page = 0;
    let mut last_image: BTreeMap<usize, usize> = BTreeMap::new();
    for event in &events {
        match event {
            ProgressEvent::SubPageProgress(done) => {
                assert!(*done >= last_sub_page);
                last_sub_page = *done;
            }
            ProgressEvent::ImageTotal { sub_page, .. } => {
                last_image.insert(*sub_page, 0);
            }
            ProgressEvent::ImageProgress { sub_page, done } => {
                let last = last_image.entry(*sub_page).or_insert(0);
                assert!(*done >= *last);
                *last = *done;
            }
            _ => {}
        }
    }
    assert_eq!(last_sub_page, 2);
}

#[tokio::test]
async fn test_failed_image_is_logged_and_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.7.html"])).await;
    mount_page(
        &server,
        "/NO.7.html",
        &sub_page_html(&["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"]),
    )
    .await;
    for n in [1, 3, 4, 5] {
        mount_image(&server, &format!("/{}.jpg", n), format!("image {}", n).as_bytes()).await;
    }
    Mock::given(method("GET"))
        .and(path("/2.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.images_found(), 5);
    assert_eq!(summary.images_downloaded(), 4);
    assert_eq!(summary.images_failed(), 1);
    assert_eq!(summary.pages[0].state, SubPageState::Completed);

    let files = snapshot(dir.path());
    let names: Vec<_> = files.keys().cloned().collect();
    assert_eq!(
        names,
        vec![
            "NO.7.html/001.jpg",
            "NO.7.html/003.jpg",
            "NO.7.html/004.jpg",
            "NO.7.html/005.jpg",
        ]
    );
    assert_eq!(files["NO.7.html/004.jpg"], b"image 4");

    let failed_url = format!("{}/2.jpg", server.uri());
    let failures: Vec<_> = logs(&events)
        .into_iter()
        .filter(|l| l.starts_with("failed to download"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains(&failed_url));

    assert!(events.contains(&ProgressEvent::ImageProgress { sub_page: 1, done: 5 }));
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
}

#[tokio::test]
async fn test_index_not_found_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let save_dir = dir.path().join("out");
    let base_url = format!("{}/missing/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, &save_dir, Vec::new()).await;

    match result {
        Err(HarvestError::Fetch(e)) => assert_eq!(e.status(), Some(404)),
        other => panic!("expected fetch error, got {:?}", other),
    }

    assert!(!save_dir.exists());
    assert_eq!(events.len(), 1);
    match &events[0] {
        ProgressEvent::Failed(message) => assert!(message.contains("404")),
        other => panic!("expected failure event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_second_run_produces_same_files() {
    let server = MockServer::start().await;
    mount_two_sets(&server).await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/gallery/", server.uri());
    let harvester = Harvester::new(HarvestConfig::default()).unwrap();

    let (_, first) = harvester.run_with_sink(&base_url, dir.path(), Vec::new()).await;
    first.unwrap();
    let before = snapshot(dir.path());

    let (events, second) = harvester.run_with_sink(&base_url, dir.path(), Vec::new()).await;
    second.unwrap();
    let after = snapshot(dir.path());

    assert_eq!(before, after);
    assert_eq!(after.len(), 6);
    assert_single_terminal_last(&events);
}

#[tokio::test]
async fn test_unreachable_sub_page_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.1.html", "NO.2.html"])).await;
    Mock::given(method("GET"))
        .and(path("/NO.1.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/NO.2.html", &sub_page_html(&["a.jpg"])).await;
    mount_image(&server, "/a.jpg", b"a").await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.sub_pages_completed(), 1);
    assert_eq!(summary.sub_pages_skipped(), 1);
    assert_eq!(summary.pages[0].state, SubPageState::FetchFailed);

    assert!(!dir.path().join("NO.1.html").exists());
    assert!(dir.path().join("NO.2.html/001.jpg").exists());

    assert!(logs(&events).iter().any(|l| l.starts_with("failed to fetch")));
    assert!(events.contains(&ProgressEvent::SubPageProgress(2)));
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
}

#[tokio::test]
async fn test_uncreatable_folder_skips_sub_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.1.html", "NO.2.html"])).await;
    mount_page(&server, "/NO.1.html", &sub_page_html(&["a.jpg"])).await;
    mount_page(&server, "/NO.2.html", &sub_page_html(&["a.jpg"])).await;
    mount_image(&server, "/a.jpg", b"a").await;

    // A regular file where sub-page 1's folder should go
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("NO.1.html"), b"in the way").unwrap();
    let base_url = format!("{}/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;

    let summary = result.unwrap();
    let states: Vec<_> = summary.pages.iter().map(|p| p.state).collect();
    assert_eq!(states, vec![SubPageState::FolderFailed, SubPageState::Completed]);
    assert!(summary.pages[0].folder.is_none());
    assert_eq!(summary.sub_pages_skipped(), 1);

    let folder_failures: Vec<_> = logs(&events)
        .into_iter()
        .filter(|l| l.starts_with("failed to create folder"))
        .collect();
    assert_eq!(folder_failures.len(), 1);
    assert!(folder_failures[0].contains("NO.1.html"));

    assert_eq!(std::fs::read(dir.path().join("NO.1.html")).unwrap(), b"in the way");
    assert!(dir.path().join("NO.2.html/001.jpg").exists());
    assert!(events.contains(&ProgressEvent::SubPageProgress(2)));
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
}

#[tokio::test]
async fn test_duplicate_links_run_one_after_another() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.1.html", "NO.1.html"])).await;
    mount_page(&server, "/NO.1.html", &sub_page_html(&["a.jpg"])).await;
    Mock::given(method("GET"))
        .and(path("/a.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"complete".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let mut config = HarvestConfig::default();
    config.concurrency.max_concurrent_pages = 2;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let started = std::time::Instant::now();
    let (events, result) = run_harvest(config, &base_url, dir.path(), Vec::new()).await;
    let elapsed = started.elapsed();

    let summary = result.unwrap();
    assert_eq!(summary.sub_pages_completed(), 2);
    assert_eq!(summary.images_downloaded(), 2);

    // Both copies target NO.1.html/001.jpg, so their downloads must not overlap
    assert!(
        elapsed >= Duration::from_millis(600),
        "duplicate sub-pages overlapped: {:?}",
        elapsed
    );

    let files = snapshot(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(files["NO.1.html/001.jpg"], b"complete");
    assert!(events.contains(&ProgressEvent::ImageTotal { sub_page: 1, total: 1 }));
    assert!(events.contains(&ProgressEvent::ImageTotal { sub_page: 2, total: 1 }));
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
}

#[tokio::test]
async fn test_index_without_sub_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<html><body><a href="/about">About</a></body></html>"#).await;

    let dir = TempDir::new().unwrap();
    let save_dir = dir.path().join("out");
    let base_url = format!("{}/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, &save_dir, Vec::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.sub_pages_found, 0);
    assert!(save_dir.is_dir());
    assert!(snapshot(&save_dir).is_empty());

    assert!(events.contains(&ProgressEvent::SubPageTotal(0)));
    assert!(logs(&events).contains(&"found 0 sub-pages"));
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
}

#[tokio::test]
async fn test_sub_page_without_images() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.1.html"])).await;
    mount_page(&server, "/NO.1.html", "<html><body><p>nothing here</p></body></html>").await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let (events, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;

    result.unwrap();
    assert!(dir.path().join("NO.1.html").is_dir());
    assert!(events.contains(&ProgressEvent::ImageTotal { sub_page: 1, total: 0 }));
    assert!(logs(&events).contains(&"found 0 images"));
    assert_eq!(events.last(), Some(&ProgressEvent::Succeeded));
}

#[tokio::test]
async fn test_folder_and_file_names_are_sanitized() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["view?id:NO.3"])).await;
    mount_page(
        &server,
        "/view",
        &sub_page_html(&["pic.jpg?size=large", "noext", ".hidden"]),
    )
    .await;
    mount_image(&server, "/pic.jpg", b"pic").await;
    mount_image(&server, "/noext", b"raw").await;
    mount_image(&server, "/.hidden", b"dot").await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let (_, result) =
        run_harvest(HarvestConfig::default(), &base_url, dir.path(), Vec::new()).await;
    result.unwrap();

    let names: Vec<_> = snapshot(dir.path()).keys().cloned().collect();
    assert_eq!(
        names,
        vec!["view_id_NO.3/001.jpg", "view_id_NO.3/002", "view_id_NO.3/003"]
    );
}

#[tokio::test]
async fn test_concurrent_downloads_keep_positional_names() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.1.html", "NO.2.html", "NO.3.html"])).await;
    for set in 1..=3 {
        mount_page(
            &server,
            &format!("/NO.{}.html", set),
            &sub_page_html(&["slow.jpg", "fast1.jpg", "fast2.jpg"]),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_image(&server, "/fast1.jpg", b"fast1").await;
    mount_image(&server, "/fast2.jpg", b"fast2").await;

    let mut config = HarvestConfig::default();
    config.concurrency.max_concurrent_pages = 3;
    config.concurrency.max_concurrent_images = 3;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let (events, result) = run_harvest(config, &base_url, dir.path(), Vec::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.images_downloaded(), 9);
    let order: Vec<_> = summary.pages.iter().map(|p| p.index).collect();
    assert_eq!(order, vec![1, 2, 3]);

    let files = snapshot(dir.path());
    for set in 1..=3 {
        assert_eq!(files[&format!("NO.{}.html/001.jpg", set)], b"slow");
        assert_eq!(files[&format!("NO.{}.html/002.jpg", set)], b"fast1");
        assert_eq!(files[&format!("NO.{}.html/003.jpg", set)], b"fast2");
    }

    assert!(events.contains(&ProgressEvent::SubPageProgress(3)));
    assert_single_terminal_last(&events);
}

#[tokio::test]
async fn test_cancellation_stops_run_with_one_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &index_html(&["NO.1.html"])).await;
    mount_page(&server, "/NO.1.html", &sub_page_html(&["big.jpg"])).await;
    Mock::given(method("GET"))
        .and(path("/big.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"never".to_vec())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let harvester = Harvester::new(HarvestConfig::default()).unwrap();
    let cancel = harvester.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/", server.uri());

    let (events, result) = harvester
        .run_with_sink(&base_url, dir.path(), Vec::new())
        .await;

    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(!dir.path().join("NO.1.html/001.jpg").exists());
    assert_single_terminal_last(&events);
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Failed("Harvest cancelled".into()))
    );
}

//! HTTP Fetcher Integration Tests
//!
//! Exercises the reqwest-backed fetcher and the full pipeline against a
//! local mock server.

mod common;

use std::time::Duration;

use localimg::core::asset_key;
use localimg::{FetchError, Fetcher, HttpFetcher, Orchestrator, ResolvedConfig};
use mockito::Server;
use tempfile::TempDir;

use common::{canonical, write_doc};

#[tokio::test]
async fn test_fetch_returns_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/img/logo.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(b"\x89PNG\r\n")
        .create_async()
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let body = fetcher
        .fetch(&format!("{}/img/logo.png", server.url()))
        .await
        .unwrap();

    assert_eq!(body, b"\x89PNG\r\n");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/gone.png")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher
        .fetch(&format!("{}/gone.png", server.url()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ua.png")
        .match_header("user-agent", "docs-bot/1.0")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5), "docs-bot/1.0").unwrap();
    fetcher
        .fetch(&format!("{}/ua.png", server.url()))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_is_an_error() {
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(2), "localimg-test").unwrap();
    let err = fetcher.fetch("http://127.0.0.1:1/x.png").await.unwrap_err();

    assert!(matches!(
        err,
        FetchError::Request { .. } | FetchError::Timeout { .. }
    ));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept connections and hold them open without ever answering
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(1), "localimg-test").unwrap();
    let err = fetcher
        .fetch(&format!("http://{}/slow.png", addr))
        .await
        .unwrap_err();
    server.abort();

    match err {
        FetchError::Timeout { timeout, .. } => assert_eq!(timeout, Duration::from_secs(1)),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pipeline_downloads_once_over_http() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/a/b.jpg")
        .with_status(200)
        .with_body(b"JPEG")
        .expect(1)
        .create_async()
        .await;
    let url = format!("{}/a/b.jpg", server.url());

    let temp = TempDir::new().unwrap();
    let first = write_doc(temp.path(), "a.md", &format!("![x]({})", url));
    write_doc(temp.path(), "b.md", &format!("<img src=\"{}\" alt=\"y\">", url));

    let orchestrator = Orchestrator::new(ResolvedConfig::for_root(temp.path())).unwrap();
    let summary = orchestrator.run().await.unwrap();

    mock.assert_async().await;
    assert_eq!(summary.updated, 2);

    let relative = format!("assets/{}.jpg", asset_key(&url));
    assert_eq!(std::fs::read_to_string(first).unwrap(), canonical("x", &relative));
    assert_eq!(std::fs::read(temp.path().join(&relative)).unwrap(), b"JPEG");
}

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use hoodrank_common::Config;
use hoodrank_scout::{ExtractionPipeline, HttpBackend, ScrapeBackend, ScrapeError, Strategy};

const PAGE: &str = r#"<html><script>const rankings = {"ny": {"hot": {"1": [{"name": "Balthazar", "hood": "SoHo"}]}}};</script></html>"#;

/// Serve the given (status line, body) pairs, one connection each.
async fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}/")
}

fn backend(url: &str, retries: u32) -> HttpBackend {
    let config = Config {
        target_url: url.to_string(),
        scraper_max_retries: retries,
        scraper_delay_secs: 0.0,
        ..Config::default()
    };
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpBackend::new(&config).unwrap().with_client(client)
}

#[tokio::test]
async fn fetched_page_goes_through_pipeline() {
    let url = serve(vec![("200 OK", PAGE)]).await;

    let out = backend(&url, 1)
        .scrape(&ExtractionPipeline::default())
        .await
        .unwrap();

    assert_eq!(out.strategy, Strategy::EmbeddedObject);
    assert_eq!(out.records[0].name, "Balthazar");
}

#[tokio::test]
async fn server_error_is_retried() {
    let url = serve(vec![("503 Service Unavailable", "busy"), ("200 OK", PAGE)]).await;

    let html = backend(&url, 3).fetch().await.unwrap();
    assert!(html.contains("Balthazar"));
}

#[tokio::test]
async fn exhausted_retries_are_a_fetch_error() {
    let url = serve(vec![("500 Internal Server Error", ""), ("500 Internal Server Error", "")]).await;

    let err = backend(&url, 2).fetch().await.unwrap_err();
    match err {
        ScrapeError::Fetch { url: failed, .. } => assert_eq!(failed, url),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn long_retry_runs_end_in_a_fetch_error() {
    // Bind then drop so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let err = backend(&url, 25).fetch().await.unwrap_err();
    assert!(matches!(err, ScrapeError::Fetch { .. }), "got {err:?}");
}

#[tokio::test]
async fn page_without_records_still_yields_fallback() {
    let url = serve(vec![("200 OK", "<html><body>maintenance</body></html>")]).await;

    let out = backend(&url, 1)
        .scrape(&ExtractionPipeline::default())
        .await
        .unwrap();

    assert!(out.used_fallback());
}

//! Integration tests for zip code resolution using wiremock

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use plantguard::config::CoordinatesConfig;
use plantguard::{
    Coordinates, CoordinatesResolutionError, CoordinatesResolver, HttpClient,
    OpenDataSoftResolver, RetryConfig,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

const SEARCH_PATH: &str = "/api/records/1.0/search/";

fn fast_http() -> HttpClient {
    HttpClient::with_retry(&RetryConfig {
        min_backoff_ms: 1,
        max_backoff_ms: 5,
    })
    .unwrap()
}

fn resolver_for(base_url: String) -> OpenDataSoftResolver {
    let config = CoordinatesConfig {
        base_url,
        ..CoordinatesConfig::default()
    };
    OpenDataSoftResolver::new(&config, fast_http())
}

fn resolver(server: &MockServer) -> OpenDataSoftResolver {
    resolver_for(format!("{}{SEARCH_PATH}", server.uri()))
}

fn raleigh_response() -> serde_json::Value {
    serde_json::json!({
        "nhits": 1,
        "parameters": {
            "dataset": "us-zip-code-latitude-and-longitude",
            "q": "27601",
            "rows": 1,
            "format": "json"
        },
        "records": [
            {
                "datasetid": "us-zip-code-latitude-and-longitude",
                "recordid": "0b1d4f8e1c0d7c1f0a6b2f5c3e9d8a7b6c5d4e3f",
                "fields": {
                    "city": "Raleigh",
                    "zip": "27601",
                    "dst": 1,
                    "geopoint": [35.774451, -78.63274],
                    "longitude": -78.63274,
                    "state": "NC",
                    "latitude": 35.774451,
                    "timezone": -5
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_resolve_zip_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("dataset", "us-zip-code-latitude-and-longitude"))
        .and(query_param("q", "27601"))
        .and(query_param("rows", "1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(raleigh_response()))
        .expect(1)
        .mount(&server)
        .await;

    let coordinates = resolver(&server).resolve("27601").await.unwrap();

    assert_eq!(coordinates, Coordinates::new(35.774451, -78.63274));
    assert_eq!(coordinates.as_tuple(), (35.774451, -78.63274));
}

#[tokio::test]
async fn test_resolve_sends_api_key_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("apikey", "some_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(raleigh_response()))
        .expect(1)
        .mount(&server)
        .await;

    let config = CoordinatesConfig {
        base_url: format!("{}{SEARCH_PATH}", server.uri()),
        api_key: Some("some_key".to_string()),
        ..CoordinatesConfig::default()
    };
    let resolver = OpenDataSoftResolver::new(&config, fast_http());

    assert!(resolver.resolve("27601").await.is_ok());
}

#[tokio::test]
async fn test_resolve_no_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"nhits": 0, "records": []})),
        )
        .mount(&server)
        .await;

    let err = resolver(&server).resolve("00000").await.unwrap_err();

    assert!(matches!(err, CoordinatesResolutionError::NotFound { .. }));
    assert_eq!(
        err.to_string(),
        "The coordinates for the zip code could not be found using the OpenDataSoft API"
    );
}

#[tokio::test]
async fn test_resolve_bad_status_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Unknown dataset"))
        .expect(1)
        .mount(&server)
        .await;

    let err = resolver(&server).resolve("27601").await.unwrap_err();

    assert!(matches!(err, CoordinatesResolutionError::RequestFailed { .. }));
    assert_eq!(
        err.to_string(),
        "Failed to get the coordinates from the OpenDataSoft API"
    );
}

#[tokio::test]
async fn test_resolve_retries_server_errors_then_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let err = resolver(&server).resolve("27601").await.unwrap_err();

    assert!(matches!(err, CoordinatesResolutionError::RequestFailed { .. }));
}

#[tokio::test]
async fn test_resolve_recovers_after_transient_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(raleigh_response()))
        .expect(1)
        .mount(&server)
        .await;

    let coordinates = resolver(&server).resolve("27601").await.unwrap();
    assert_eq!(coordinates, Coordinates::new(35.774451, -78.63274));
}

#[tokio::test]
async fn test_resolve_connection_error() {
    // Nothing listens on the discard port
    let resolver = resolver_for(format!("http://127.0.0.1:9{SEARCH_PATH}"));

    let err = resolver.resolve("27601").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to get the coordinates from the OpenDataSoft API"
    );
}

#[tokio::test]
async fn test_resolve_malformed_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"records": [{"fields": {"zip": "27601"}}]}),
        ))
        .mount(&server)
        .await;

    let err = resolver(&server).resolve("27601").await.unwrap_err();

    assert!(matches!(
        err,
        CoordinatesResolutionError::InvalidResponse { .. }
    ));
}

/// Read one request head from `stream`
async fn read_request_head(stream: &mut TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&buf[..n]);
    }
}

/// Serve `body` on a local port, closing the first `drops` connections without a response
async fn flaky_server(drops: usize, body: serde_json::Value) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);
    let body = body.to_string();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = listener.accept().await.unwrap();
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            read_request_head(&mut stream).await;
            if seen < drops {
                drop(stream);
                continue;
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}{SEARCH_PATH}"), connections)
}

#[tokio::test]
async fn test_resolve_recovers_after_dropped_connection() {
    let (url, connections) = flaky_server(1, raleigh_response()).await;

    let coordinates = resolver_for(url).resolve("27601").await.unwrap();

    assert_eq!(coordinates, Coordinates::new(35.774451, -78.63274));
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_resolve_gives_up_after_dropped_connections() {
    let (url, connections) = flaky_server(usize::MAX, raleigh_response()).await;

    let err = resolver_for(url).resolve("27601").await.unwrap_err();

    assert!(matches!(err, CoordinatesResolutionError::RequestFailed { .. }));
    assert_eq!(connections.load(Ordering::SeqCst), 4);
}

use deezer_provider::{DeezerCatalog, DeezerConfig};
use serde_json::json;
use sonar_core::catalog::{CatalogClient, CatalogError};
use sonar_core::models::TrackId;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(server: &MockServer) -> DeezerCatalog {
    DeezerCatalog::new(DeezerConfig {
        base_url: server.uri(),
        result_limit: 25,
        timeout: Duration::from_millis(500),
        connect_timeout: Duration::from_millis(500),
    })
    .expect("catalog should build")
}

fn track_json(id: u64, title: &str, preview: &str) -> serde_json::Value {
    json!({
        "id": id,
        "readable": true,
        "title": title,
        "duration": 224,
        "preview": preview,
        "artist": { "id": 27, "name": "Daft Punk" },
        "album": {
            "id": 302127,
            "title": "Discovery",
            "cover": "https://img/cover",
            "cover_medium": "https://img/cover-250"
        },
        "type": "track"
    })
}

#[tokio::test]
async fn search_maps_tracks_in_relevance_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "daft punk"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                track_json(3, "One More Time", "https://cdn/3.mp3"),
                track_json(1, "Aerodynamic", ""),
                track_json(2, "Digital Love", "https://cdn/2.mp3"),
            ],
            "total": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = catalog(&server)
        .search("daft punk")
        .await
        .expect("search should succeed");

    let ids: Vec<TrackId> = tracks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TrackId(3), TrackId(1), TrackId(2)]);
    assert_eq!(tracks[0].artist_name, "Daft Punk");
    assert_eq!(tracks[0].cover_url.as_deref(), Some("https://img/cover-250"));
    assert!(tracks[1].preview_url.is_none());
}

#[tokio::test]
async fn missing_data_is_an_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0 })))
        .mount(&server)
        .await;

    let tracks = catalog(&server).search("zzzz").await.expect("not an error");
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = catalog(&server).search("x").await.expect_err("should fail");
    assert!(matches!(err, CatalogError::Status { status: 503 }));
}

#[tokio::test]
async fn in_band_api_error_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "type": "Exception", "message": "Quota limit exceeded", "code": 4 }
        })))
        .mount(&server)
        .await;

    let err = catalog(&server).search("x").await.expect_err("should fail");
    match err {
        CatalogError::Api { message } => assert!(message.contains("Quota limit exceeded")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = catalog(&server).search("x").await.expect_err("should fail");
    assert!(matches!(err, CatalogError::Decode { .. }));
}

#[tokio::test]
async fn slow_catalog_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = catalog(&server).search("x").await.expect_err("should time out");
    assert!(matches!(err, CatalogError::Timeout { .. }));
}

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::mock_config;
use listening_insights::aggregate::Aggregator;
use listening_insights::models::{GenreCount, InsightsResponse};
use listening_insights::server::{router, AppState};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn spotify_data_returns_payload_with_cors_header() {
    let mut server = Server::new_async().await;
    let _top = server
        .mock("GET", "/v1/me/top/tracks")
        .match_header("authorization", "Bearer valid")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"items": [{"id": "A", "artists": [{"id": "x"}]}]}).to_string())
        .create_async()
        .await;
    let _features = server
        .mock("GET", "/v1/audio-features")
        .match_query(Matcher::UrlEncoded("ids".into(), "A".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"audio_features": [{"energy": 0.7, "valence": 0.2, "id": "A"}]}).to_string())
        .create_async()
        .await;
    let _artists = server
        .mock("GET", "/v1/artists")
        .match_query(Matcher::UrlEncoded("ids".into(), "x".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"artists": [{"id": "x", "genres": ["jazz"]}]}).to_string())
        .create_async()
        .await;
    let m_token = server.mock("POST", "/api/token").expect(0).create_async().await;

    let aggregator = Arc::new(Aggregator::new(&mock_config(&server.url()), None));
    let app = router(AppState { aggregator });

    let req = Request::builder()
        .method("POST")
        .uri("/spotify-data")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::from(
            json!({"access_token": "valid", "refresh_token": "refresh"}).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let payload: InsightsResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload.features["energy"], 0.7);
    assert_eq!(payload.features["valence"], 0.2);
    assert_eq!(payload.genres, vec![GenreCount { name: "jazz".into(), count: 1 }]);
    assert!(payload.access_token.is_none());
    m_token.assert_async().await;
}

#[tokio::test]
async fn missing_credentials_return_400_with_cors_header() {
    let aggregator = Arc::new(Aggregator::new(&mock_config("http://127.0.0.1:9"), None));
    let app = router(AppState { aggregator });

    let req = Request::builder()
        .method("POST")
        .uri("/spotify-data")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::from(json!({"access_token": ""}).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

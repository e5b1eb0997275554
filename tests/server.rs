use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::io::Write;
use tower::ServiceExt;

use incident_atlas::config::Config;
use incident_atlas::server::{build_app, AppState};

fn write_mock_csv() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "Label,Category,Severity,Timestamp,Frame Gps Lat Start,Frame Gps Lon Start,Frame Gps Lat End,Frame Gps Lon End,Video ID,Share Link").unwrap();
    writeln!(f, "Hard Braking,Driving Behavior,High,0:42–0:57,37.77,-122.41,37.78,-122.40,vid1,https://example.com/1").unwrap();
    writeln!(f, "Pedestrian Crossing,Road Hazard,Critical,1:03–1:18,37.70,-122.45,37.70,-122.45,vid2,https://example.com/2").unwrap();
    f
}

fn test_state(csv_path: &std::path::Path) -> AppState {
    let config: Config = toml::from_str(&format!(
        r#"
[server]
bind = "127.0.0.1:0"

[data]
source = "csv"
csv_path = "{}"
"#,
        csv_path.display()
    ))
    .unwrap();
    AppState::new(config)
}

async fn post_json(
    app: axum::Router,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_visualize_returns_feature_collection() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let (status, json) = post_json(
        app,
        "/api/visualize",
        serde_json::json!({ "batchId": "b1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["type"], "FeatureCollection");
    // One moving event (point + path), one stationary (point)
    assert_eq!(json["features"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_visualize_with_filter() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let (status, json) = post_json(
        app,
        "/api/visualize",
        serde_json::json!({ "batchId": "b1", "filter": "braking" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["label"], "Hard Braking");
}

#[tokio::test]
async fn test_visualize_empty_batch_id_is_400() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let (status, json) = post_json(
        app,
        "/api/visualize",
        serde_json::json!({ "batchId": "  " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_search_unloaded_batch_is_404() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let (status, json) = post_json(
        app,
        "/api/ai-search",
        serde_json::json!({ "batchId": "never-visualized", "query": "pedestrian" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_search_without_embeddings_is_embeddings_disabled() {
    let csv = write_mock_csv();
    let state = test_state(csv.path());
    let app = build_app(state.clone());

    let (status, _) = post_json(
        app.clone(),
        "/api/visualize",
        serde_json::json!({ "batchId": "b1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(
        app,
        "/api/ai-search",
        serde_json::json!({ "batchId": "b1", "query": "pedestrian" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "embeddings_disabled");
}

#[tokio::test]
async fn test_video_url_empty_id_is_400() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let (status, json) = post_json(
        app,
        "/api/video-url",
        serde_json::json!({ "videoId": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_map_for_cached_batch() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let (status, _) = post_json(
        app.clone(),
        "/api/visualize",
        serde_json::json!({ "batchId": "b1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/map/b1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("leaflet"));
    assert!(html.contains("Hard Braking"));
}

#[tokio::test]
async fn test_map_for_unknown_batch_is_404() {
    let csv = write_mock_csv();
    let app = build_app(test_state(csv.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/map/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

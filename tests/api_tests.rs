//! HTTP routes, driven through the router without binding a socket

#![cfg(feature = "api")]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vodcat::api::{router, AppState};

fn app(backend: FakeBackend) -> axum::Router {
    router(AppState {
        composer: Arc::new(composer(Arc::new(backend))),
    })
}

async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(FakeBackend::new()), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_view_count_requires_id() {
    let (status, body) = send(app(FakeBackend::new()), "GET", "/api/videos").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "ID is required" }));

    let (status, _) = send(app(FakeBackend::new()), "GET", "/api/videos?id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_view_count_increments() {
    let backend = FakeBackend::new()
        .always("/videos/12", json!({ "data": { "id": 12, "attributes": { "count": 4 } } }))
        .on_put("/videos/12", |_| json!({ "data": { "id": 12, "attributes": { "count": 5 } } }));

    let (status, body) = send(app(backend), "GET", "/api/videos?id=12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Count updated successfully", "newCount": 5 })
    );
}

#[tokio::test]
async fn test_view_count_failure_is_server_error() {
    let backend = FakeBackend::new().failing("/videos/12");
    let (status, body) = send(app(backend), "GET", "/api/videos?id=12").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_record_play_is_accepted() {
    let (status, _) = send(app(FakeBackend::new()), "POST", "/api/videos/3/play").await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_announcement() {
    let mut site = website_body(&[1]);
    site["data"]["attributes"]["announcement"] = json!("维护通知");
    let (status, body) = send(
        app(FakeBackend::new().always("/websites/1", site)),
        "GET",
        "/api/announcement",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["announcement"], "维护通知");

    let (status, body) = send(
        app(FakeBackend::new().failing("/websites/1")),
        "GET",
        "/api/announcement",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "获取公告失败");
}

#[tokio::test]
async fn test_render_actor_listing_with_encoded_slug() {
    let backend = FakeBackend::new()
        .always("/websites/1", website_body(&[1]))
        .on("/actors", |q| {
            (q.get("filters[name][$eq]") == Some("山田花子"))
                .then(|| json!({ "data": [named_entry(3, "山田花子")] }))
        })
        .always(
            "/videos",
            list_envelope((1..=20).map(card_entry).collect(), 1, 20, 37),
        );

    let (status, body) = send(
        app(backend),
        "GET",
        "/render/actor/%E5%B1%B1%E7%94%B0%E8%8A%B1%E5%AD%90",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "山田花子");
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["jsonLd"]["numberOfItems"], 20);
    assert_eq!(body["jsonLd"]["@type"], "CollectionPage");
}

#[tokio::test]
async fn test_render_page_past_the_end() {
    let backend = FakeBackend::new()
        .always("/websites/1", website_body(&[1]))
        .always(
            "/categories",
            json!({ "data": [{ "id": 7, "attributes": { "name": "Horror", "slug": "horror" } }] }),
        )
        .always("/videos", list_envelope(vec![], 5, 20, 45));

    let (status, body) = send(app(backend), "GET", "/render/category/horror/5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], true);
    assert_eq!(body["page"], 5);
    assert_eq!(body["totalPages"], 3);
}

#[tokio::test]
async fn test_render_unknown_actor_is_404() {
    let backend = FakeBackend::new()
        .always("/websites/1", website_body(&[1]))
        .always("/actors", json!({ "data": [] }));

    let (status, body) = send(app(backend), "GET", "/render/actor/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn test_render_unknown_kind_is_400() {
    let (status, _) = send(app(FakeBackend::new()), "GET", "/render/planet/mars").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_render_backend_failure_is_502() {
    let backend = FakeBackend::new().failing("/websites/1").failing("/tags");
    let (status, _) = send(app(backend), "GET", "/render/tag/drama").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_render_video_page() {
    let backend = FakeBackend::new()
        .always("/websites/1", website_body(&[1]))
        .always(
            "/videos",
            json!({ "data": [full_video_entry(500, "focal", &[])] }),
        );

    let (status, body) = send(app(backend), "GET", "/render/video/focal").await;

    assert_eq!(status, StatusCode::OK);
    let playback = body["playbackUrl"].as_str().unwrap();
    assert!(playback.starts_with(
        "https://cdn.example.com/hls/focal/index.m3u8?counts=3&timestamp=1700000600000&key="
    ));
    assert_eq!(body["jsonLd"]["@type"], "Movie");
    assert_eq!(body["related"], json!([]));
}

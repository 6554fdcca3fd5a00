//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use super::models::{
    AnnouncementResponse, ApiError, ErrorBody, HealthResponse, ViewCountQuery, ViewCountResponse,
};
use crate::catalog::ListingKind;
use crate::render::{PageComposer, PageRoute};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<PageComposer>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/api/videos", get(view_count_handler))
        .route("/api/videos/:id/play", post(record_play_handler))
        .route("/api/announcement", get(announcement_handler))
        .route("/render/home", get(home_handler))
        .route("/render/:kind/:slug", get(render_handler))
        .route("/render/:kind/:slug/:page", get(render_page_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("🌐 API server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/videos?id=<id>`: increment the view count and return the new value
async fn view_count_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewCountQuery>,
) -> Response {
    let Some(raw_id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "ID is required");
    };
    let Ok(id) = raw_id.trim().parse::<u64>() else {
        return error_body(StatusCode::BAD_REQUEST, format!("Invalid ID: {}", raw_id));
    };

    match state.composer.catalog().increment_view_count(id).await {
        Ok(new_count) => Json(ViewCountResponse {
            message: "Count updated successfully".to_string(),
            new_count,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to update view count for {}: {}", id, e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Fire-and-forget playback start
async fn record_play_handler(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    state.composer.catalog().spawn_record_play(id);
    StatusCode::ACCEPTED
}

async fn announcement_handler(State(state): State<AppState>) -> Response {
    match state.composer.catalog().announcement().await {
        Ok(announcement) => Json(AnnouncementResponse { announcement }).into_response(),
        Err(e) => {
            error!("Failed to fetch announcement: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "获取公告失败")
        }
    }
}

async fn home_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let payload = state.composer.home_page().await?;
    Ok(Json(payload).into_response())
}

async fn render_handler(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    render(&state, &kind, &slug, None).await
}

async fn render_page_handler(
    State(state): State<AppState>,
    Path((kind, slug, page)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    render(&state, &kind, &slug, Some(&page)).await
}

/// `video/<slug>` renders a video page, `<kind>/<slug>[/<page>]` a listing page.
/// Path segments arrive decoded.
async fn render(
    state: &AppState,
    kind: &str,
    slug: &str,
    page: Option<&str>,
) -> Result<Response, ApiError> {
    if kind == "video" && page.is_none() {
        let route = PageRoute::decoded(slug, None)?;
        let payload = state.composer.video_page(&route.slug).await?;
        return Ok(Json(payload).into_response());
    }

    let kind: ListingKind = kind.parse()?;
    let route = PageRoute::decoded(slug, page)?;
    let payload = state.composer.listing_page(kind, &route).await?;
    Ok(Json(payload).into_response())
}

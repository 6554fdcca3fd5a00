//! API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use vodcat_core::CatalogError;

/// Error body shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCountResponse {
    pub message: String,
    pub new_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnnouncementResponse {
    pub announcement: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `?id=` of the view-count endpoint
#[derive(Debug, Deserialize)]
pub struct ViewCountQuery {
    pub id: Option<String>,
}

/// A catalog error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CatalogError::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CatalogError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CatalogError::BackendUnavailable { .. } | CatalogError::MalformedResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            CatalogError::MalformedConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Render failed: {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

//! HTTP API for the catalog
//!
//! Serves rendered page payloads as JSON plus the view-count and announcement endpoints.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::render::PageComposer;

pub mod models;
pub mod server;

pub use server::{router, AppState};

/// API Server for page renders and the small JSON endpoints
pub struct ApiServer {
    composer: Arc<PageComposer>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(composer: Arc<PageComposer>, host: impl Into<String>, port: u16) -> Self {
        Self {
            composer,
            host: host.into(),
            port,
        }
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Run the API server until it stops
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on {}:{}", self.host, self.port);

        let state = AppState {
            composer: self.composer,
        };
        server::start_http_server(state, &self.host, self.port).await
    }
}

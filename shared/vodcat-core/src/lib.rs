//! vodcat core - catalog records, playback URL signing and related-content sampling

pub mod duration;
pub mod model;
pub mod pagination;
pub mod related;
pub mod signer;

pub use model::{
    ActorRef, CategoryRef, EntityKind, FooterLink, NavCategory, Poster, RobotsPolicy, Screenshot,
    SeoDefaults, SocialMeta, TagRef, VideoRecord, WebsiteConfig,
};
pub use pagination::{total_pages, PageRequest};
pub use related::{RelatedVideoSet, RELATED_SAMPLE_SIZE, RELATED_SPLIT};
pub use signer::{Clock, FixedClock, SignedPlaybackUrl, SigningScheme, SystemClock, TokenSigner};

use std::time::Duration;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error types for catalog operations
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("{kind} not found: {key}")]
    EntityNotFound { kind: EntityKind, key: String },

    #[error("backend unavailable at {url}: {reason}")]
    BackendUnavailable {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("malformed configuration: {0}")]
    MalformedConfiguration(String),

    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::EntityNotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }

    /// Timeouts count as backend failures.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::MalformedResponse { .. } | Self::Timeout(_)
        )
    }
}

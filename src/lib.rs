//! vodcat - catalog aggregation for a CMS-backed video site
//!
//! Resolves listings and video pages from a Strapi-style backend, signs playback URLs for the
//! CDN, samples related content and builds the structured data search engines read.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod render;
pub mod seo;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::backend::{ContentBackend, StrapiClient, StrapiQuery};
pub use crate::catalog::{
    CatalogService, CatalogSettings, Dimension, Listing, ListingKind, ListingRequest, VideoPage,
};
pub use crate::config::{log_directives, Config, ConfigBuilder};
pub use crate::render::{PageComposer, PageRoute, RenderSettings};
pub use vodcat_core::{CatalogError, Result};

use std::sync::Arc;

/// Wire a backend client, catalog and composer from configuration
pub fn build_composer(config: &Config) -> Result<PageComposer> {
    let client = StrapiClient::new(&config.backend.url, config.backend.timeout())?;
    let catalog = CatalogService::new(Arc::new(client), CatalogSettings::from(config));
    Ok(PageComposer::new(Arc::new(catalog), RenderSettings::from(config)))
}

//! Structured data and page metadata for search engines

pub mod jsonld;
pub mod metadata;

pub use jsonld::{collection_json_ld, movie_json_ld, CollectionJsonLd, MovieJsonLd};
pub use metadata::{
    listing_metadata, listing_titles, listing_url, site_metadata, video_metadata, PageMetadata,
};

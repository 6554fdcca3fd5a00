//! schema.org JSON-LD documents
//!
//! Field names and fallbacks are consumed by search engines, so the shapes here are fixed:
//! `Movie` for a video page, `CollectionPage` for listings and `SearchResultsPage` for search.

use crate::catalog::{Listing, ListingKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vodcat_core::duration::{iso8601_duration, iso8601_or_unknown};
use vodcat_core::{VideoRecord, WebsiteConfig};

const SCHEMA_CONTEXT: &str = "https://schema.org";
const UNKNOWN_DIRECTOR: &str = "Unknown Director";
const UNKNOWN_GENRE: &str = "Unknown Genre";

/// `{ "@type": ..., "name": ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Named {
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
}

impl Named {
    pub fn new(kind: &str, name: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieJsonLd {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Vec<String>,
    pub actor: Vec<Named>,
    pub director: Named,
    pub duration: String,
    pub genre: String,
    pub date_published: Option<DateTime<Utc>>,
    pub url: String,
}

pub fn movie_json_ld(video: &VideoRecord, site: &WebsiteConfig) -> MovieJsonLd {
    let image = video
        .poster
        .iter()
        .map(String::as_str)
        .chain(video.poster2_url())
        .map(|path| site.image(path))
        .collect();

    let genre = video.tag_names().join(", ");

    MovieJsonLd {
        context: SCHEMA_CONTEXT.to_string(),
        kind: "Movie".to_string(),
        name: video.title.clone(),
        description: video.summary.clone(),
        image,
        actor: video
            .actors
            .iter()
            .map(|actor| Named::new("Person", actor.name.as_str()))
            .collect(),
        director: Named::new(
            "Person",
            video.director.as_deref().unwrap_or(UNKNOWN_DIRECTOR),
        ),
        duration: iso8601_or_unknown(video.duration.as_deref()),
        genre: if genre.is_empty() {
            UNKNOWN_GENRE.to_string()
        } else {
            genre
        },
        date_published: video.created_at,
        url: format!("{}/{}", site.canonical_url(), video.slug),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoObject {
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: String,
    pub position: usize,
    pub item: VideoObject,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSiteRef {
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionJsonLd {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub is_part_of: WebSiteRef,
    pub about: Named,
    pub number_of_items: usize,
    pub item_list_element: Vec<ListItem>,
}

/// Collection document for one listing page
///
/// `numberOfItems` counts the items on this page, not the listing total.
pub fn collection_json_ld(
    listing: &Listing,
    site: &WebsiteConfig,
    name: &str,
    description: &str,
    url: &str,
) -> CollectionJsonLd {
    let kind = match listing.kind {
        ListingKind::Search => "SearchResultsPage",
        _ => "CollectionPage",
    };

    let items: Vec<ListItem> = listing
        .videos
        .videos
        .iter()
        .enumerate()
        .map(|(index, video)| ListItem {
            kind: "ListItem".to_string(),
            position: index + 1,
            item: video_object(video, site, &listing.name),
        })
        .collect();

    CollectionJsonLd {
        context: SCHEMA_CONTEXT.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        url: url.to_string(),
        is_part_of: WebSiteRef {
            kind: "WebSite".to_string(),
            name: site.name.clone(),
            url: site.canonical_url().to_string(),
        },
        about: Named::new(listing.kind.about_type(), listing.name.as_str()),
        number_of_items: items.len(),
        item_list_element: items,
    }
}

fn video_object(video: &VideoRecord, site: &WebsiteConfig, about: &str) -> VideoObject {
    VideoObject {
        kind: "VideoObject".to_string(),
        name: video.title.clone(),
        duration: video.duration.as_deref().and_then(iso8601_duration),
        thumbnail_url: video.poster2_url().map(|path| site.image(path)),
        upload_date: video.upload_date(),
        description: video
            .summary
            .clone()
            .unwrap_or_else(|| format!("{} - {}", video.title, about)),
    }
}

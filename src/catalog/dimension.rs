//! Listing dimensions and paged results

use crate::backend::StrapiQuery;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use vodcat_core::{total_pages, CatalogError, EntityKind, PageRequest, VideoRecord};

/// Listing axis as named in page routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Category,
    Actor,
    Tag,
    Director,
    Studio,
    Search,
}

impl ListingKind {
    pub const ALL: [ListingKind; 6] = [
        ListingKind::Category,
        ListingKind::Actor,
        ListingKind::Tag,
        ListingKind::Director,
        ListingKind::Studio,
        ListingKind::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Category => "category",
            ListingKind::Actor => "actor",
            ListingKind::Tag => "tag",
            ListingKind::Director => "director",
            ListingKind::Studio => "studio",
            ListingKind::Search => "search",
        }
    }

    /// Route prefix used for canonical and pagination links
    pub fn base_path(&self) -> String {
        format!("/{}", self.as_str())
    }

    /// schema.org type of the listing's subject
    pub fn about_type(&self) -> &'static str {
        match self {
            ListingKind::Actor | ListingKind::Director => "Person",
            ListingKind::Studio => "Organization",
            ListingKind::Category | ListingKind::Tag | ListingKind::Search => "Thing",
        }
    }

    /// Entity a missing key is reported as; search has none
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            ListingKind::Category => Some(EntityKind::Category),
            ListingKind::Actor => Some(EntityKind::Actor),
            ListingKind::Tag => Some(EntityKind::Tag),
            ListingKind::Director => Some(EntityKind::Director),
            ListingKind::Studio => Some(EntityKind::Studio),
            ListingKind::Search => None,
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::InvalidRequest(format!("unknown listing kind: {}", s)))
    }
}

/// Resolved filter over the video collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    Category(u64),
    Actor(u64),
    Tag(u64),
    Director(String),
    Studio(String),
    /// Case-insensitive title match within the permitted categories
    Search { term: String, category_ids: Vec<u64> },
}

impl Dimension {
    pub fn kind(&self) -> ListingKind {
        match self {
            Dimension::Category(_) => ListingKind::Category,
            Dimension::Actor(_) => ListingKind::Actor,
            Dimension::Tag(_) => ListingKind::Tag,
            Dimension::Director(_) => ListingKind::Director,
            Dimension::Studio(_) => ListingKind::Studio,
            Dimension::Search { .. } => ListingKind::Search,
        }
    }

    /// Add this dimension's filter predicate to `query`
    pub fn apply(&self, query: StrapiQuery) -> StrapiQuery {
        match self {
            Dimension::Category(id) => query.filter_eq(&["category", "id"], id),
            Dimension::Actor(id) => query.filter_eq(&["actors", "id"], id),
            Dimension::Tag(id) => query.filter_eq(&["tags", "id"], id),
            Dimension::Director(name) => query.filter_eq(&["director"], name),
            Dimension::Studio(name) => query.filter_eq(&["studio"], name),
            Dimension::Search { term, category_ids } => query
                .filter_in(&["category", "id"], category_ids.as_slice())
                .filter(&["originalname"], "$containsi", term),
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub videos: Vec<VideoRecord>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl VideoPage {
    /// Page count is always derived from `total`, never taken from the backend
    pub fn new(videos: Vec<VideoRecord>, request: PageRequest, total: u64) -> Self {
        Self {
            videos,
            page: request.page(),
            page_size: request.page_size(),
            total,
            total_pages: total_pages(total, request.page_size()),
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

/// Listing addressed by route: kind, raw (decoded) key and page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub kind: ListingKind,
    pub key: String,
    pub page: PageRequest,
}

impl ListingRequest {
    pub fn new(kind: ListingKind, key: impl Into<String>, page: PageRequest) -> Self {
        Self {
            kind,
            key: key.into(),
            page,
        }
    }
}

/// A resolved listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub kind: ListingKind,

    /// Route key as requested, decoded
    pub key: String,

    /// Display name of the listing subject
    pub name: String,

    pub videos: VideoPage,
}

//! Catalog records consumed from the content backend
//!
//! These are read-only snapshots fetched per request. Nothing in this crate mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of entity a page can be keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Video,
    Category,
    Actor,
    Tag,
    Director,
    Studio,
    Website,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Video => "video",
            EntityKind::Category => "category",
            EntityKind::Actor => "actor",
            EntityKind::Tag => "tag",
            EntityKind::Director => "director",
            EntityKind::Studio => "studio",
            EntityKind::Website => "website",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
    pub slug: Option<String>,
}

/// Sized poster image, path relative to the image CDN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poster {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub id: String,
    pub url: String,
}

/// A single video as the backend describes it
///
/// Listing queries select only a few fields, so everything beyond identity and title is
/// optional or empty when the backend was not asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: u64,

    /// URL slug ("aka")
    pub slug: String,

    pub title: String,
    pub summary: Option<String>,

    /// Free-form duration string, e.g. "125分钟"
    pub duration: Option<String>,

    pub year: Option<i32>,

    /// Legacy poster path, relative to the image CDN
    pub poster: Option<String>,

    pub poster2: Option<Poster>,
    pub category: Option<CategoryRef>,
    pub actors: Vec<ActorRef>,
    pub tags: Vec<TagRef>,
    pub studio: Option<String>,
    pub director: Option<String>,

    /// Raw CDN path of the source file
    pub movie_path: Option<String>,

    /// Unsigned HLS manifest path
    pub m3u8_path: Option<String>,

    pub screenshots: Vec<Screenshot>,
    pub view_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl VideoRecord {
    /// Minimal record carrying only identity and title
    pub fn new(id: u64, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: title.into(),
            summary: None,
            duration: None,
            year: None,
            poster: None,
            poster2: None,
            category: None,
            actors: Vec::new(),
            tags: Vec::new(),
            studio: None,
            director: None,
            movie_path: None,
            m3u8_path: None,
            screenshots: Vec::new(),
            view_count: 0,
            created_at: None,
            published_at: None,
        }
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags
            .iter()
            .map(|tag| tag.name.as_str())
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn poster2_url(&self) -> Option<&str> {
        self.poster2.as_ref().map(|p| p.url.as_str())
    }

    /// Creation time, falling back to publication time
    pub fn upload_date(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.published_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavCategory {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterLink {
    pub id: u64,
    pub order: i32,
    pub name: String,
    pub url: String,
    pub new_tab: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMeta {
    pub network: String,
    pub title: String,
    pub description: String,
}

/// Robots directives stored with the site's SEO block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsPolicy {
    pub index: bool,
    pub follow: bool,
    pub nocache: bool,
}

impl RobotsPolicy {
    /// Directive string, e.g. "index, follow, noarchive"
    pub fn directive(&self) -> String {
        let mut parts = vec![
            if self.index { "index" } else { "noindex" },
            if self.follow { "follow" } else { "nofollow" },
        ];
        if self.nocache {
            parts.push("noarchive");
        }
        parts.join(", ")
    }
}

impl Default for RobotsPolicy {
    fn default() -> Self {
        Self {
            index: true,
            follow: true,
            nocache: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeoDefaults {
    pub canonical_url: String,
    pub template_title: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    pub robots: Option<RobotsPolicy>,
    pub social: Vec<SocialMeta>,
}

/// Per-deployment site configuration stored in the backend
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    pub name: String,

    /// Image CDN base, prefixed to every poster/screenshot path
    pub image_url: String,

    /// Video CDN base, prefixed to every signed playback path
    pub video_url: String,

    /// Shared secret fragment for playback signing
    #[serde(skip_serializing)]
    pub token_secret: Option<String>,

    /// Play-count ceiling, string-encoded integer
    pub play_count_ceiling: Option<String>,

    /// Milliseconds added to "now" to form the expiry, string-encoded integer
    pub timestamp_offset_ms: Option<String>,

    pub twitter: Option<String>,
    pub categories: Vec<NavCategory>,
    pub seo: SeoDefaults,
    pub links: Vec<FooterLink>,
    pub announcement: Option<String>,
}

impl WebsiteConfig {
    /// Category ids this site is permitted to show
    pub fn category_ids(&self) -> Vec<u64> {
        self.categories.iter().map(|c| c.id).collect()
    }

    pub fn image(&self, path: &str) -> String {
        format!("{}{}", self.image_url, path)
    }

    pub fn canonical_url(&self) -> &str {
        &self.seo.canonical_url
    }
}

impl fmt::Debug for WebsiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebsiteConfig")
            .field("name", &self.name)
            .field("image_url", &self.image_url)
            .field("video_url", &self.video_url)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("play_count_ceiling", &self.play_count_ceiling)
            .field("timestamp_offset_ms", &self.timestamp_offset_ms)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

//! Page `<head>` metadata: title, description, canonical link, Open Graph and Twitter card

use crate::catalog::ListingKind;
use serde::Serialize;
use vodcat_core::{RobotsPolicy, VideoRecord, WebsiteConfig};

const DEFAULT_TITLE: &str = "默认标题";
const DEFAULT_DESCRIPTION: &str = "默认描述";
const FALLBACK_IMAGE_WIDTH: u32 = 800;
const FALLBACK_IMAGE_HEIGHT: u32 = 600;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OgImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenGraph {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub images: Vec<OgImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwitterCard {
    pub card: String,
    pub site: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub canonical: String,
    pub robots: String,
    pub open_graph: OpenGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<TwitterCard>,
}

/// Metadata for a video page. Video pages are never archived.
pub fn video_metadata(video: &VideoRecord, site: &WebsiteConfig) -> PageMetadata {
    let title = non_empty(&video.title).unwrap_or(DEFAULT_TITLE).to_string();
    let description = video
        .summary
        .as_deref()
        .and_then(non_empty)
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string();

    let keywords: Vec<&str> = video
        .actors
        .iter()
        .map(|actor| actor.name.as_str())
        .chain(video.tag_names())
        .chain(video.category.iter().map(|c| c.name.as_str()))
        .filter(|part| !part.is_empty())
        .collect();

    let mut images = Vec::new();
    if let Some(poster) = &video.poster {
        images.push(OgImage {
            url: site.image(poster),
            width: FALLBACK_IMAGE_WIDTH,
            height: FALLBACK_IMAGE_HEIGHT,
            alt: video.title.clone(),
        });
    }
    if let Some(poster2) = &video.poster2 {
        images.push(OgImage {
            url: site.image(&poster2.url),
            width: poster2.width.unwrap_or(FALLBACK_IMAGE_WIDTH),
            height: poster2.height.unwrap_or(FALLBACK_IMAGE_HEIGHT),
            alt: video.title.clone(),
        });
    }

    let canonical = format!("{}/{}", site.canonical_url(), video.slug);
    let twitter = site.twitter.as_ref().map(|handle| TwitterCard {
        card: "summary_large_image".to_string(),
        site: format!("@{}", handle.trim_start_matches('@')),
        title: title.clone(),
        description: description.clone(),
        images: video.poster2_url().map(|p| site.image(p)).into_iter().collect(),
    });

    let robots = RobotsPolicy {
        index: true,
        follow: true,
        nocache: true,
    };

    PageMetadata {
        open_graph: OpenGraph {
            kind: "video.movie".to_string(),
            url: canonical.clone(),
            title: title.clone(),
            description: description.clone(),
            images,
        },
        title,
        description,
        keywords: (!keywords.is_empty()).then(|| keywords.join(", ")),
        canonical,
        robots: robots.directive(),
        twitter,
    }
}

/// Title and description for one page of a listing
pub fn listing_titles(kind: ListingKind, name: &str, page: u32) -> (String, String) {
    match kind {
        ListingKind::Category => (
            format!("{} 在线观看 - 第{}页", name, page),
            format!("探索 {} 类别中的精彩视频，第{}页", name, page),
        ),
        ListingKind::Actor => (
            format!("{} 作品在线观看 - 第{}页", name, page),
            format!("探索 {} 的精彩视频作品，第{}页", name, page),
        ),
        ListingKind::Studio => (
            format!("{} 作品在线观看 - 第{}页", name, page),
            format!("探索 {} 工作室的精彩视频作品，第{}页", name, page),
        ),
        ListingKind::Director => (
            format!("{} 导演作品在线观看 - 第{}页", name, page),
            format!("探索 {} 导演的精彩视频作品，第{}页", name, page),
        ),
        ListingKind::Tag => (
            format!("{} 在线观看 - 第{}页", name, page),
            format!("探索 {} 标签下的精彩视频，第{}页", name, page),
        ),
        ListingKind::Search => (
            format!("\"{}\" 搜索结果 - 第{}页", name, page),
            format!("探索与 \"{}\" 相关的视频，第{}页", name, page),
        ),
    }
}

/// Absolute URL of a listing page; the key is percent-encoded
pub fn listing_url(site: &WebsiteConfig, kind: ListingKind, key: &str, page: u32) -> String {
    format!(
        "{}{}/{}/{}",
        site.canonical_url(),
        kind.base_path(),
        urlencoding::encode(key),
        page
    )
}

pub fn listing_metadata(
    kind: ListingKind,
    key: &str,
    name: &str,
    page: u32,
    site: &WebsiteConfig,
) -> PageMetadata {
    let (title, description) = listing_titles(kind, name, page);
    let canonical = listing_url(site, kind, key, page);

    let og_title = match kind {
        ListingKind::Search if !site.name.is_empty() => format!("{} | {}", title, site.name),
        _ => title.clone(),
    };

    PageMetadata {
        open_graph: OpenGraph {
            kind: "website".to_string(),
            url: canonical.clone(),
            title: og_title,
            description: description.clone(),
            images: Vec::new(),
        },
        title,
        description,
        keywords: Some(name.to_string()),
        canonical,
        robots: site.seo.robots.unwrap_or_default().directive(),
        twitter: None,
    }
}

/// Site-wide metadata from the SEO block, used by the home page
pub fn site_metadata(site: &WebsiteConfig) -> PageMetadata {
    let title = site
        .seo
        .meta_title
        .as_deref()
        .and_then(non_empty)
        .unwrap_or(&site.name)
        .to_string();
    let description = site
        .seo
        .meta_description
        .as_deref()
        .and_then(non_empty)
        .unwrap_or("")
        .to_string();

    let social = site
        .seo
        .social
        .iter()
        .find(|s| s.network.eq_ignore_ascii_case("twitter"));
    let twitter = site.twitter.as_ref().map(|handle| TwitterCard {
        card: "summary_large_image".to_string(),
        site: format!("@{}", handle.trim_start_matches('@')),
        title: social.map(|s| s.title.clone()).unwrap_or_else(|| title.clone()),
        description: social
            .map(|s| s.description.clone())
            .unwrap_or_else(|| description.clone()),
        images: Vec::new(),
    });

    PageMetadata {
        open_graph: OpenGraph {
            kind: "website".to_string(),
            url: site.canonical_url().to_string(),
            title: title.clone(),
            description: description.clone(),
            images: Vec::new(),
        },
        title,
        description,
        keywords: site.seo.keywords.clone(),
        canonical: site.canonical_url().to_string(),
        robots: site.seo.robots.unwrap_or_default().directive(),
        twitter,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

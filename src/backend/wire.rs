//! Backend response shapes
//!
//! Every response is `{ data, meta? }`; entities are `{ id, attributes }` and relations are
//! wrapped as `{ data }`. These types are decoded at the client boundary and converted into the
//! core records so nothing downstream sees the wire layout.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use vodcat_core::{
    ActorRef, CatalogError, CategoryRef, FooterLink, NavCategory, Poster, Result, RobotsPolicy,
    Screenshot, SeoDefaults, SocialMeta, TagRef, VideoRecord, WebsiteConfig,
};

/// Decode a raw response body, rejecting anything that does not match the expected shape
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| CatalogError::MalformedResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<T> Envelope<T> {
    pub fn pagination(&self) -> Option<PaginationMeta> {
        self.meta.as_ref().and_then(|m| m.pagination)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<PaginationMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct Entry<A> {
    #[serde(deserialize_with = "id_from_any")]
    pub id: u64,
    pub attributes: A,
}

#[derive(Debug, Deserialize)]
pub struct Relation<T> {
    pub data: T,
}

pub type Many<A> = Option<Relation<Vec<Entry<A>>>>;
pub type One<A> = Option<Relation<Option<Entry<A>>>>;

fn many<A>(relation: Many<A>) -> Vec<Entry<A>> {
    relation.map(|r| r.data).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct IdOnly {
    #[serde(deserialize_with = "id_from_any")]
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct NameAttributes {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryAttributes {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagAttributes {
    pub name: String,
    #[serde(default)]
    pub videos: Option<Relation<Vec<IdOnly>>>,
}

impl TagAttributes {
    pub fn video_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.videos.iter().flat_map(|r| r.data.iter().map(|v| v.id))
    }
}

#[derive(Debug, Deserialize)]
pub struct PosterWire {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct M3u8Wire {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub hd: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScreenshotWire {
    #[serde(deserialize_with = "string_from_any")]
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAttributes {
    pub originalname: String,
    pub aka: String,
    pub summary: Option<String>,
    pub moviepath: Option<String>,
    pub actors: Many<NameAttributes>,
    pub tags: Many<TagAttributes>,
    pub category: One<CategoryAttributes>,
    pub poster: Option<String>,
    pub poster2: Option<PosterWire>,
    pub m3u8paths: Option<M3u8Wire>,
    pub studio: Option<String>,
    pub director: Option<String>,
    pub screenshots: Option<Vec<ScreenshotWire>>,
    pub count: Option<u64>,
    pub duration: Option<String>,
    pub year: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Only the view counter, for the increment round trip
#[derive(Debug, Deserialize)]
pub struct CountAttributes {
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSocialWire {
    #[serde(default)]
    pub social_network: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MetaRobotsWire {
    #[serde(default = "yes")]
    pub index: bool,
    #[serde(default = "yes")]
    pub follow: bool,
    #[serde(default)]
    pub nocache: bool,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoWire {
    #[serde(rename = "canonicalURL", default)]
    pub canonical_url: Option<String>,
    pub template_title: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    pub meta_robots: Option<MetaRobotsWire>,
    #[serde(default)]
    pub meta_social: Vec<MetaSocialWire>,
}

#[derive(Debug, Deserialize)]
pub struct LinkAttributes {
    #[serde(default)]
    pub order: i32,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub target: bool,
}

#[derive(Debug, Deserialize)]
pub struct WebsiteAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "videoURL")]
    pub video_url: String,
    #[serde(default)]
    pub efvtoken: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub counts: Option<String>,
    #[serde(
        rename = "currentTimestamp",
        default,
        deserialize_with = "opt_string_from_any"
    )]
    pub current_timestamp: Option<String>,
    #[serde(rename = "Twitter", default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub categories: Many<NameAttributes>,
    #[serde(default)]
    pub seo: Option<SeoWire>,
    #[serde(default)]
    pub links: Many<LinkAttributes>,
    #[serde(default)]
    pub announcement: Option<String>,
}

impl From<Entry<NameAttributes>> for ActorRef {
    fn from(entry: Entry<NameAttributes>) -> Self {
        Self {
            id: entry.id,
            name: entry.attributes.name,
        }
    }
}

impl From<Entry<TagAttributes>> for TagRef {
    fn from(entry: Entry<TagAttributes>) -> Self {
        Self {
            id: entry.id,
            name: entry.attributes.name,
        }
    }
}

impl From<Entry<CategoryAttributes>> for CategoryRef {
    fn from(entry: Entry<CategoryAttributes>) -> Self {
        Self {
            id: entry.id,
            name: entry.attributes.name,
            slug: entry.attributes.slug,
        }
    }
}

impl From<Entry<VideoAttributes>> for VideoRecord {
    fn from(entry: Entry<VideoAttributes>) -> Self {
        let a = entry.attributes;
        Self {
            id: entry.id,
            slug: a.aka,
            title: a.originalname,
            summary: a.summary.filter(|s| !s.is_empty()),
            duration: a.duration,
            year: a.year,
            poster: a.poster,
            poster2: a.poster2.map(|p| Poster {
                url: p.url,
                width: p.width,
                height: p.height,
            }),
            category: a.category.and_then(|r| r.data).map(CategoryRef::from),
            actors: many(a.actors).into_iter().map(ActorRef::from).collect(),
            tags: many(a.tags).into_iter().map(TagRef::from).collect(),
            studio: a.studio.filter(|s| !s.is_empty()),
            director: a.director.filter(|s| !s.is_empty()),
            movie_path: a.moviepath,
            m3u8_path: a.m3u8paths.and_then(|m| m.path),
            screenshots: a
                .screenshots
                .unwrap_or_default()
                .into_iter()
                .map(|s| Screenshot { id: s.id, url: s.url })
                .collect(),
            view_count: a.count.unwrap_or(0),
            created_at: a.created_at,
            published_at: a.published_at,
        }
    }
}

impl From<Entry<WebsiteAttributes>> for WebsiteConfig {
    fn from(entry: Entry<WebsiteAttributes>) -> Self {
        let a = entry.attributes;
        let seo = a
            .seo
            .map(|seo| SeoDefaults {
                canonical_url: seo
                    .canonical_url
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_default(),
                template_title: seo.template_title,
                meta_title: seo.meta_title,
                meta_description: seo.meta_description,
                keywords: seo.keywords,
                robots: seo.meta_robots.map(|r| RobotsPolicy {
                    index: r.index,
                    follow: r.follow,
                    nocache: r.nocache,
                }),
                social: seo
                    .meta_social
                    .into_iter()
                    .map(|s| SocialMeta {
                        network: s.social_network,
                        title: s.title,
                        description: s.description,
                    })
                    .collect(),
            })
            .unwrap_or_default();

        let mut links: Vec<FooterLink> = many(a.links)
            .into_iter()
            .map(|link| FooterLink {
                id: link.id,
                order: link.attributes.order,
                name: link.attributes.name,
                url: link.attributes.url,
                new_tab: link.attributes.target,
            })
            .collect();
        links.sort_by_key(|link| link.order);

        Self {
            name: a.name,
            image_url: a.image_url,
            video_url: a.video_url,
            token_secret: a.efvtoken,
            play_count_ceiling: a.counts,
            timestamp_offset_ms: a.current_timestamp,
            twitter: a.twitter.filter(|t| !t.is_empty()),
            categories: many(a.categories)
                .into_iter()
                .map(|c| NavCategory {
                    id: c.id,
                    name: c.attributes.name,
                })
                .collect(),
            seo,
            links,
            announcement: a.announcement.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn into_string(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s,
        }
    }
}

fn id_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = NumberOrString::deserialize(deserializer)?.into_string();
    raw.trim()
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid id: {:?}", raw)))
}

fn string_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberOrString::deserialize(deserializer)?.into_string())
}

fn opt_string_from_any<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_video_decoding() {
        let body = json!({
            "data": [{
                "id": 7,
                "attributes": {
                    "originalname": "Sample",
                    "aka": "abc-123",
                    "summary": "",
                    "duration": "125分钟",
                    "poster": "/p/abc.jpg",
                    "poster2": { "url": "/p2/abc.jpg", "width": 800, "height": 538 },
                    "m3u8paths": { "path": "/hls/abc/index.m3u8", "hd": "/hls/abc/hd.m3u8" },
                    "actors": { "data": [{ "id": 3, "attributes": { "name": "山田花子" } }] },
                    "tags": { "data": [{ "id": "11", "attributes": { "name": "A" } }] },
                    "category": { "data": { "id": 1, "attributes": { "name": "Movies", "slug": "movies" } } },
                    "director": "",
                    "screenshots": [{ "id": 1, "url": "/s/1.jpg" }],
                    "count": 41,
                    "createdAt": "2024-05-01T10:00:00.000Z"
                }
            }],
            "meta": { "pagination": { "page": 1, "pageSize": 25, "pageCount": 1, "total": 1 } }
        });

        let envelope: Envelope<Vec<Entry<VideoAttributes>>> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.pagination().map(|p| p.total), Some(1));

        let video = VideoRecord::from(envelope.data.into_iter().next().unwrap());
        assert_eq!(video.id, 7);
        assert_eq!(video.slug, "abc-123");
        assert_eq!(video.summary, None);
        assert_eq!(video.director, None);
        assert_eq!(video.m3u8_path.as_deref(), Some("/hls/abc/index.m3u8"));
        assert_eq!(video.actors[0].name, "山田花子");
        assert_eq!(video.tags[0].id, 11);
        assert_eq!(video.category.as_ref().map(|c| c.id), Some(1));
        assert_eq!(video.screenshots[0].id, "1");
        assert_eq!(video.view_count, 41);
        assert!(video.created_at.is_some());
    }

    #[test]
    fn test_listing_video_with_selected_fields() {
        let body = json!({
            "id": 9,
            "attributes": { "originalname": "Only title", "aka": "x-9", "duration": "45分钟" }
        });

        let video = VideoRecord::from(serde_json::from_value::<Entry<VideoAttributes>>(body).unwrap());
        assert!(video.actors.is_empty());
        assert!(video.tags.is_empty());
        assert_eq!(video.category, None);
        assert_eq!(video.view_count, 0);
    }

    #[test]
    fn test_video_without_title_is_rejected() {
        let body = json!({ "id": 9, "attributes": { "aka": "x-9" } });
        assert!(serde_json::from_value::<Entry<VideoAttributes>>(body).is_err());
    }

    #[test]
    fn test_website_decoding_accepts_numeric_signing_fields() {
        let body = json!({
            "id": 1,
            "attributes": {
                "name": "Example",
                "imageURL": "https://img.example.com",
                "videoURL": "https://cdn.example.com",
                "efvtoken": "fragment",
                "counts": 3,
                "currentTimestamp": "7200000",
                "categories": { "data": [{ "id": 1, "attributes": { "name": "Movies" } }] },
                "seo": {
                    "canonicalURL": "https://example.com/",
                    "metaTitle": "Example",
                    "metaRobots": { "index": true, "follow": false, "nocache": true },
                    "metaSocial": [{ "socialNetwork": "Twitter", "title": "t", "description": "d" }]
                },
                "links": { "data": [
                    { "id": 2, "attributes": { "order": 2, "name": "B", "url": "/b" } },
                    { "id": 1, "attributes": { "order": 1, "name": "A", "url": "/a", "target": true } }
                ] }
            }
        });

        let site = WebsiteConfig::from(serde_json::from_value::<Entry<WebsiteAttributes>>(body).unwrap());
        assert_eq!(site.play_count_ceiling.as_deref(), Some("3"));
        assert_eq!(site.timestamp_offset_ms.as_deref(), Some("7200000"));
        assert_eq!(site.seo.canonical_url, "https://example.com");
        assert_eq!(site.seo.robots.map(|r| r.directive()).as_deref(), Some("index, nofollow, noarchive"));
        assert_eq!(site.category_ids(), vec![1]);
        assert_eq!(site.links[0].name, "A");
        assert!(site.links[0].new_tab);
    }

    #[test]
    fn test_decode_reports_endpoint() {
        let err = decode::<Envelope<Vec<Entry<VideoAttributes>>>>("/videos", json!({ "data": 3 }))
            .unwrap_err();
        match err {
            CatalogError::MalformedResponse { endpoint, .. } => assert_eq!(endpoint, "/videos"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_tag_video_ids() {
        let body = json!({
            "id": 4,
            "attributes": { "name": "A", "videos": { "data": [{ "id": 1 }, { "id": "2" }] } }
        });
        let tag: Entry<TagAttributes> = serde_json::from_value(body).unwrap();
        assert_eq!(tag.attributes.video_ids().collect::<Vec<_>>(), vec![1, 2]);
    }
}

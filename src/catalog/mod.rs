//! Content aggregation over the backend
//!
//! [`CatalogService`] is the only place that knows how domain requests translate into backend
//! queries. It resolves identity lookups, paged listings per dimension, the related-content
//! sample for a video, the home page sections and the view counter.

mod dimension;

pub use dimension::{Dimension, Listing, ListingKind, ListingRequest, VideoPage};

use crate::backend::wire::{
    self, CategoryAttributes, CountAttributes, Entry, Envelope, NameAttributes, TagAttributes,
    VideoAttributes, WebsiteAttributes,
};
use crate::backend::{ContentBackend, StrapiQuery};
use crate::config::Config;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, SecondsFormat, Utc};
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vodcat_core::related::select_candidates;
use vodcat_core::{
    ActorRef, CatalogError, CategoryRef, EntityKind, PageRequest, RelatedVideoSet, Result,
    TagRef, VideoRecord, WebsiteConfig,
};

/// Shown when the site has no announcement
pub const DEFAULT_ANNOUNCEMENT: &str = "暂无公告";

const LISTING_FIELDS: &[&str] = &["originalname", "duration", "aka"];
const RELATED_FIELDS: &[&str] = &["originalname", "duration", "aka", "createdAt", "summary"];
const POSTER_FIELDS: &[&str] = &["url", "width", "height"];

/// Settings the aggregator needs from [`Config`]
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub website_id: u64,
    pub website_cache_ttl: Duration,
    pub popular_fallback_days: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            website_id: 1,
            website_cache_ttl: Duration::ZERO,
            popular_fallback_days: 30,
        }
    }
}

impl From<&Config> for CatalogSettings {
    fn from(config: &Config) -> Self {
        Self {
            website_id: config.backend.website_id,
            website_cache_ttl: config.backend.website_cache_ttl(),
            popular_fallback_days: config.render.popular_fallback_days,
        }
    }
}

struct CachedWebsite {
    fetched_at: Instant,
    config: Arc<WebsiteConfig>,
}

pub struct CatalogService {
    backend: Arc<dyn ContentBackend>,
    settings: CatalogSettings,
    website_cache: RwLock<Option<CachedWebsite>>,
}

impl CatalogService {
    pub fn new(backend: Arc<dyn ContentBackend>, settings: CatalogSettings) -> Self {
        Self {
            backend,
            settings,
            website_cache: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &StrapiQuery,
    ) -> Result<T> {
        let body = self.backend.get(endpoint, query).await?;
        wire::decode(endpoint, body)
    }

    /// Fetch a list endpoint, returning the entries and the reported total
    async fn fetch_page<A: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &StrapiQuery,
    ) -> Result<(Vec<Entry<A>>, Option<u64>)> {
        let envelope: Envelope<Vec<Entry<A>>> = self.fetch(endpoint, query).await?;
        let total = envelope.pagination().map(|p| p.total);
        Ok((envelope.data, total))
    }

    async fn fetch_videos_query(&self, query: &StrapiQuery) -> Result<Vec<VideoRecord>> {
        let (entries, _) = self.fetch_page::<VideoAttributes>("/videos", query).await?;
        Ok(entries.into_iter().map(VideoRecord::from).collect())
    }

    /// The site's configuration, served from cache while fresh
    pub async fn website_config(&self) -> Result<Arc<WebsiteConfig>> {
        let ttl = self.settings.website_cache_ttl;
        if !ttl.is_zero() {
            let cache = self.website_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < ttl {
                    return Ok(Arc::clone(&cached.config));
                }
            }
        }

        let endpoint = format!("/websites/{}", self.settings.website_id);
        let query = StrapiQuery::new()
            .fields(&[
                "name",
                "imageURL",
                "videoURL",
                "efvtoken",
                "counts",
                "currentTimestamp",
                "Twitter",
                "announcement",
            ])
            .populate_fields("categories", &["id", "name"])
            .populate_nested("seo", &["metaSocial", "metaRobots"])
            .populate_fields("links", &["order", "name", "url", "target"]);

        let envelope: Envelope<Option<Entry<WebsiteAttributes>>> =
            self.fetch(&endpoint, &query).await?;
        let entry = envelope.data.ok_or_else(|| {
            CatalogError::not_found(EntityKind::Website, self.settings.website_id.to_string())
        })?;
        let config = Arc::new(WebsiteConfig::from(entry));
        debug!(
            "Fetched website config {:?} with {} categories",
            config.name,
            config.categories.len()
        );

        if !ttl.is_zero() {
            *self.website_cache.write().await = Some(CachedWebsite {
                fetched_at: Instant::now(),
                config: Arc::clone(&config),
            });
        }

        Ok(config)
    }

    /// Drop the cached website configuration
    pub async fn invalidate_website_config(&self) {
        self.website_cache.write().await.take();
    }

    pub async fn find_category(&self, slug: &str) -> Result<CategoryRef> {
        let query = StrapiQuery::new().filter_eq(&["slug"], slug);
        let (entries, _) = self
            .fetch_page::<CategoryAttributes>("/categories", &query)
            .await?;
        entries
            .into_iter()
            .next()
            .map(CategoryRef::from)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Category, slug))
    }

    pub async fn find_actor(&self, name: &str) -> Result<ActorRef> {
        let query = StrapiQuery::new().filter_eq(&["name"], name);
        let (entries, _) = self.fetch_page::<NameAttributes>("/actors", &query).await?;
        entries
            .into_iter()
            .next()
            .map(ActorRef::from)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Actor, name))
    }

    pub async fn find_tag(&self, name: &str) -> Result<TagRef> {
        let query = StrapiQuery::new().filter_eq(&["name"], name);
        let (entries, _) = self.fetch_page::<TagAttributes>("/tags", &query).await?;
        entries
            .into_iter()
            .next()
            .map(TagRef::from)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Tag, name))
    }

    /// A video by slug, with every relation populated
    pub async fn find_video(&self, slug: &str) -> Result<VideoRecord> {
        let query = StrapiQuery::new().filter_eq(&["aka"], slug).populate_all();
        self.fetch_videos_query(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(EntityKind::Video, slug))
    }

    /// One page of videos matching `dimension`
    pub async fn fetch_videos(
        &self,
        dimension: &Dimension,
        page: PageRequest,
    ) -> Result<VideoPage> {
        if let Dimension::Search { category_ids, .. } = dimension {
            if category_ids.is_empty() {
                debug!("Search skipped: site has no permitted categories");
                return Ok(VideoPage::empty(page));
            }
        }

        let query = listing_query(dimension.apply(StrapiQuery::new()).page(page));
        let (entries, total) = self.fetch_page::<VideoAttributes>("/videos", &query).await?;
        let total = total.ok_or_else(|| CatalogError::MalformedResponse {
            endpoint: "/videos".to_string(),
            reason: "listing response has no pagination meta".to_string(),
        })?;

        let videos: Vec<VideoRecord> = entries.into_iter().map(VideoRecord::from).collect();
        debug!(
            "{} page {}: {} videos of {}",
            dimension.kind(),
            page.page(),
            videos.len(),
            total
        );
        Ok(VideoPage::new(videos, page, total))
    }

    /// Resolve a route key to its dimension and fetch the requested page
    ///
    /// Category, actor and tag keys must name an existing entity. Director and studio have no
    /// table of their own, so they are missing when no video at all carries the name. A page
    /// past the end of an existing listing is empty, not missing.
    pub async fn listing(&self, request: &ListingRequest) -> Result<Listing> {
        let key = request.key.trim();
        if key.is_empty() {
            return Err(CatalogError::InvalidRequest(format!(
                "empty {} key",
                request.kind
            )));
        }

        let (dimension, name) = match request.kind {
            ListingKind::Category => {
                let category = self.find_category(key).await?;
                (Dimension::Category(category.id), category.name)
            }
            ListingKind::Actor => {
                let actor = self.find_actor(key).await?;
                (Dimension::Actor(actor.id), actor.name)
            }
            ListingKind::Tag => {
                let tag = self.find_tag(key).await?;
                (Dimension::Tag(tag.id), tag.name)
            }
            ListingKind::Director => (Dimension::Director(key.to_string()), key.to_string()),
            ListingKind::Studio => (Dimension::Studio(key.to_string()), key.to_string()),
            ListingKind::Search => {
                let website = self.website_config().await?;
                let dimension = Dimension::Search {
                    term: key.to_string(),
                    category_ids: website.category_ids(),
                };
                (dimension, key.to_string())
            }
        };

        let videos = self.fetch_videos(&dimension, request.page).await?;

        if videos.total == 0 {
            if let Some(kind @ (EntityKind::Director | EntityKind::Studio)) =
                request.kind.entity_kind()
            {
                return Err(CatalogError::not_found(kind, key));
            }
        }

        Ok(Listing {
            kind: request.kind,
            key: key.to_string(),
            name,
            videos,
        })
    }

    /// Related/recommended sample for `video` using the thread-local RNG
    pub async fn related_videos(&self, video: &VideoRecord) -> Result<RelatedVideoSet> {
        let pool = self.related_candidates(video).await?;
        let ids = select_candidates(video.id, pool, &mut rand::thread_rng());
        self.related_from_ids(video.id, &ids).await
    }

    /// Same as [`related_videos`](Self::related_videos) with a caller-supplied RNG
    pub async fn related_videos_with_rng<R>(
        &self,
        video: &VideoRecord,
        rng: &mut R,
    ) -> Result<RelatedVideoSet>
    where
        R: Rng + ?Sized,
    {
        let pool = self.related_candidates(video).await?;
        let ids = select_candidates(video.id, pool, rng);
        self.related_from_ids(video.id, &ids).await
    }

    /// Ids of every video linked to any of the video's tags, one batched tag query
    async fn related_candidates(&self, video: &VideoRecord) -> Result<Vec<u64>> {
        let names = video.tag_names();
        if names.is_empty() {
            debug!("Video {} has no tags, no related candidates", video.id);
            return Ok(Vec::new());
        }

        let query = StrapiQuery::new()
            .filter_in(&["name"], names.as_slice())
            .populate_fields("videos", &["id"]);
        let (tags, _) = self.fetch_page::<TagAttributes>("/tags", &query).await?;

        Ok(tags
            .iter()
            .flat_map(|tag| tag.attributes.video_ids())
            .collect())
    }

    async fn related_from_ids(&self, focal_id: u64, ids: &[u64]) -> Result<RelatedVideoSet> {
        if ids.is_empty() {
            return Ok(RelatedVideoSet::default());
        }

        let query = StrapiQuery::new()
            .filter_in(&["id"], ids)
            .sort("createdAt:desc")
            .fields(RELATED_FIELDS)
            .populate_fields("poster2", POSTER_FIELDS)
            .limit(ids.len() as u32);

        let videos = self.fetch_videos_query(&query).await?;
        Ok(RelatedVideoSet::split(focal_id, videos))
    }

    /// First `limit` videos carrying the tag named `name`
    pub async fn videos_by_tag(&self, name: &str, limit: u32) -> Result<Vec<VideoRecord>> {
        let query = listing_query(
            StrapiQuery::new()
                .filter_eq(&["tags", "name"], name)
                .limit(limit),
        );
        self.fetch_videos_query(&query).await
    }

    /// Newest videos in a category
    pub async fn latest_videos(&self, category_id: u64, limit: u32) -> Result<Vec<VideoRecord>> {
        let query = listing_query(
            StrapiQuery::new()
                .sort("createdAt:desc")
                .filter_eq(&["category", "id"], category_id)
                .limit(limit),
        );
        self.fetch_videos_query(&query).await
    }

    /// Most viewed videos created since `since`, within the permitted categories
    pub async fn popular_videos(
        &self,
        since: DateTime<Utc>,
        limit: u32,
        category_ids: &[u64],
    ) -> Result<Vec<VideoRecord>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = listing_query(
            StrapiQuery::new()
                .sort("count:desc")
                .filter(
                    &["createdAt"],
                    "$gte",
                    since.to_rfc3339_opts(SecondsFormat::Millis, true),
                )
                .filter_in(&["category", "id"], category_ids)
                .limit(limit),
        );
        self.fetch_videos_query(&query).await
    }

    /// This week's most viewed videos, or the last N days' when the week has none yet
    pub async fn popular_recent(
        &self,
        now: DateTime<Utc>,
        limit: u32,
        category_ids: &[u64],
    ) -> Result<Vec<VideoRecord>> {
        let videos = self
            .popular_videos(start_of_week(now), limit, category_ids)
            .await?;
        if !videos.is_empty() {
            return Ok(videos);
        }

        let since = now - ChronoDuration::days(i64::from(self.settings.popular_fallback_days));
        debug!("No popular videos this week, falling back to {}", since);
        self.popular_videos(since, limit, category_ids).await
    }

    /// Read the video's view count and store it incremented by one
    pub async fn increment_view_count(&self, video_id: u64) -> Result<u64> {
        let endpoint = format!("/videos/{}", video_id);
        let current: Envelope<Option<Entry<CountAttributes>>> =
            self.fetch(&endpoint, &StrapiQuery::new()).await?;
        let current = current
            .data
            .ok_or_else(|| CatalogError::not_found(EntityKind::Video, video_id.to_string()))?
            .attributes
            .count
            .unwrap_or(0);

        let next = current.saturating_add(1);
        let body = self
            .backend
            .put(&endpoint, &json!({ "data": { "count": next } }))
            .await?;
        let updated: Envelope<Entry<CountAttributes>> = wire::decode(&endpoint, body)?;

        Ok(updated.data.attributes.count.unwrap_or(next))
    }

    /// Record a playback start without waiting for the result
    pub fn spawn_record_play(self: &Arc<Self>, video_id: u64) -> JoinHandle<()> {
        let catalog = Arc::clone(self);
        tokio::spawn(async move {
            match catalog.increment_view_count(video_id).await {
                Ok(count) => info!("Video {} view count is now {}", video_id, count),
                Err(e) => warn!("Failed to record play for video {}: {}", video_id, e),
            }
        })
    }

    pub async fn announcement(&self) -> Result<String> {
        let website = self.website_config().await?;
        Ok(website
            .announcement
            .clone()
            .unwrap_or_else(|| DEFAULT_ANNOUNCEMENT.to_string()))
    }
}

/// Field selection shared by every video card listing
fn listing_query(query: StrapiQuery) -> StrapiQuery {
    query
        .fields(LISTING_FIELDS)
        .populate_fields("poster2", POSTER_FIELDS)
        .populate_fields("category", &["name"])
}

/// Midnight UTC of the most recent Sunday
pub fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days = i64::from(now.weekday().num_days_from_sunday());
    (now.date_naive() - ChronoDuration::days(days))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

//! Page composition
//!
//! A [`PageComposer`] turns one inbound page request into a single render payload. Independent
//! fetches run concurrently; the whole render runs under one aggregate timeout, and any failed
//! fetch fails the render rather than producing a partial page.

mod route;

pub use route::PageRoute;

use crate::catalog::{CatalogService, ListingKind, ListingRequest};
use crate::config::Config;
use crate::seo::{
    collection_json_ld, listing_metadata, movie_json_ld, site_metadata, video_metadata,
    CollectionJsonLd, MovieJsonLd, PageMetadata,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vodcat_core::{
    CatalogError, Clock, FooterLink, NavCategory, PageRequest, Result, SigningScheme,
    SystemClock, TokenSigner, VideoRecord, WebsiteConfig,
};

const LATEST_SECTION_TITLE: &str = "最新发布视频";
const POPULAR_SECTION_TITLE: &str = "最受欢迎视频";

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub page_size: u32,
    pub timeout: Duration,
    pub featured_tags: Vec<String>,
    pub featured_tag_size: u32,
    pub latest_category_id: u64,
    pub latest_size: u32,
    pub popular_size: u32,
    pub signing_scheme: SigningScheme,
}

impl From<&Config> for RenderSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.render.page_size,
            timeout: config.render.timeout(),
            featured_tags: config.render.featured_tags.clone(),
            featured_tag_size: config.render.featured_tag_size,
            latest_category_id: config.render.latest_category_id,
            latest_size: config.render.latest_size,
            popular_size: config.render.popular_size,
            signing_scheme: config.signing.scheme,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// A video as shown in a grid, with absolute image URLs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub duration: Option<String>,
    pub poster_url: Option<String>,
    pub poster_width: Option<u32>,
    pub poster_height: Option<u32>,
    pub category: Option<String>,
}

impl VideoCard {
    pub fn from_record(video: &VideoRecord, site: &WebsiteConfig) -> Self {
        Self {
            id: video.id,
            slug: video.slug.clone(),
            title: video.title.clone(),
            duration: video.duration.clone(),
            poster_url: video.poster2_url().map(|p| site.image(p)),
            poster_width: video.poster2.as_ref().and_then(|p| p.width),
            poster_height: video.poster2.as_ref().and_then(|p| p.height),
            category: video.category.as_ref().map(|c| c.name.clone()),
        }
    }
}

fn cards(videos: &[VideoRecord], site: &WebsiteConfig) -> Vec<VideoCard> {
    videos
        .iter()
        .map(|video| VideoCard::from_record(video, site))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPagePayload {
    pub site_name: String,
    pub video: VideoRecord,

    /// Video CDN base + signed manifest path; absent when the video has no manifest
    pub playback_url: Option<String>,

    pub poster_url: Option<String>,
    pub screenshots: Vec<String>,
    pub related: Vec<VideoCard>,
    pub recommended: Vec<VideoCard>,
    pub json_ld: MovieJsonLd,
    pub metadata: PageMetadata,
}

/// Links for the listing's pager
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationLinks {
    pub base_path: String,
    pub slug: String,
    pub current: u32,
    pub total_pages: u32,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl PaginationLinks {
    pub fn new(kind: ListingKind, key: &str, current: u32, total_pages: u32) -> Self {
        let base_path = kind.base_path();
        let slug = urlencoding::encode(key).into_owned();
        let link = |page: u32| format!("{}/{}/{}", base_path, slug, page);

        let previous = (current > 1).then(|| link((current - 1).min(total_pages.max(1))));
        let next = (current < total_pages).then(|| link(current + 1));

        Self {
            previous,
            next,
            base_path,
            slug,
            current,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPagePayload {
    pub site_name: String,
    pub kind: ListingKind,
    pub key: String,
    pub name: String,
    pub page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub videos: Vec<VideoCard>,

    /// Nothing on this page; rendered as an empty state, not a 404
    pub empty: bool,

    pub pagination: PaginationLinks,
    pub json_ld: CollectionJsonLd,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSection {
    pub title: String,
    pub videos: Vec<VideoCard>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePagePayload {
    pub site_name: String,
    pub announcement: Option<String>,
    pub navigation: Vec<NavCategory>,
    pub links: Vec<FooterLink>,
    pub sections: Vec<HomeSection>,
    pub metadata: PageMetadata,
}

pub struct PageComposer {
    catalog: Arc<CatalogService>,
    settings: RenderSettings,
    clock: Arc<dyn Clock>,
}

impl PageComposer {
    pub fn new(catalog: Arc<CatalogService>, settings: RenderSettings) -> Self {
        Self {
            catalog,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for signing and the popular-videos window
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.catalog
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    async fn bounded<T, F>(&self, page: &str, render: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.settings.timeout;
        match tokio::time::timeout(timeout, render).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Render of {} timed out after {:?}", page, timeout);
                Err(CatalogError::Timeout(timeout))
            }
        }
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.now_millis()).unwrap_or_else(Utc::now)
    }

    pub async fn video_page(&self, slug: &str) -> Result<VideoPagePayload> {
        self.bounded(&format!("video {}", slug), self.compose_video(slug))
            .await
    }

    async fn compose_video(&self, slug: &str) -> Result<VideoPagePayload> {
        let (site, video) = tokio::try_join!(
            self.catalog.website_config(),
            self.catalog.find_video(slug)
        )?;

        let signer =
            TokenSigner::from_website(&site)?.with_scheme(self.settings.signing_scheme);
        let playback_url = match video.m3u8_path.as_deref() {
            Some(path) => {
                let signed = signer.sign(path, self.clock.as_ref())?;
                Some(format!("{}{}", site.video_url, signed))
            }
            None => {
                warn!("Video {} has no playback manifest", video.slug);
                None
            }
        };

        let related = self.catalog.related_videos(&video).await?;
        debug!(
            "Video {}: {} related, {} recommended",
            video.slug,
            related.related.len(),
            related.recommended.len()
        );

        Ok(VideoPagePayload {
            site_name: site.name.clone(),
            playback_url,
            poster_url: video.poster2_url().map(|p| site.image(p)),
            screenshots: video
                .screenshots
                .iter()
                .map(|s| site.image(&s.url))
                .collect(),
            related: cards(&related.related, &site),
            recommended: cards(&related.recommended, &site),
            json_ld: movie_json_ld(&video, &site),
            metadata: video_metadata(&video, &site),
            video,
        })
    }

    pub async fn listing_page(
        &self,
        kind: ListingKind,
        route: &PageRoute,
    ) -> Result<ListingPagePayload> {
        self.bounded(
            &format!("{} {}/{}", kind, route.slug, route.page),
            self.compose_listing(kind, route),
        )
        .await
    }

    async fn compose_listing(
        &self,
        kind: ListingKind,
        route: &PageRoute,
    ) -> Result<ListingPagePayload> {
        let page = PageRequest::new(route.page, self.settings.page_size)?;
        let request = ListingRequest::new(kind, route.slug.clone(), page);

        let (site, listing) = tokio::try_join!(
            self.catalog.website_config(),
            self.catalog.listing(&request)
        )?;

        let metadata = listing_metadata(kind, &listing.key, &listing.name, page.page(), &site);
        let json_ld = collection_json_ld(
            &listing,
            &site,
            &metadata.title,
            &metadata.description,
            &metadata.canonical,
        );
        let pagination = PaginationLinks::new(
            kind,
            &listing.key,
            page.page(),
            listing.videos.total_pages,
        );

        Ok(ListingPagePayload {
            site_name: site.name.clone(),
            kind,
            page: page.page(),
            total: listing.videos.total,
            total_pages: listing.videos.total_pages,
            videos: cards(&listing.videos.videos, &site),
            empty: listing.videos.is_empty(),
            pagination,
            json_ld,
            metadata,
            key: listing.key,
            name: listing.name,
        })
    }

    pub async fn home_page(&self) -> Result<HomePagePayload> {
        self.bounded("home", self.compose_home()).await
    }

    async fn compose_home(&self) -> Result<HomePagePayload> {
        let site = self.catalog.website_config().await?;
        let category_ids = site.category_ids();
        let now = self.now();

        let site_ref: &WebsiteConfig = &site;
        let featured = try_join_all(self.settings.featured_tags.iter().map(|tag| async move {
            let videos = self
                .catalog
                .videos_by_tag(tag, self.settings.featured_tag_size)
                .await?;
            Ok::<_, CatalogError>(HomeSection {
                title: tag.clone(),
                videos: cards(&videos, site_ref),
            })
        }));
        let latest = self
            .catalog
            .latest_videos(self.settings.latest_category_id, self.settings.latest_size);
        let popular = self
            .catalog
            .popular_recent(now, self.settings.popular_size, &category_ids);

        let (mut sections, latest, popular) = tokio::try_join!(featured, latest, popular)?;
        sections.push(HomeSection {
            title: LATEST_SECTION_TITLE.to_string(),
            videos: cards(&latest, &site),
        });
        sections.push(HomeSection {
            title: POPULAR_SECTION_TITLE.to_string(),
            videos: cards(&popular, &site),
        });

        Ok(HomePagePayload {
            site_name: site.name.clone(),
            announcement: site.announcement.clone(),
            navigation: site.categories.clone(),
            links: site.links.clone(),
            sections,
            metadata: site_metadata(&site),
        })
    }
}

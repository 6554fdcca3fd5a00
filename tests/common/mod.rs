//! In-memory content backend and fixture builders shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vodcat::backend::{ContentBackend, StrapiQuery};
use vodcat::{CatalogService, CatalogSettings, PageComposer, RenderSettings};
use vodcat_core::{CatalogError, FixedClock, Result};

pub const NOW_MS: i64 = 1_700_000_000_000;

type Responder = Box<dyn Fn(&StrapiQuery) -> Option<Result<Value>> + Send + Sync>;
type PutResponder = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Backend answering from registered handlers; the first handler for an endpoint that returns
/// `Some` wins, anything unhandled is a 404
#[derive(Default)]
pub struct FakeBackend {
    handlers: Mutex<Vec<(String, Responder)>>,
    put_handlers: Mutex<Vec<(String, PutResponder)>>,
    gets: Mutex<Vec<(String, StrapiQuery)>>,
    puts: Mutex<Vec<(String, Value)>>,
    delay: Option<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn on<F>(self, endpoint: &str, respond: F) -> Self
    where
        F: Fn(&StrapiQuery) -> Option<Value> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .push((endpoint.to_string(), Box::new(move |q| respond(q).map(Ok))));
        self
    }

    /// Always answer `endpoint` with `body`
    pub fn always(self, endpoint: &str, body: Value) -> Self {
        self.on(endpoint, move |_| Some(body.clone()))
    }

    pub fn failing(self, endpoint: &str) -> Self {
        let url = format!("http://fake{}", endpoint);
        self.handlers.lock().unwrap().push((
            endpoint.to_string(),
            Box::new(move |_| {
                Some(Err(CatalogError::BackendUnavailable {
                    url: url.clone(),
                    status: Some(500),
                    reason: "HTTP 500 Internal Server Error".to_string(),
                }))
            }),
        ));
        self
    }

    pub fn on_put<F>(self, endpoint: &str, respond: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.put_handlers
            .lock()
            .unwrap()
            .push((endpoint.to_string(), Box::new(move |body| Ok(respond(body)))));
        self
    }

    /// Recorded GET calls to `endpoint`
    pub fn gets_to(&self, endpoint: &str) -> Vec<StrapiQuery> {
        self.gets
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, q)| q.clone())
            .collect()
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    pub fn puts(&self) -> Vec<(String, Value)> {
        self.puts.lock().unwrap().clone()
    }
}

fn not_found(endpoint: &str) -> CatalogError {
    CatalogError::BackendUnavailable {
        url: format!("http://fake{}", endpoint),
        status: Some(404),
        reason: "HTTP 404 Not Found".to_string(),
    }
}

#[async_trait]
impl ContentBackend for FakeBackend {
    async fn get(&self, endpoint: &str, query: &StrapiQuery) -> Result<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.gets
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.clone()));

        let handlers = self.handlers.lock().unwrap();
        handlers
            .iter()
            .filter(|(e, _)| e == endpoint)
            .find_map(|(_, respond)| respond(query))
            .unwrap_or_else(|| Err(not_found(endpoint)))
    }

    async fn put(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.puts
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.clone()));

        let handlers = self.put_handlers.lock().unwrap();
        match handlers.iter().find(|(e, _)| e == endpoint) {
            Some((_, respond)) => respond(body),
            None => Err(not_found(endpoint)),
        }
    }
}

pub fn catalog(backend: Arc<FakeBackend>) -> Arc<CatalogService> {
    Arc::new(CatalogService::new(backend, CatalogSettings::default()))
}

pub fn composer(backend: Arc<FakeBackend>) -> PageComposer {
    PageComposer::new(catalog(backend), RenderSettings::default())
        .with_clock(Arc::new(FixedClock(NOW_MS)))
}

/// `{ data: [...], meta: { pagination } }` as the backend reports it
pub fn list_envelope(entries: Vec<Value>, page: u32, page_size: u32, total: u64) -> Value {
    // Deliberately floor the page count: callers must recompute it
    let page_count = total / u64::from(page_size);
    json!({
        "data": entries,
        "meta": {
            "pagination": {
                "page": page,
                "pageSize": page_size,
                "pageCount": page_count,
                "total": total
            }
        }
    })
}

pub fn named_entry(id: u64, name: &str) -> Value {
    json!({ "id": id, "attributes": { "name": name } })
}

pub fn card_entry(id: u64) -> Value {
    json!({
        "id": id,
        "attributes": {
            "originalname": format!("Video {}", id),
            "aka": format!("v-{}", id),
            "duration": "45分钟",
            "poster2": { "url": format!("/p2/{}.jpg", id), "width": 800, "height": 538 },
            "createdAt": "2024-05-01T10:00:00.000Z"
        }
    })
}

pub fn full_video_entry(id: u64, slug: &str, tags: &[(u64, &str)]) -> Value {
    let tags: Vec<Value> = tags.iter().map(|(id, name)| named_entry(*id, name)).collect();
    json!({
        "id": id,
        "attributes": {
            "originalname": "Focal video",
            "aka": slug,
            "summary": "A summary",
            "duration": "125分钟",
            "poster": "/p/focal.jpg",
            "poster2": { "url": "/p2/focal.jpg", "width": 800, "height": 538 },
            "m3u8paths": { "path": "/hls/focal/index.m3u8" },
            "actors": { "data": [named_entry(3, "山田花子")] },
            "tags": { "data": tags },
            "category": { "data": { "id": 1, "attributes": { "name": "Movies", "slug": "movies" } } },
            "screenshots": [{ "id": 1, "url": "/s/1.jpg" }],
            "count": 41,
            "createdAt": "2024-05-01T10:00:00.000Z"
        }
    })
}

pub fn website_body(category_ids: &[u64]) -> Value {
    let categories: Vec<Value> = category_ids
        .iter()
        .map(|id| named_entry(*id, &format!("Category {}", id)))
        .collect();
    json!({
        "data": {
            "id": 1,
            "attributes": {
                "name": "Example",
                "imageURL": "https://img.example.com",
                "videoURL": "https://cdn.example.com",
                "efvtoken": "s3cret",
                "counts": "3",
                "currentTimestamp": "600000",
                "Twitter": "example",
                "categories": { "data": categories },
                "seo": {
                    "canonicalURL": "https://example.com",
                    "metaTitle": "Example Videos",
                    "metaSocial": []
                }
            }
        }
    })
}

/// Video ids requested through `filters[id][$in]`
pub fn requested_ids(query: &StrapiQuery) -> Vec<u64> {
    query
        .values_with_prefix("filters[id][$in]")
        .into_iter()
        .filter_map(|v| v.parse().ok())
        .collect()
}

use super::StrapiQuery;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use vodcat_core::{CatalogError, Result};

/// Read/write access to the content backend
///
/// Implementations return the raw JSON body; shape validation happens in the caller so every
/// backend (HTTP or in-memory) is held to the same response contract.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn get(&self, endpoint: &str, query: &StrapiQuery) -> Result<Value>;
    async fn put(&self, endpoint: &str, body: &Value) -> Result<Value>;
}

/// HTTP client for a Strapi-style REST backend
#[derive(Debug, Clone)]
pub struct StrapiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl StrapiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            CatalogError::MalformedConfiguration(format!(
                "invalid backend URL {:?}: {}",
                base_url, e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CatalogError::MalformedConfiguration(format!("cannot build HTTP client: {}", e))
            })?;

        Ok(Self { base_url, client })
    }

    /// `{base}/{endpoint}?{query}`
    pub fn url_for(&self, endpoint: &str, query: &StrapiQuery) -> String {
        let mut url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.to_query_string());
        }
        url
    }

    async fn read_body(&self, url: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Backend request failed ({}): {}", status, url);
            return Err(CatalogError::BackendUnavailable {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {}: {}", status, text),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::MalformedResponse {
                endpoint: url.to_string(),
                reason: e.to_string(),
            })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> CatalogError {
    error!("Backend request failed: {} ({})", url, e);
    CatalogError::BackendUnavailable {
        url: url.to_string(),
        status: None,
        reason: e.to_string(),
    }
}

#[async_trait]
impl ContentBackend for StrapiClient {
    async fn get(&self, endpoint: &str, query: &StrapiQuery) -> Result<Value> {
        let url = self.url_for(endpoint, query);
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        self.read_body(&url, response).await
    }

    async fn put(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = self.url_for(endpoint, &StrapiQuery::new());
        debug!("Updating URL: {}", url);

        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        self.read_body(&url, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = StrapiClient::new("https://cms.example.com/api/", Duration::from_secs(5)).unwrap();
        let query = StrapiQuery::new().filter_eq(&["aka"], "abc-123");

        assert_eq!(
            client.url_for("/videos", &query),
            "https://cms.example.com/api/videos?filters[aka][$eq]=abc-123"
        );
        assert_eq!(
            client.url_for("websites/1", &StrapiQuery::new()),
            "https://cms.example.com/api/websites/1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = StrapiClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedConfiguration(_)));
    }
}

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vodcat_core::SigningScheme;

/// Configuration for the vodcat catalog service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content backend connection
    pub backend: BackendConfig,

    /// Page composition settings
    pub render: RenderConfig,

    /// Playback URL signing
    pub signing: SigningConfig,

    /// HTTP API listener
    pub server: ServerConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the REST API, e.g. `https://cms.example.com/api`
    pub url: String,

    /// Record id of this deployment's website entry
    pub website_id: u64,

    /// Per-request HTTP timeout (seconds)
    pub timeout_seconds: u64,

    /// How long a fetched website configuration is reused (seconds, 0 = always refetch)
    pub website_cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Videos per listing page
    pub page_size: u32,

    /// Aggregate timeout across all fetches of one page (seconds)
    pub timeout_seconds: u64,

    /// Tag names shown as home page sections
    pub featured_tags: Vec<String>,

    pub featured_tag_size: u32,

    /// Category whose newest videos fill the "latest" home section
    pub latest_category_id: u64,

    pub latest_size: u32,
    pub popular_size: u32,

    /// Popular window used when the current week has no videos yet (days)
    pub popular_fallback_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// `md5` for the legacy CDN contract, `hmac-sha256` otherwise
    pub scheme: SigningScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the vodcat crates (`debug`) or a full filter (`vodcat=debug,tower_http=info`),
    /// overridden by `RUST_LOG`
    pub level: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:1337/api".to_string(),
            website_id: 1,
            timeout_seconds: 10,
            website_cache_ttl_seconds: 300,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            timeout_seconds: 15,
            featured_tags: vec!["中出".to_string(), "巨乳".to_string()],
            featured_tag_size: 4,
            latest_category_id: 1,
            latest_size: 12,
            popular_size: 8,
            popular_fallback_days: 30,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Filter directives for this level
    pub fn directives(&self) -> String {
        log_directives(&self.level)
    }
}

/// A bare level applies to both vodcat crates; a value with `=` is a full directive string.
pub fn log_directives(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("vodcat={0},vodcat_core={0},warn", level)
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn website_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.website_cache_ttl_seconds)
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load configuration from the first config file that exists, falling back to the environment
    pub fn load() -> Result<Self> {
        let config_paths = [
            "vodcat.toml",
            "config/vodcat.toml",
            "/etc/vodcat/config.toml",
        ];

        match config_paths.iter().map(Path::new).find(|path| path.is_file()) {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Self::from_env()
            }
        }
    }

    /// Load configuration from an explicit file; environment overrides still apply
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_with(path, |name| std::env::var(name).ok())
    }

    /// Load configuration from a file with overrides taken from `lookup`
    pub fn load_from_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Cannot parse config file {}", path.display()))?;
        config.apply_overrides(lookup).with_context(|| {
            format!("Invalid environment override for config file {}", path.display())
        })?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `VODCAT_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("VODCAT_BACKEND_URL") {
            self.backend.url = url;
        }

        if let Some(id) = lookup("VODCAT_WEBSITE_ID") {
            self.backend.website_id = parse_var("VODCAT_WEBSITE_ID", &id)?;
        }

        if let Some(timeout) = lookup("VODCAT_HTTP_TIMEOUT") {
            self.backend.timeout_seconds = parse_var("VODCAT_HTTP_TIMEOUT", &timeout)?;
        }

        if let Some(timeout) = lookup("VODCAT_RENDER_TIMEOUT") {
            self.render.timeout_seconds = parse_var("VODCAT_RENDER_TIMEOUT", &timeout)?;
        }

        if let Some(port) = lookup("VODCAT_PORT") {
            self.server.port = parse_var("VODCAT_PORT", &port)?;
        }

        if let Some(level) = lookup("VODCAT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(scheme) = lookup("VODCAT_SIGNING_SCHEME") {
            self.signing.scheme = scheme
                .parse()
                .map_err(|e| anyhow!("VODCAT_SIGNING_SCHEME: {}", e))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend.url)
            .map_err(|e| anyhow!("Invalid backend URL {:?}: {}", self.backend.url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("Backend URL must be http or https"));
        }

        if self.backend.timeout_seconds == 0 {
            return Err(anyhow!("backend.timeout_seconds must be greater than 0"));
        }

        if self.render.timeout_seconds == 0 {
            return Err(anyhow!("render.timeout_seconds must be greater than 0"));
        }

        if self.render.page_size == 0 {
            return Err(anyhow!("render.page_size must be greater than 0"));
        }

        tracing_subscriber::EnvFilter::try_new(self.logging.directives())
            .map_err(|e| anyhow!("Invalid logging.level {:?}: {}", self.logging.level, e))?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "vodcat Configuration:\n\
            - Backend: {} (website {})\n\
            - HTTP Timeout: {}s\n\
            - Website Cache TTL: {}s\n\
            - Page Size: {}\n\
            - Render Timeout: {}s\n\
            - Featured Tags: {}\n\
            - Signing Scheme: {:?}\n\
            - Listen: {}:{}",
            self.backend.url,
            self.backend.website_id,
            self.backend.timeout_seconds,
            self.backend.website_cache_ttl_seconds,
            self.render.page_size,
            self.render.timeout_seconds,
            self.render.featured_tags.join(", "),
            self.signing.scheme,
            self.server.host,
            self.server.port
        )
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("{}={:?} is invalid: {}", name, value, e))
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.url = url.into();
        self
    }

    pub fn with_website_id(mut self, id: u64) -> Self {
        self.config.backend.website_id = id;
        self
    }

    pub fn with_website_cache_ttl(mut self, seconds: u64) -> Self {
        self.config.backend.website_cache_ttl_seconds = seconds;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.config.render.page_size = page_size;
        self
    }

    pub fn with_render_timeout(mut self, seconds: u64) -> Self {
        self.config.render.timeout_seconds = seconds;
        self
    }

    pub fn with_featured_tags(mut self, tags: Vec<String>) -> Self {
        self.config.render.featured_tags = tags;
        self
    }

    pub fn with_signing_scheme(mut self, scheme: SigningScheme) -> Self {
        self.config.signing.scheme = scheme;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

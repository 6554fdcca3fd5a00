//! Anti-theft playback URL signing
//!
//! The CDN validates a playback request without server-side sessions by recomputing a digest
//! over the resource path, the play-count ceiling, the expiry timestamp and a shared secret.
//! The message layout and the MD5 digest are fixed by the CDN:
//!
//! ```text
//! message = {path}&counts={ceiling}&timestamp={expiry}{secret}
//! url     = {path}?counts={ceiling}&timestamp={expiry}&key={md5(message)}
//! ```

use crate::{CatalogError, Result, WebsiteConfig};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Digest used for the `key` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningScheme {
    /// MD5 over message + secret, required by the existing CDN
    #[default]
    Md5,
    /// HMAC-SHA256 keyed by the secret, for CDNs not bound to the legacy contract
    HmacSha256,
}

impl FromStr for SigningScheme {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "hmac-sha256" | "hmac_sha256" | "hmacsha256" => Ok(Self::HmacSha256),
            other => Err(CatalogError::MalformedConfiguration(format!(
                "unknown signing scheme: {}",
                other
            ))),
        }
    }
}

/// Signed playback URL, derived fresh per render and never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedPlaybackUrl {
    pub base_path: String,
    pub counts: u64,
    pub timestamp: i64,
    pub key: String,
}

impl fmt::Display for SignedPlaybackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}?counts={}&timestamp={}&key={}",
            self.base_path, self.counts, self.timestamp, self.key
        )
    }
}

/// Validated signing parameters
#[derive(Clone)]
pub struct TokenSigner {
    timestamp_offset_ms: i64,
    play_count_ceiling: u64,
    secret: String,
    scheme: SigningScheme,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("timestamp_offset_ms", &self.timestamp_offset_ms)
            .field("play_count_ceiling", &self.play_count_ceiling)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Parse the string-encoded offset and ceiling, rejecting anything non-numeric
    pub fn new(
        timestamp_offset_ms: &str,
        play_count_ceiling: &str,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let offset = timestamp_offset_ms.trim().parse::<i64>().map_err(|e| {
            CatalogError::MalformedConfiguration(format!(
                "timestamp offset {:?} is not an integer: {}",
                timestamp_offset_ms, e
            ))
        })?;
        let ceiling = play_count_ceiling.trim().parse::<u64>().map_err(|e| {
            CatalogError::MalformedConfiguration(format!(
                "play-count ceiling {:?} is not a non-negative integer: {}",
                play_count_ceiling, e
            ))
        })?;

        Ok(Self {
            timestamp_offset_ms: offset,
            play_count_ceiling: ceiling,
            secret: secret.into(),
            scheme: SigningScheme::Md5,
        })
    }

    /// Build a signer from the site's stored signing parameters
    pub fn from_website(website: &WebsiteConfig) -> Result<Self> {
        let offset = website.timestamp_offset_ms.as_deref().ok_or_else(|| {
            CatalogError::MalformedConfiguration("website has no timestamp offset".to_string())
        })?;
        let counts = website.play_count_ceiling.as_deref().ok_or_else(|| {
            CatalogError::MalformedConfiguration("website has no play-count ceiling".to_string())
        })?;
        let secret = website.token_secret.as_deref().ok_or_else(|| {
            CatalogError::MalformedConfiguration("website has no token secret".to_string())
        })?;

        Self::new(offset, counts, secret)
    }

    pub fn with_scheme(mut self, scheme: SigningScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sign `base_path` with an expiry of now + offset
    pub fn sign(&self, base_path: &str, clock: &dyn Clock) -> Result<SignedPlaybackUrl> {
        if base_path.is_empty() {
            return Err(CatalogError::InvalidRequest(
                "playback path is empty".to_string(),
            ));
        }

        let expiry = clock
            .now_millis()
            .checked_add(self.timestamp_offset_ms)
            .ok_or_else(|| {
                CatalogError::MalformedConfiguration(format!(
                    "timestamp offset {} overflows the expiry",
                    self.timestamp_offset_ms
                ))
            })?;

        let message = format!(
            "{}&counts={}&timestamp={}",
            base_path, self.play_count_ceiling, expiry
        );
        let key = self.digest(&message)?;

        Ok(SignedPlaybackUrl {
            base_path: base_path.to_string(),
            counts: self.play_count_ceiling,
            timestamp: expiry,
            key,
        })
    }

    fn digest(&self, message: &str) -> Result<String> {
        match self.scheme {
            SigningScheme::Md5 => {
                let hash = md5::compute(format!("{}{}", message, self.secret));
                Ok(format!("{:x}", hash))
            }
            SigningScheme::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|e| {
                    CatalogError::MalformedConfiguration(format!("invalid HMAC key: {}", e))
                })?;
                mac.update(message.as_bytes());
                Ok(hex::encode(mac.finalize().into_bytes()))
            }
        }
    }
}

//! Client configuration (API base URL, payload key).

use thiserror::Error;
use url::Url;

use crate::crypto::{DEFAULT_PAYLOAD_KEY, KEY_LEN};

pub const API_URL_ENV: &str = "BIZDESK_API_URL";
pub const PAYLOAD_KEY_ENV: &str = "BIZDESK_PAYLOAD_KEY";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("API base URL '{0}' cannot carry a path")]
    NotABaseUrl(String),

    #[error("payload key must be 32 bytes as hex: {0}")]
    InvalidPayloadKey(String),
}

#[derive(Clone)]
pub struct ClientConfig {
    /// Always ends with `/` so request paths join underneath it.
    pub base_url: Url,
    pub payload_key: [u8; KEY_LEN],
}

impl core::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("payload_key", &"<redacted>")
            .finish()
    }
}

impl ClientConfig {
    /// Explicit configuration with the built-in payload key.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            payload_key: DEFAULT_PAYLOAD_KEY,
        })
    }

    pub fn with_payload_key(mut self, key: [u8; KEY_LEN]) -> Self {
        self.payload_key = key;
        self
    }

    /// Read `BIZDESK_API_URL` and `BIZDESK_PAYLOAD_KEY`.
    ///
    /// Both are optional; a missing key falls back to the built-in one with a
    /// warning. A key that is present but malformed is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let config = Self::new(&api_url)?;

        match std::env::var(PAYLOAD_KEY_ENV) {
            Ok(raw) => Ok(config.with_payload_key(parse_payload_key(&raw)?)),
            Err(_) => {
                tracing::warn!("{PAYLOAD_KEY_ENV} not set; using built-in payload key");
                Ok(config)
            }
        }
    }
}

/// Parse a 64-character hex string into a payload key.
pub fn parse_payload_key(raw: &str) -> Result<[u8; KEY_LEN], ConfigError> {
    let bytes = hex::decode(raw.trim()).map_err(|e| ConfigError::InvalidPayloadKey(e.to_string()))?;
    <[u8; KEY_LEN]>::try_from(bytes.as_slice())
        .map_err(|_| ConfigError::InvalidPayloadKey(format!("got {} bytes", bytes.len())))
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABaseUrl(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

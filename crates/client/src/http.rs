//! Outbound HTTP gateway to the bizdesk REST backend.
//!
//! Every request goes through [`ApiClient`]: it resolves paths against the
//! configured base URL, sends JSON with cookies enabled, and attaches the
//! organization token from the key-value bridge when one is stored. Transport
//! and HTTP-status failures surface unchanged as [`ApiError::Transport`]; the
//! client never retries, caches or deduplicates.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::crypto::{DecryptError, EncryptedEnvelope, PayloadDecryptor};
use crate::storage::{KeyValueStore, StorageError, ORG_TOKEN_KEY};
use crate::stores::LoaderStore;

/// Request header carrying the organization token.
pub const ORG_TOKEN_HEADER: &str = "org-token";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request path '{path}': {source}")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },

    /// Network failure, non-2xx status, or client construction failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("response body is not the expected JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Decrypt(#[from] DecryptError),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn KeyValueStore>,
    decryptor: PayloadDecryptor,
    loader: Option<LoaderStore>,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("tracks_loading", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            storage,
            decryptor: PayloadDecryptor::new(config.payload_key),
            loader: None,
        })
    }

    /// Count every request as an in-flight operation on `loader`.
    pub fn track_loading(mut self, loader: LoaderStore) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` under the base URL (a leading `/` is ignored).
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidPath {
                path: path.to_string(),
                source,
            })
    }

    pub fn org_token(&self) -> Option<String> {
        match self.storage.get_item(ORG_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!("could not read org token, sending request without it: {err}");
                None
            }
        }
    }

    pub fn set_org_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set_item(ORG_TOKEN_KEY, token)
    }

    pub fn clear_org_token(&self) -> Result<(), StorageError> {
        self.storage.remove_item(ORG_TOKEN_KEY)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None::<&()>).await
    }

    /// GET an encrypted `{ data, iv }` envelope and decrypt it into `T`.
    pub async fn get_encrypted<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope: EncryptedEnvelope = self.get(path).await?;
        Ok(self.decryptor.decrypt_as(&envelope.data, &envelope.iv)?)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let _loading = self.loader.as_ref().map(LoaderStore::begin);

        tracing::debug!(%method, path, "sending request");

        let mut req = self.http.request(method, url);
        if let Some(token) = self.org_token() {
            match HeaderValue::from_str(&token) {
                Ok(value) => req = req.header(ORG_TOKEN_HEADER, value),
                Err(_) => tracing::warn!("stored org token is not a valid header value; omitting it"),
            }
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;

        // Empty bodies (204, bare DELETE) decode as JSON null.
        let raw: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        Ok(serde_json::from_slice(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(base).unwrap();
        ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn paths_join_under_base() {
        let api = client("https://api.example.test/v1");
        assert_eq!(
            api.url("/firms/1").unwrap().as_str(),
            "https://api.example.test/v1/firms/1"
        );
        assert_eq!(
            api.url("roles?scope=team").unwrap().as_str(),
            "https://api.example.test/v1/roles?scope=team"
        );
    }

    #[test]
    fn org_token_round_trip_through_storage() {
        let api = client("http://localhost:8080");
        assert!(api.org_token().is_none());

        api.set_org_token("org-123").unwrap();
        assert_eq!(api.org_token().as_deref(), Some("org-123"));

        api.clear_org_token().unwrap();
        assert!(api.org_token().is_none());
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let api = client("http://localhost:8080");
        api.set_org_token("").unwrap();
        assert!(api.org_token().is_none());
    }
}

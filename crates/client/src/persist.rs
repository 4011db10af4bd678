//! Persistence variant of the state container.
//!
//! A [`PersistedContainer`] hydrates from the key-value bridge on creation
//! and writes the full state back after every change. Neither direction is
//! allowed to fail the caller: unreadable or malformed stored data falls back
//! to the default value, and write failures leave the container running
//! purely in memory.

use std::ops::Deref;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::state::StateContainer;
use crate::storage::KeyValueStore;

/// How a state value is laid out in storage.
pub trait StateCodec<T>: Send + Sync {
    fn encode(&self, value: &T) -> anyhow::Result<String>;
    fn decode(&self, raw: &str) -> anyhow::Result<T>;
}

/// JSON `{"state": <value>, "version": <n>}` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvelopeCodec {
    pub version: u32,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, S> {
    state: &'a S,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope<S> {
    state: S,
    #[serde(default)]
    version: u32,
}

impl EnvelopeCodec {
    pub fn new(version: u32) -> Self {
        Self { version }
    }
}

impl<T> StateCodec<T> for EnvelopeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> anyhow::Result<String> {
        serde_json::to_string(&EnvelopeRef {
            state: value,
            version: self.version,
        })
        .context("failed to serialize state envelope")
    }

    fn decode(&self, raw: &str) -> anyhow::Result<T> {
        let envelope: Envelope<T> =
            serde_json::from_str(raw).context("failed to deserialize state envelope")?;
        if envelope.version != self.version {
            tracing::warn!(
                stored = envelope.version,
                expected = self.version,
                "stored state version differs; using it as-is"
            );
        }
        Ok(envelope.state)
    }
}

/// Stores a `String` value verbatim. A blank stored value does not decode,
/// so the container starts from its default instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlainStringCodec;

impl StateCodec<String> for PlainStringCodec {
    fn encode(&self, value: &String) -> anyhow::Result<String> {
        Ok(value.clone())
    }

    fn decode(&self, raw: &str) -> anyhow::Result<String> {
        anyhow::ensure!(!raw.trim().is_empty(), "stored string is blank");
        Ok(raw.to_string())
    }
}

/// A [`StateContainer`] that survives restarts through a [`KeyValueStore`].
///
/// Dereferences to the inner container, so reads, setters and subscriptions
/// are the same API. The storage writer is registered as the first
/// subscriber, so storage is current by the time other subscribers run.
pub struct PersistedContainer<T> {
    state: StateContainer<T>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl<T> PersistedContainer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new<C>(
        storage: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        codec: C,
        default: T,
    ) -> Self
    where
        C: StateCodec<T> + 'static,
    {
        let key = key.into();
        let initial = hydrate(storage.as_ref(), &key, &codec, default);
        let state = StateContainer::new(initial);

        let writer_storage = Arc::clone(&storage);
        let writer_key = key.clone();
        state.subscribe(move |value: &T| {
            persist(writer_storage.as_ref(), &writer_key, &codec, value);
        });

        Self {
            state,
            storage,
            key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying in-memory container.
    pub fn state(&self) -> &StateContainer<T> {
        &self.state
    }

    /// Drop the stored copy; the in-memory value is kept until the next change.
    pub fn clear_persisted(&self) {
        if let Err(err) = self.storage.remove_item(&self.key) {
            tracing::warn!(key = %self.key, "failed to remove persisted state: {err}");
        }
    }
}

impl<T> Deref for PersistedContainer<T> {
    type Target = StateContainer<T>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for PersistedContainer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PersistedContainer")
            .field("key", &self.key)
            .field("state", &self.state)
            .finish()
    }
}

fn hydrate<T, C>(storage: &dyn KeyValueStore, key: &str, codec: &C, default: T) -> T
where
    C: StateCodec<T>,
{
    match storage.get_item(key) {
        Ok(Some(raw)) => match codec.decode(&raw) {
            Ok(value) => {
                tracing::debug!(key, "hydrated state from storage");
                value
            }
            Err(err) => {
                tracing::warn!(key, "discarding malformed persisted state: {err:#}");
                default
            }
        },
        Ok(None) => default,
        Err(err) => {
            tracing::warn!(key, "storage unavailable during hydration: {err}");
            default
        }
    }
}

fn persist<T, C>(storage: &dyn KeyValueStore, key: &str, codec: &C, value: &T)
where
    C: StateCodec<T>,
{
    let raw = match codec.encode(value) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(key, "failed to encode state for storage: {err:#}");
            return;
        }
    };

    if let Err(err) = storage.set_item(key, &raw) {
        tracing::warn!(key, "failed to persist state, continuing in memory: {err}");
    }
}

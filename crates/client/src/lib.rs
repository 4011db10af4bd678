//! `bizdesk-client`
//!
//! **Responsibility:** client-held state and backend plumbing for the bizdesk
//! web application.
//!
//! This crate provides:
//! - a persistent key-value bridge (file-backed or in-memory)
//! - reactive state containers, plain and persisted
//! - the loader, role, firm and selected-module stores
//! - the HTTP gateway that propagates the organization token
//! - AES-256-CBC payload decryption
//!
//! Stores are owned instances handed to consumers; nothing here is a global.

pub mod config;
pub mod crypto;
pub mod http;
pub mod persist;
pub mod state;
pub mod storage;
pub mod stores;

pub use config::{ClientConfig, ConfigError};
pub use crypto::{DecryptError, EncryptedEnvelope, PayloadDecryptor, DEFAULT_PAYLOAD_KEY};
pub use http::{ApiClient, ApiError, ORG_TOKEN_HEADER};
pub use persist::{EnvelopeCodec, PersistedContainer, PlainStringCodec, StateCodec};
pub use state::{Merge, StateContainer, SubscriptionId};
pub use storage::{open_default_store, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use stores::{
    ClientState, FirmStore, LoaderState, LoaderStore, LoadingGuard, RoleStore,
    SelectedModuleStore,
};

pub use bizdesk_auth::{has_permission, Permission, RolePatch, RoleScope, RoleState};
pub use bizdesk_firms::{Firm, FirmId, FirmPatch, FirmStatus, FirmsState};

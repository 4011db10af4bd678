//! The client's state stores, each an owned container instance.
//!
//! [`ClientState`] bundles them over one shared key-value bridge so hosts can
//! hand a single context object to their UI layer.

pub mod firms;
pub mod loader;
pub mod roles;
pub mod selected_module;

use std::sync::Arc;

use crate::storage::KeyValueStore;

pub use firms::FirmStore;
pub use loader::{LoaderState, LoaderStore, LoadingGuard};
pub use roles::RoleStore;
pub use selected_module::{SelectedModuleStore, DEFAULT_MODULE};

/// All client-held state for one session.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub loader: LoaderStore,
    pub roles: RoleStore,
    pub firms: FirmStore,
    pub selected_module: SelectedModuleStore,
}

impl ClientState {
    /// Build every store, hydrating the persisted ones from `storage`.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            loader: LoaderStore::new(),
            roles: RoleStore::new(),
            firms: FirmStore::new(Arc::clone(&storage)),
            selected_module: SelectedModuleStore::new(storage),
        }
    }

    /// Sign-out reset: roles go back to defaults. Firms and the selected
    /// module are device-level preferences and are kept.
    pub fn sign_out(&self) {
        self.roles.clear();
        tracing::info!("client state reset after sign-out");
    }
}

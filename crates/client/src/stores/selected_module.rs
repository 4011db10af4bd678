//! Which top-level module (Home, HR, CRM, ...) the user last opened.

use std::sync::Arc;

use crate::persist::{PersistedContainer, PlainStringCodec};
use crate::state::SubscriptionId;
use crate::storage::{KeyValueStore, SELECTED_MODULE_KEY};

pub const DEFAULT_MODULE: &str = "Home";

/// Persisted as a bare string under `selectedModule`.
///
/// Hydrates as [`DEFAULT_MODULE`] when storage is unreadable or the stored
/// label is blank.
#[derive(Debug, Clone)]
pub struct SelectedModuleStore {
    state: Arc<PersistedContainer<String>>,
}

impl SelectedModuleStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = PersistedContainer::new(
            storage,
            SELECTED_MODULE_KEY,
            PlainStringCodec,
            DEFAULT_MODULE.to_string(),
        );
        Self {
            state: Arc::new(state),
        }
    }

    pub fn get(&self) -> String {
        self.state.get()
    }

    pub fn select(&self, module: impl Into<String>) -> bool {
        self.state.set(module.into())
    }

    pub fn subscribe(&self, listener: impl Fn(&String) + Send + Sync + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }
}

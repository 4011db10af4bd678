//! Global loading indicator.
//!
//! Tracks the number of in-flight operations instead of a single flag, so an
//! older operation finishing cannot clear the indicator while a newer one is
//! still running. Each operation holds a [`LoadingGuard`]; dropping the guard
//! marks it finished.

use crate::state::{StateContainer, SubscriptionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderState {
    pub in_flight: usize,
}

impl LoaderState {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoaderStore {
    state: StateContainer<LoaderState>,
}

impl LoaderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-flight operation.
    #[must_use = "the operation counts as finished as soon as the guard is dropped"]
    pub fn begin(&self) -> LoadingGuard {
        self.state.update(|s| LoaderState {
            in_flight: s.in_flight + 1,
        });
        LoadingGuard {
            loader: self.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(LoaderState::loading)
    }

    pub fn in_flight(&self) -> usize {
        self.state.with(|s| s.in_flight)
    }

    pub fn get(&self) -> LoaderState {
        self.state.get()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&LoaderState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    fn finish(&self) {
        self.state.update(|s| LoaderState {
            in_flight: s.in_flight.saturating_sub(1),
        });
    }
}

/// Marks one operation as in flight until dropped.
#[derive(Debug)]
pub struct LoadingGuard {
    loader: LoaderStore,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.loader.finish();
    }
}

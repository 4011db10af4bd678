//! Firm registry store, persisted under `firm-storage`.

use std::sync::Arc;

use bizdesk_core::DomainResult;
use bizdesk_firms::{Firm, FirmId, FirmPatch, FirmsState};

use crate::persist::{EnvelopeCodec, PersistedContainer};
use crate::state::SubscriptionId;
use crate::storage::{KeyValueStore, FIRM_STORAGE_KEY};

/// Envelope version written alongside the firm collection.
pub const FIRM_STORAGE_VERSION: u32 = 0;

/// Firm collection with add / update-by-id / delete-by-id.
///
/// A rejected operation leaves both the in-memory collection and storage
/// untouched and notifies nobody.
#[derive(Debug, Clone)]
pub struct FirmStore {
    state: Arc<PersistedContainer<FirmsState>>,
}

impl FirmStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = PersistedContainer::new(
            storage,
            FIRM_STORAGE_KEY,
            EnvelopeCodec::new(FIRM_STORAGE_VERSION),
            FirmsState::default(),
        );
        Self {
            state: Arc::new(state),
        }
    }

    pub fn firms(&self) -> Vec<Firm> {
        self.state.with(|s| s.firms.clone())
    }

    pub fn get(&self, id: &FirmId) -> Option<Firm> {
        self.state.with(|s| s.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.state.with(FirmsState::len)
    }

    pub fn is_empty(&self) -> bool {
        self.state.with(FirmsState::is_empty)
    }

    pub fn add_firm(&self, firm: Firm) -> DomainResult<()> {
        let id = firm.id.clone();
        self.state.try_update(|prev| -> DomainResult<FirmsState> {
            let mut next = prev.clone();
            next.add(firm)?;
            Ok(next)
        })?;
        tracing::debug!(firm_id = %id, "firm added");
        Ok(())
    }

    pub fn update_firm(&self, id: &FirmId, patch: FirmPatch) -> DomainResult<()> {
        self.state.try_update(|prev| -> DomainResult<FirmsState> {
            let mut next = prev.clone();
            next.update(id, patch)?;
            Ok(next)
        })?;
        tracing::debug!(firm_id = %id, "firm updated");
        Ok(())
    }

    pub fn delete_firm(&self, id: &FirmId) -> DomainResult<()> {
        self.state.try_update(|prev| -> DomainResult<FirmsState> {
            let mut next = prev.clone();
            next.delete(id)?;
            Ok(next)
        })?;
        tracing::debug!(firm_id = %id, "firm deleted");
        Ok(())
    }

    pub fn subscribe(&self, listener: impl Fn(&FirmsState) + Send + Sync + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use bizdesk_core::DomainError;
    use std::sync::Mutex;

    fn store() -> (Arc<dyn KeyValueStore>, FirmStore) {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let firms = FirmStore::new(Arc::clone(&storage));
        (storage, firms)
    }

    #[test]
    fn add_then_delete_leaves_empty() {
        let (_, firms) = store();
        firms.add_firm(Firm::new("1", "Acme")).unwrap();
        firms.delete_firm(&FirmId::new("1")).unwrap();
        assert!(firms.is_empty());
    }

    #[test]
    fn update_unknown_id_changes_nothing() {
        let (storage, firms) = store();
        firms.add_firm(Firm::new("1", "Acme")).unwrap();
        let stored_before = storage.get_item(FIRM_STORAGE_KEY).unwrap();
        let before = firms.firms();

        let err = firms
            .update_firm(
                &FirmId::new("2"),
                FirmPatch {
                    name: Some("Ghost".to_string()),
                    ..FirmPatch::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(firms.firms(), before);
        assert_eq!(storage.get_item(FIRM_STORAGE_KEY).unwrap(), stored_before);
    }

    #[test]
    fn rejected_add_does_not_notify() {
        let (_, firms) = store();
        firms.add_firm(Firm::new("1", "Acme")).unwrap();

        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        firms.subscribe(move |_| *counter.lock().unwrap() += 1);

        assert!(firms.add_firm(Firm::new("1", "Duplicate")).is_err());
        assert_eq!(*calls.lock().unwrap(), 0);

        firms.add_firm(Firm::new("2", "Globex")).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn persisted_envelope_layout() {
        let (storage, firms) = store();
        firms.add_firm(Firm::new("1", "Acme")).unwrap();

        let raw = storage.get_item(FIRM_STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["firms"][0]["id"], "1");
        assert_eq!(value["state"]["firms"][0]["name"], "Acme");
    }

    #[test]
    fn concurrent_adds_persist_the_latest_snapshot() {
        let (storage, firms) = store();

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let firms = firms.clone();
                std::thread::spawn(move || {
                    for n in 0..25 {
                        let id = format!("{worker}-{n}");
                        firms.add_firm(Firm::new(id.as_str(), "Acme")).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let reloaded = FirmStore::new(storage);
        assert_eq!(firms.len(), 100);
        assert_eq!(reloaded.firms(), firms.firms());
    }
}

//! Reactive state container.
//!
//! An owned, cloneable handle around a typed value. Every change is stored
//! first and then pushed to all subscribers synchronously, before the setter
//! returns. Setters that produce an equal value are no-ops and notify nobody.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use parking_lot::ReentrantMutex;

/// Handle returned by [`StateContainer::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shallow partial update of a state value.
pub trait Merge<P> {
    fn merge(&mut self, patch: P);
}

impl Merge<bizdesk_auth::RolePatch> for bizdesk_auth::RoleState {
    fn merge(&mut self, patch: bizdesk_auth::RolePatch) {
        self.apply(patch);
    }
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: RwLock<T>,
    subscribers: RwLock<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
    /// Held from the swap until the last subscriber returns.
    write_order: ReentrantMutex<()>,
    revision: AtomicU64,
}

/// Typed value + synchronous change notification.
///
/// Clones share the same state. A change is stored and fanned out as one
/// step under a re-entrant lock, so subscribers see changes in the order
/// they were stored, whichever threads made them. Concurrent writers wait
/// for the fan-out in progress to finish.
///
/// The value lock is released before subscribers run, so a subscriber may
/// read, set, subscribe or unsubscribe on the same container from the
/// calling thread. If a subscriber sets a new value, that nested change is
/// delivered to every subscriber and the outer fan-out stops: subscribers
/// after it never receive the superseded value. A subscriber must not wait
/// on another thread that writes to the same container.
///
/// There is no atomicity across containers.
pub struct StateContainer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for StateContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for StateContainer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let value = self.inner.value.read().unwrap_or_else(PoisonError::into_inner);
        let subscribers = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("StateContainer")
            .field("value", &*value)
            .field("subscribers", &subscribers)
            .finish()
    }
}

impl<T: Default + Clone + PartialEq> Default for StateContainer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> StateContainer<T>
where
    T: Clone + PartialEq,
{
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(initial),
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                write_order: ReentrantMutex::new(()),
                revision: AtomicU64::new(0),
            }),
        }
    }

    /// Current value (cloned).
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.read().unwrap_or_else(PoisonError::into_inner);
        f(&*value)
    }

    /// Replace the value. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        self.update(|_| value)
    }

    /// Replace the value with `f(previous)`. Returns whether it changed.
    ///
    /// `f` runs while the value is write-locked: calling `get`, `with` or
    /// any setter of this container from inside it deadlocks. Work from the
    /// `&T` it is given.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        match self.try_update(|prev| Ok::<_, core::convert::Infallible>(f(prev))) {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }

    /// Merge a partial value into the current one. Returns whether it changed.
    pub fn patch<P>(&self, patch: P) -> bool
    where
        T: Merge<P>,
    {
        self.update(|prev| {
            let mut next = prev.clone();
            next.merge(patch);
            next
        })
    }

    /// Fallible update: on `Err` the state is untouched and nobody is notified.
    ///
    /// Same locking rule as [`update`](Self::update): `f` must not touch this
    /// container.
    pub fn try_update<E>(&self, f: impl FnOnce(&T) -> Result<T, E>) -> Result<bool, E> {
        let _order = self.inner.write_order.lock();

        let (next, revision) = {
            let mut value = self.inner.value.write().unwrap_or_else(PoisonError::into_inner);
            let next = f(&*value)?;
            if next == *value {
                return Ok(false);
            }
            *value = next.clone();
            (next, self.inner.revision.fetch_add(1, Ordering::AcqRel) + 1)
        };

        self.notify(&next, revision);
        Ok(true)
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, value: &T, revision: u64) {
        // Snapshot so listeners can (un)subscribe while being called.
        let listeners: Vec<Listener<T>> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            // A subscriber set a newer value; its own fan-out already ran.
            if self.inner.revision.load(Ordering::Acquire) != revision {
                break;
            }
            listener(value);
        }
    }
}

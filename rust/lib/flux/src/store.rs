use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use zonedesk_types::Resource;

use crate::state::{by_name, normalize, ResourceState, SubscriptionId, Topic};

/// Callback type for state change notifications.
pub type ChangeHandler<T> = Arc<dyn Fn(Topic, &ResourceState<T>) + Send + Sync>;

/// In-memory cache of one resource collection with change subscriptions.
///
/// - every write is a single critical section, never held across `.await`
/// - `subscribe(handler)` registers a callback run after each write with
///   the touched [`Topic`] and a snapshot of the new state
/// - reads clone out of the lock; views are recomputed on demand
///
/// The store does no I/O. `SyncedStore` drives it from gateway results.
pub struct ResourceStore<T: Resource> {
    state: RwLock<ResourceState<T>>,
    handlers: RwLock<Vec<HandlerEntry<T>>>,
    /// Monotonic counter for subscription IDs.
    next_id: AtomicU64,
}

struct HandlerEntry<T> {
    id: SubscriptionId,
    handler: ChangeHandler<T>,
}

impl<T> Clone for HandlerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: self.handler.clone(),
        }
    }
}

impl<T: Resource> ResourceStore<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ResourceState::default()),
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ResourceState<T>> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` under the write lock, then notify subscribers outside it.
    fn write<R>(&self, topic: Topic, f: impl FnOnce(&mut ResourceState<T>) -> R) -> R {
        let (out, snapshot) = {
            let mut state: RwLockWriteGuard<'_, ResourceState<T>> =
                self.state.write().unwrap_or_else(|e| e.into_inner());
            let out = f(&mut state);
            let snapshot = if self.has_subscribers() {
                Some(state.clone())
            } else {
                None
            };
            (out, snapshot)
        };
        if let Some(snapshot) = snapshot {
            let entries = self.handlers.read().unwrap_or_else(|e| e.into_inner()).clone();
            for entry in entries {
                (entry.handler)(topic, &snapshot);
            }
        }
        out
    }

    fn has_subscribers(&self) -> bool {
        !self.handlers.read().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    // ====================================================================
    // Reads
    // ====================================================================

    /// Clone of the whole state.
    pub fn snapshot(&self) -> ResourceState<T> {
        self.read().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.read().items.clone()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn loading(&self) -> bool {
        self.read().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn search_term(&self) -> String {
        self.read().search_term.clone()
    }

    pub fn current(&self) -> Option<T> {
        self.read().current.clone()
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.read().find(id).cloned()
    }

    /// Active records matching `term`.
    pub fn filtered_view(&self, term: &str) -> Vec<T> {
        self.read().filtered_view(term)
    }

    /// Soft-deleted records matching `term`.
    pub fn deleted_view(&self, term: &str) -> Vec<T> {
        self.read().deleted_view(term)
    }

    /// Active records matching the stored search term.
    pub fn visible(&self) -> Vec<T> {
        self.read().visible()
    }

    /// Soft-deleted records matching the stored search term.
    pub fn visible_deleted(&self) -> Vec<T> {
        self.read().visible_deleted()
    }

    // ====================================================================
    // Writes
    // ====================================================================

    pub fn set_loading(&self, loading: bool) {
        self.write(Topic::Loading, |s| s.loading = loading);
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.write(Topic::Search, |s| s.search_term = term);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.write(Topic::Error, |s| s.last_error = Some(message));
    }

    pub fn clear_error(&self) {
        self.write(Topic::Error, |s| s.last_error = None);
    }

    pub fn set_current(&self, record: T) {
        self.write(Topic::Current, |s| s.current = Some(record));
    }

    pub fn clear_current(&self) {
        self.write(Topic::Current, |s| s.current = None);
    }

    /// Overwrite the collection with an authoritative list. Clears the
    /// error and the loading flag in the same write.
    pub fn replace_items(&self, items: Vec<T>) {
        let items = normalize(items);
        self.write(Topic::Items, |s| {
            s.items = items;
            s.last_error = None;
            s.loading = false;
        });
    }

    /// Record a failed refresh. The collection is kept unless `clear` is set.
    pub fn fail_refresh(&self, message: impl Into<String>, clear: bool) {
        let message = message.into();
        self.write(Topic::Error, |s| {
            if clear {
                s.items.clear();
            }
            s.last_error = Some(message);
            s.loading = false;
        });
    }

    /// Insert or replace a record by identity, keeping name order.
    pub fn upsert(&self, record: T) {
        self.write(Topic::Items, |s| {
            match s.items.iter_mut().find(|r| r.uuid() == record.uuid()) {
                Some(existing) => *existing = record,
                None => s.items.push(record),
            }
            s.items.sort_by(by_name);
        });
    }

    /// Replace the cached copy of `record` if there is one. Never inserts.
    pub fn replace_if_present(&self, record: &T) -> bool {
        self.write(Topic::Items, |s| {
            match s.items.iter_mut().find(|r| r.uuid() == record.uuid()) {
                Some(existing) => {
                    *existing = record.clone();
                    s.items.sort_by(by_name);
                    true
                }
                None => false,
            }
        })
    }

    /// Set or clear the soft-delete stamp of a cached record.
    /// Returns false when the identity is not cached.
    pub fn set_deleted_at(&self, id: &str, at: Option<DateTime<Utc>>) -> bool {
        self.write(Topic::Items, |s| match s.items.iter_mut().find(|r| r.uuid() == id) {
            Some(record) => {
                record.set_deleted_at(at);
                true
            }
            None => false,
        })
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    /// Register a handler called synchronously after every write.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(Topic, &ResourceState<T>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = HandlerEntry {
            id,
            handler: Arc::new(handler),
        };
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|entry| entry.id != id);
    }
}

impl<T: Resource> Default for ResourceStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

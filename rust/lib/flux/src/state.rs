use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use zonedesk_types::Resource;

/// Which part of a [`ResourceState`] a write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Items,
    Loading,
    Error,
    Search,
    Current,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Items => "items",
            Topic::Loading => "loading",
            Topic::Error => "error",
            Topic::Search => "search",
            Topic::Current => "current",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique handle for a subscription, returned by `ResourceStore::subscribe()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// What the UI currently believes the server holds for one resource kind.
///
/// `items` is sorted by name and never holds two records with the same
/// identity. Soft-deleted records stay in `items`; the views split them out.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub search_term: String,
    /// Record last fetched or updated through the store.
    pub current: Option<T>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            last_error: None,
            search_term: String::new(),
            current: None,
        }
    }
}

impl<T: Resource> ResourceState<T> {
    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|r| r.uuid() == id)
    }

    /// Active records matching `term`, in store order. Empty term matches all.
    pub fn filtered_view(&self, term: &str) -> Vec<T> {
        self.items
            .iter()
            .filter(|r| !r.is_deleted() && r.matches(term))
            .cloned()
            .collect()
    }

    /// Soft-deleted records matching `term`, in store order.
    pub fn deleted_view(&self, term: &str) -> Vec<T> {
        self.items
            .iter()
            .filter(|r| r.is_deleted() && r.matches(term))
            .cloned()
            .collect()
    }

    /// [`Self::filtered_view`] with the stored search term.
    pub fn visible(&self) -> Vec<T> {
        self.filtered_view(&self.search_term)
    }

    /// [`Self::deleted_view`] with the stored search term.
    pub fn visible_deleted(&self) -> Vec<T> {
        self.deleted_view(&self.search_term)
    }
}

/// Display order: case-insensitive name, then exact name, then identity.
pub(crate) fn by_name<T: Resource>(a: &T, b: &T) -> Ordering {
    a.name()
        .to_lowercase()
        .cmp(&b.name().to_lowercase())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.uuid().cmp(b.uuid()))
}

/// Collapse duplicate identities (later entries win) and sort for display.
pub(crate) fn normalize<T: Resource>(items: Vec<T>) -> Vec<T> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match index.get(item.uuid()) {
            Some(&i) => out[i] = item,
            None => {
                index.insert(item.uuid().to_string(), out.len());
                out.push(item);
            }
        }
    }
    out.sort_by(by_name);
    out
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A soft-deletable record served by a `/{PATH}` REST collection.
///
/// The identity is server-assigned and never changes. Records are listed
/// name-ascending, and the free-text filter looks at [`Resource::search_text`].
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Create payload. Excludes server-assigned fields.
    type Draft: Serialize + fmt::Debug + Send + Sync;
    /// Update payload. Absent fields are left untouched by the server.
    type Patch: Serialize + fmt::Debug + Send + Sync;

    /// Collection path segment, e.g. `zones`.
    const PATH: &'static str;
    /// Singular label for log lines and CLI output.
    const LABEL: &'static str;
    /// Field checked by `/{PATH}/{UNIQUE_FIELD}-check/{value}`.
    const UNIQUE_FIELD: &'static str;

    fn uuid(&self) -> &str;

    /// Display name; the store sorts by it.
    fn name(&self) -> &str;

    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Name, code and description, whichever are present.
    fn search_text(&self) -> Vec<&str>;

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    /// Case-insensitive substring match over [`Resource::search_text`].
    /// An empty term matches everything.
    fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.search_text()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

//! Flux — synchronized resource stores for the admin dashboard.
//!
//! Rust owns the client-side state; the UI only renders it and triggers
//! operations.
//!
//! # Pieces
//!
//! - [`ResourceStore`] — the cached collection plus `loading`, `last_error`,
//!   `search_term` and the current record, with change subscriptions
//! - [`SyncedStore`] — binds a store to its [`Gateway`](zonedesk_client::Gateway)
//!   and reconciles after every mutation by refetching the list
//! - [`Dashboard`] — one synced store per resource kind, built explicitly
//!   and passed to whoever needs it
//!
//! # Example
//!
//! ```ignore
//! use zonedesk_flux::Dashboard;
//!
//! let dashboard = Dashboard::connect(config, Arc::new(StaticToken::new(jwt)));
//!
//! dashboard.zones.store().subscribe(|topic, state| {
//!     println!("zones/{} changed: {} items", topic, state.items.len());
//! });
//!
//! dashboard.zones.refresh().await?;
//! dashboard.zones.create(&ZoneDraft::new("Garage", ZoneType::Interior)).await?;
//! let active = dashboard.zones.store().filtered_view("gar");
//! ```

pub mod dashboard;
pub mod state;
pub mod store;
pub mod sync;

// Re-export primary types at crate root.
pub use dashboard::Dashboard;
pub use state::{ResourceState, SubscriptionId, Topic};
pub use store::{ChangeHandler, ResourceStore};
pub use sync::SyncedStore;

//! Shared data types for the zonedesk workspace.
//!
//! - [`Resource`] — describes one REST resource kind (path, identity,
//!   sort key, soft-delete stamp, searchable text).
//! - [`Envelope`] — the `{ success, data, message?, errors? }` wrapper every
//!   endpoint responds with.
//! - [`model`] — the concrete entity records: zones, scope sheets, users,
//!   customers.

pub mod envelope;
pub mod model;
pub mod resource;

pub use envelope::{Ack, Availability, Envelope, FieldErrors};
pub use model::*;
pub use resource::Resource;

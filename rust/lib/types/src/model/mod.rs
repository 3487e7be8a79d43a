//! Entity records served by the admin API.
//!
//! Each record type lives in its own file together with its create draft,
//! update patch and [`Resource`](crate::Resource) impl.

pub mod customer;
pub mod scope_sheet;
pub mod user;
pub mod zone;

pub use customer::{Customer, CustomerDraft, CustomerPatch};
pub use scope_sheet::{ScopeSheet, ScopeSheetDraft, ScopeSheetPatch, ScopeSheetStatus};
pub use user::{User, UserDraft, UserPatch};
pub use zone::{Zone, ZoneDraft, ZonePatch, ZoneType};

/// Optional text deserializer that maps `""` and whitespace to `None`.
/// Dashboard forms submit cleared inputs as empty strings.
pub fn de_blank_as_none<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    use serde::Deserialize;
    let v = Option::<String>::deserialize(d)?;
    Ok(v.filter(|s| !s.trim().is_empty()))
}

/// Push `value` onto `out` when present.
pub(crate) fn push_opt<'a>(out: &mut Vec<&'a str>, value: &'a Option<String>) {
    if let Some(v) = value {
        out.push(v.as_str());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Resource;

/// A dashboard user account. Sorted and searched by display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uuid: String,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Resource for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    const PATH: &'static str = "users";
    const LABEL: &'static str = "user";
    const UNIQUE_FIELD: &'static str = "email";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str(), self.email.as_str()];
        super::push_opt(&mut out, &self.role);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> User {
        serde_json::from_value(serde_json::json!({
            "uuid": "u-1",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "role": "",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn blank_role_and_missing_deleted_at() {
        let user = ada();
        assert!(user.role.is_none());
        assert!(!user.is_deleted());
    }

    #[test]
    fn search_covers_email() {
        let user = ada();
        assert!(user.matches("EXAMPLE.com"));
        assert!(user.matches("  lovelace "));
        assert!(!user.matches("admin"));
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = UserPatch {
            role: Some("admin".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({"role": "admin"}));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Resource;

/// A customer account. Email doubles as the unique code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub uuid: String,
    pub customer_name: String,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for Customer {
    type Draft = CustomerDraft;
    type Patch = CustomerPatch;

    const PATH: &'static str = "customers";
    const LABEL: &'static str = "customer";
    const UNIQUE_FIELD: &'static str = "email";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.customer_name
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.customer_name.as_str()];
        super::push_opt(&mut out, &self.email);
        super::push_opt(&mut out, &self.description);
        out
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSheetStatus {
    Draft,
    InProgress,
    Completed,
}

/// A scope sheet: the inspection worksheet attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSheet {
    pub uuid: String,
    pub scope_sheet_name: String,
    pub status: ScopeSheetStatus,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub scope_sheet_code: Option<String>,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSheetDraft {
    pub scope_sheet_name: String,
    pub status: ScopeSheetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_sheet_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeSheetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_sheet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ScopeSheetStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_sheet_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for ScopeSheet {
    type Draft = ScopeSheetDraft;
    type Patch = ScopeSheetPatch;

    const PATH: &'static str = "scope-sheets";
    const LABEL: &'static str = "scope sheet";
    const UNIQUE_FIELD: &'static str = "code";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.scope_sheet_name
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.scope_sheet_name.as_str()];
        super::push_opt(&mut out, &self.scope_sheet_code);
        super::push_opt(&mut out, &self.description);
        out
    }
}

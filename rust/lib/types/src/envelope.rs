use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Server-reported field errors: `{"zone_code": ["already taken"]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Response wrapper shared by every endpoint.
///
/// ```json
/// {"success": true, "data": {...}, "message": "Zone created"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: None,
        }
    }

    /// Best human-readable description of a failure: the `message`, else the
    /// first field error.
    pub fn failure_message(&self) -> Option<String> {
        if let Some(msg) = self.message.as_ref().filter(|m| !m.is_empty()) {
            return Some(msg.clone());
        }
        self.errors
            .as_ref()
            .and_then(|errs| errs.values().flatten().next().cloned())
    }
}

/// Soft-delete acknowledgement. `success: false` means the server refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of a uniqueness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
}

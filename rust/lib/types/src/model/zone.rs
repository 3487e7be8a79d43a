use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Resource;

/// Zone category. Closed set; unknown values fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Interior,
    Exterior,
    Roof,
    Basement,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneType::Interior => "interior",
            ZoneType::Exterior => "exterior",
            ZoneType::Roof => "roof",
            ZoneType::Basement => "basement",
        };
        f.write_str(s)
    }
}

/// A zone (attic, garage, roof, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub uuid: String,
    pub zone_name: String,
    pub zone_type: ZoneType,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub zone_code: Option<String>,
    #[serde(default, deserialize_with = "super::de_blank_as_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create payload for `POST /zones/store`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDraft {
    pub zone_name: String,
    pub zone_type: ZoneType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ZoneDraft {
    pub fn new(zone_name: impl Into<String>, zone_type: ZoneType) -> Self {
        Self {
            zone_name: zone_name.into(),
            zone_type,
            zone_code: None,
            description: None,
        }
    }
}

/// Update payload for `PATCH /zones/update/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZonePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<ZoneType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for Zone {
    type Draft = ZoneDraft;
    type Patch = ZonePatch;

    const PATH: &'static str = "zones";
    const LABEL: &'static str = "zone";
    const UNIQUE_FIELD: &'static str = "code";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.zone_name
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.zone_name.as_str()];
        super::push_opt(&mut out, &self.zone_code);
        super::push_opt(&mut out, &self.description);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attic_json() -> serde_json::Value {
        serde_json::json!({
            "uuid": "z1",
            "zone_name": "Attic",
            "zone_type": "interior",
            "zone_code": "ATC",
            "description": "Top floor crawl space",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z",
            "deleted_at": null,
        })
    }

    #[test]
    fn deserialize_active_zone() {
        let zone: Zone = serde_json::from_value(attic_json()).unwrap();
        assert_eq!(zone.uuid(), "z1");
        assert_eq!(zone.name(), "Attic");
        assert_eq!(zone.zone_type, ZoneType::Interior);
        assert!(!zone.is_deleted());
    }

    #[test]
    fn unknown_zone_type_is_rejected() {
        let mut json = attic_json();
        json["zone_type"] = "spaceship".into();
        assert!(serde_json::from_value::<Zone>(json).is_err());
    }

    #[test]
    fn blank_code_becomes_none() {
        let mut json = attic_json();
        json["zone_code"] = "  ".into();
        let zone: Zone = serde_json::from_value(json).unwrap();
        assert_eq!(zone.zone_code, None);
        assert_eq!(zone.search_text(), vec!["Attic", "Top floor crawl space"]);
    }

    #[test]
    fn matches_is_case_insensitive_over_all_fields() {
        let zone: Zone = serde_json::from_value(attic_json()).unwrap();
        assert!(zone.matches("attic"));
        assert!(zone.matches("ATTIC"));
        assert!(zone.matches("atc"));
        assert!(zone.matches("CRAWL"));
        assert!(zone.matches(""));
        assert!(!zone.matches("garage"));
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = ZonePatch {
            zone_name: Some("Loft".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"zone_name": "Loft"}));
    }

    #[test]
    fn draft_serializes_type_in_snake_case() {
        let draft = ZoneDraft::new("Garage", ZoneType::Interior);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json, serde_json::json!({"zone_name": "Garage", "zone_type": "interior"}));
    }
}

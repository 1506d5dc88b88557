#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Editorial content attached to municipalities.

use serde::{Deserialize, Serialize};

/// Stored editorial record for one municipality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityContent {
    /// Municipality name (unique key).
    pub name: String,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short keyword tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Notable facts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
    /// A single fun fact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
    /// RFC 3339 time of the last write.
    pub updated_at: String,
}

/// A partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdate {
    /// Municipality name. Required by the HTTP API.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Short keyword tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Notable facts.
    #[serde(default)]
    pub highlights: Option<Vec<String>>,
    /// A single fun fact.
    #[serde(default)]
    pub fun_fact: Option<String>,
}

impl ContentUpdate {
    /// Applies this update over `existing` (or an empty record named
    /// `name`), stamping `updated_at`.
    #[must_use]
    pub fn merge_into(
        self,
        name: &str,
        existing: Option<MunicipalityContent>,
        updated_at: String,
    ) -> MunicipalityContent {
        let base = existing.unwrap_or_else(|| MunicipalityContent {
            name: name.to_string(),
            description: None,
            tags: None,
            highlights: None,
            fun_fact: None,
            updated_at: String::new(),
        });

        MunicipalityContent {
            name: name.to_string(),
            description: self.description.or(base.description),
            tags: self.tags.or(base.tags),
            highlights: self.highlights.or(base.highlights),
            fun_fact: self.fun_fact.or(base.fun_fact),
            updated_at,
        }
    }
}

/// Whether an upsert inserted or replaced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpsertOutcome {
    /// No record existed.
    Created,
    /// An existing record was merged.
    Updated,
}

/// Generated extras for a municipality page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalContent {
    /// Short keyword tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Notable facts.
    #[serde(default)]
    pub highlights: Vec<String>,
    /// A single fun fact.
    #[serde(default)]
    pub fun_fact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_absent_fields() {
        let existing = MunicipalityContent {
            name: "Ponce".to_string(),
            description: Some("La Perla del Sur".to_string()),
            tags: Some(vec!["sur".to_string()]),
            highlights: None,
            fun_fact: Some("old".to_string()),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let update = ContentUpdate {
            fun_fact: Some("new".to_string()),
            ..ContentUpdate::default()
        };
        let merged = update.merge_into("Ponce", Some(existing), "now".to_string());
        assert_eq!(merged.description.as_deref(), Some("La Perla del Sur"));
        assert_eq!(merged.tags, Some(vec!["sur".to_string()]));
        assert_eq!(merged.fun_fact.as_deref(), Some("new"));
        assert_eq!(merged.updated_at, "now");
    }

    #[test]
    fn camel_case_wire_format() {
        let update: ContentUpdate =
            serde_json::from_str(r#"{"name":"Lares","funFact":"Heladería"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("Lares"));
        assert_eq!(update.fun_fact.as_deref(), Some("Heladería"));

        let record = update.merge_into("Lares", None, "t".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["funFact"], "Heladería");
        assert_eq!(json["updatedAt"], "t");
        assert!(json.get("tags").is_none());
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Editorial content storage backed by `SQLite`.
//!
//! Holds admin-curated descriptions, tags and highlights per
//! municipality. Records are keyed by municipality name; list fields are
//! stored as JSON text.

use std::collections::BTreeMap;
use std::path::Path;

use moosicbox_json_utils::database::ToValue as _;
use solar_map_editorial_models::{ContentUpdate, MunicipalityContent, UpsertOutcome};
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Errors from editorial storage operations.
#[derive(Debug, Error)]
pub enum EditorialError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const SELECT_COLUMNS: &str =
    "SELECT name, description, tags, highlights, fun_fact, updated_at FROM municipality_content";

/// Editorial content store.
pub struct EditorialStore {
    db: Box<dyn Database>,
}

impl std::fmt::Debug for EditorialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorialStore").finish_non_exhaustive()
    }
}

impl EditorialStore {
    /// Opens (or creates) the `SQLite` database at `path` and ensures the
    /// schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if the database cannot be opened or
    /// schema creation fails.
    pub async fn open(path: &Path) -> Result<Self, EditorialError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db =
            init_sqlite_rusqlite(Some(path)).map_err(|e| EditorialError::Database(e.to_string()))?;

        Self::from_database(db).await
    }

    /// Wraps an open database connection, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if schema creation fails.
    pub async fn from_database(db: Box<dyn Database>) -> Result<Self, EditorialError> {
        db.exec_raw(
            "CREATE TABLE IF NOT EXISTS municipality_content (
                name        TEXT PRIMARY KEY,
                description TEXT,
                tags        TEXT,
                highlights  TEXT,
                fun_fact    TEXT,
                updated_at  TEXT NOT NULL
            )",
        )
        .await
        .map_err(|e| EditorialError::Database(e.to_string()))?;

        Ok(Self { db })
    }

    /// Returns every record keyed by name.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if the query fails or a stored list is
    /// not valid JSON.
    pub async fn list(&self) -> Result<BTreeMap<String, MunicipalityContent>, EditorialError> {
        let rows = self
            .db
            .query_raw_params(&format!("{SELECT_COLUMNS} ORDER BY name"), &[])
            .await
            .map_err(|e| EditorialError::Database(e.to_string()))?;

        let mut records = BTreeMap::new();
        for row in &rows {
            let record = record_from_row(row)?;
            records.insert(record.name.clone(), record);
        }

        Ok(records)
    }

    /// Returns the record for `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if the query fails.
    pub async fn get(&self, name: &str) -> Result<Option<MunicipalityContent>, EditorialError> {
        let rows = self
            .db
            .query_raw_params(
                &format!("{SELECT_COLUMNS} WHERE name = $1"),
                &[DatabaseValue::String(name.to_string())],
            )
            .await
            .map_err(|e| EditorialError::Database(e.to_string()))?;

        rows.first().map(record_from_row).transpose()
    }

    /// Merges `update` into the record for `name`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if any database operation fails.
    pub async fn upsert(
        &self,
        name: &str,
        update: ContentUpdate,
    ) -> Result<(MunicipalityContent, UpsertOutcome), EditorialError> {
        let existing = self.get(name).await?;
        let outcome = if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        };
        let record = update.merge_into(name, existing, chrono::Utc::now().to_rfc3339());

        self.db
            .exec_raw_params(
                "INSERT INTO municipality_content
                    (name, description, tags, highlights, fun_fact, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (name) DO UPDATE SET
                   description = excluded.description,
                   tags = excluded.tags,
                   highlights = excluded.highlights,
                   fun_fact = excluded.fun_fact,
                   updated_at = excluded.updated_at",
                &[
                    DatabaseValue::String(record.name.clone()),
                    optional_string(record.description.clone()),
                    optional_string(encode_list(record.tags.as_deref())?),
                    optional_string(encode_list(record.highlights.as_deref())?),
                    optional_string(record.fun_fact.clone()),
                    DatabaseValue::String(record.updated_at.clone()),
                ],
            )
            .await
            .map_err(|e| EditorialError::Database(e.to_string()))?;

        log::info!("Editorial record {name} {outcome:?}");

        Ok((record, outcome))
    }

    /// Deletes the record for `name`. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if the database operation fails.
    pub async fn delete(&self, name: &str) -> Result<bool, EditorialError> {
        let deleted = self
            .db
            .exec_raw_params(
                "DELETE FROM municipality_content WHERE name = $1",
                &[DatabaseValue::String(name.to_string())],
            )
            .await
            .map_err(|e| EditorialError::Database(e.to_string()))?;

        Ok(deleted > 0)
    }
}

fn optional_string(value: Option<String>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::String)
}

fn encode_list(values: Option<&[String]>) -> Result<Option<String>, EditorialError> {
    values
        .map(serde_json::to_string)
        .transpose()
        .map_err(EditorialError::from)
}

fn decode_list(text: Option<String>) -> Result<Option<Vec<String>>, EditorialError> {
    text.filter(|t| !t.is_empty())
        .map(|t| serde_json::from_str(&t))
        .transpose()
        .map_err(EditorialError::from)
}

fn record_from_row(row: &switchy_database::Row) -> Result<MunicipalityContent, EditorialError> {
    Ok(MunicipalityContent {
        name: row.to_value("name").unwrap_or_default(),
        description: row.to_value("description").unwrap_or(None),
        tags: decode_list(row.to_value("tags").unwrap_or(None))?,
        highlights: decode_list(row.to_value("highlights").unwrap_or(None))?,
        fun_fact: row.to_value("fun_fact").unwrap_or(None),
        updated_at: row.to_value("updated_at").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_db(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "solar_map_editorial_{}_{name}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn upsert_creates_then_merges() {
        let path = temp_db("upsert");
        let store = EditorialStore::open(&path).await.unwrap();

        let (created, outcome) = store
            .upsert(
                "Ponce",
                ContentUpdate {
                    description: Some("La Perla del Sur".to_string()),
                    tags: Some(vec!["sur".to_string(), "costa".to_string()]),
                    ..ContentUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);
        assert!(!created.updated_at.is_empty());

        let (merged, outcome) = store
            .upsert(
                "Ponce",
                ContentUpdate {
                    fun_fact: Some("Parque de Bombas".to_string()),
                    ..ContentUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(merged.description.as_deref(), Some("La Perla del Sur"));

        let stored = store.get("Ponce").await.unwrap().unwrap();
        assert_eq!(stored.tags, Some(vec!["sur".to_string(), "costa".to_string()]));
        assert_eq!(stored.fun_fact.as_deref(), Some("Parque de Bombas"));
        assert!(stored.highlights.is_none());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn list_and_delete() {
        let path = temp_db("list");
        let store = EditorialStore::open(&path).await.unwrap();

        store.upsert("Yauco", ContentUpdate::default()).await.unwrap();
        store.upsert("Arecibo", ContentUpdate::default()).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), ["Arecibo", "Yauco"]);

        assert!(store.delete("Yauco").await.unwrap());
        assert!(!store.delete("Yauco").await.unwrap());
        assert!(store.get("Yauco").await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);

        let _ = std::fs::remove_file(path);
    }
}

//! CRUD operations on JSON documents.
//!
//! Every document body is a JSON object that carries its own `id` and
//! `createdAt`, both stamped here, so readers can deserialize a row straight
//! into a model.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};
use uuid::Uuid;

use vibe_shared::constants::CREATED_AT;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::query::{json_path, FieldUpdate, Query};

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn into_object(data: Value) -> Result<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new document under a freshly generated id.
    pub fn insert_document(&self, collection: &str, data: Value) -> Result<Value> {
        let id = Uuid::new_v4().simple().to_string();
        let created_at = now_timestamp();

        let mut body = into_object(data)?;
        body.insert("id".into(), Value::String(id.clone()));
        body.insert(CREATED_AT.into(), Value::String(created_at.clone()));
        let body = Value::Object(body);

        self.conn().execute(
            "INSERT INTO documents (collection, id, created_at, json)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, id, created_at, serde_json::to_string(&body)?],
        )?;
        Ok(body)
    }

    /// Create or replace the document at `id`. An existing document keeps its
    /// original `createdAt`.
    pub fn put_document(&self, collection: &str, id: &str, data: Value) -> Result<Value> {
        let existing: Option<String> = self
            .conn()
            .query_row(
                "SELECT created_at FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        let created_at = existing.unwrap_or_else(now_timestamp);

        let mut body = into_object(data)?;
        body.insert("id".into(), Value::String(id.to_string()));
        body.insert(CREATED_AT.into(), Value::String(created_at.clone()));
        let body = Value::Object(body);

        self.conn().execute(
            "INSERT INTO documents (collection, id, created_at, json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (collection, id) DO UPDATE SET json = excluded.json",
            params![collection, id, created_at, serde_json::to_string(&body)?],
        )?;
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT json FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(StoreError::from))
            .transpose()
    }

    /// Run a windowed query and return the matching bodies in order.
    pub fn query_documents(&self, query: &Query) -> Result<Vec<Value>> {
        let dir = query.direction.as_sql();
        let order_path = json_path(&query.order_by);
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let rows: Vec<String> = match &query.filter {
            Some((field, value)) => {
                let sql = format!(
                    "SELECT json FROM documents
                     WHERE collection = ?1 AND json_extract(json, ?4) = ?5
                     ORDER BY json_extract(json, ?2) {dir}, seq {dir}
                     LIMIT ?3"
                );
                let mut stmt = self.conn().prepare(&sql)?;
                let rows = stmt.query_map(
                    params![query.collection, order_path, limit, json_path(field), value],
                    |row| row.get(0),
                )?;
                rows.collect::<rusqlite::Result<_>>()?
            }
            None => {
                let sql = format!(
                    "SELECT json FROM documents
                     WHERE collection = ?1
                     ORDER BY json_extract(json, ?2) {dir}, seq {dir}
                     LIMIT ?3"
                );
                let mut stmt = self.conn().prepare(&sql)?;
                let rows = stmt.query_map(params![query.collection, order_path, limit], |row| {
                    row.get(0)
                })?;
                rows.collect::<rusqlite::Result<_>>()?
            }
        };

        rows.iter()
            .map(|j| serde_json::from_str(j).map_err(StoreError::from))
            .collect()
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply field changes to an existing document.
    pub fn update_document(
        &self,
        collection: &str,
        id: &str,
        changes: &[FieldUpdate],
    ) -> Result<Value> {
        let current = self
            .get_document(collection, id)?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let mut body = into_object(current)?;

        for change in changes {
            match change {
                FieldUpdate::Set(field, value) => {
                    body.insert(field.clone(), value.clone());
                }
                FieldUpdate::Increment(field, delta) => {
                    let base = match body.get(field) {
                        None | Some(Value::Null) => 0,
                        Some(v) => v
                            .as_i64()
                            .ok_or_else(|| StoreError::NotAnInteger(field.clone()))?,
                    };
                    body.insert(field.clone(), Value::from(base + delta));
                }
            }
        }

        let body = Value::Object(body);
        self.conn().execute(
            "UPDATE documents SET json = ?1 WHERE collection = ?2 AND id = ?3",
            params![serde_json::to_string(&body)?, collection, id],
        )?;
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(affected > 0)
    }
}

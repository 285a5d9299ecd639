//! Live query descriptions and field-level updates.

use serde_json::Value;

use vibe_shared::constants::CREATED_AT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A windowed query over one collection: optional equality filter, one
/// ordering field and a row limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub order_by: String,
    pub direction: Direction,
    pub limit: usize,
    pub filter: Option<(String, String)>,
}

impl Query {
    /// Newest documents first, by their server-assigned timestamp.
    pub fn latest(collection: impl Into<String>, limit: usize) -> Self {
        Self {
            collection: collection.into(),
            order_by: CREATED_AT.to_string(),
            direction: Direction::Descending,
            limit,
            filter: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = field.into();
        self.direction = direction;
        self
    }

    /// Only match documents whose top-level string `field` equals `value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }
}

/// One change applied by [`crate::DocumentStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite a top-level field.
    Set(String, Value),
    /// Atomically add `delta` to an integer field (missing counts as 0).
    Increment(String, i64),
}

impl FieldUpdate {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set(field.into(), value.into())
    }

    pub fn increment(field: impl Into<String>, delta: i64) -> Self {
        Self::Increment(field.into(), delta)
    }
}

/// JSON path for a top-level field, as understood by SQLite's `json_extract`.
pub(crate) fn json_path(field: &str) -> String {
    format!("$.{field}")
}

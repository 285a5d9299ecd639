//! v001 -- Initial schema creation.
//!
//! Creates the `documents` table holding every collection's JSON bodies and
//! the `accounts` table used by the local identity provider.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents (one row per document, any collection)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT, -- insertion order, ordering tie-break
    collection TEXT NOT NULL,                     -- e.g. `posts`, `posts/<id>/comments`
    id         TEXT NOT NULL,                     -- store-assigned or caller-chosen key
    created_at TEXT NOT NULL,                     -- RFC-3339, server-assigned
    json       TEXT NOT NULL,                     -- full body, includes id + createdAt

    UNIQUE (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection_created
    ON documents(collection, created_at DESC);

-- ----------------------------------------------------------------
-- Accounts (local identity provider)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,                  -- hex BLAKE3 derive_key(salt || password)
    salt          TEXT NOT NULL,                  -- hex, 16 random bytes
    display_name  TEXT,
    created_at    TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

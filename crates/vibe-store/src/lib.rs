//! # vibe-store
//!
//! The backend interfaces consumed by the VIBE client core, plus a local
//! SQLite-backed implementation of them.
//!
//! [`DocumentStore`] models a document database with server-assigned ids and
//! timestamps, atomic counters and live queries that push complete ordered
//! snapshots. [`IdentityProvider`] models credential sign-in with a
//! signed-in / signed-out state stream. [`LocalBackend`] implements both on
//! top of a single `rusqlite::Connection` for development and tests.

pub mod accounts;
pub mod backend;
pub mod database;
pub mod documents;
pub mod live;
pub mod migrations;
pub mod query;

mod error;

pub use backend::{AuthUser, DocumentStore, IdentityProvider, LocalBackend, Subscription};
pub use database::Database;
pub use error::{Result, StoreError};
pub use live::{Snapshot, SnapshotResult};
pub use query::{Direction, FieldUpdate, Query};

//! Live query fan-out.
//!
//! Each registered query keeps the sending half of an unbounded channel.
//! After every committed write the backend calls [`LiveRegistry::publish`]
//! for the touched collection, which re-runs every query over that
//! collection and pushes the complete window. Receivers that have been
//! dropped are pruned on the next publish.
//!
//! Every snapshot is stamped with the commit sequence it was read at. A
//! write acknowledged with sequence `n` is contained in every snapshot
//! stamped `n` or later.

use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::query::Query;

/// Full ordered window of document bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Commit sequence of the last write visible in `documents`.
    pub seq: u64,
    pub documents: Vec<Value>,
}

/// Item delivered to a subscriber: the full ordered window, or the read error
/// that prevented producing it.
pub type SnapshotResult = std::result::Result<Snapshot, StoreError>;

fn read(db: &Database, query: &Query, seq: u64) -> SnapshotResult {
    db.query_documents(query)
        .map(|documents| Snapshot { seq, documents })
}

struct LiveQuery {
    id: u64,
    query: Query,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
pub struct LiveRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    queries: Vec<LiveQuery>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `query` and immediately deliver its current window, read at
    /// commit sequence `seq`.
    pub fn register(
        &self,
        db: &Database,
        query: Query,
        seq: u64,
    ) -> Result<(u64, mpsc::UnboundedReceiver<SnapshotResult>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(read(db, &query, seq));

        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        inner.next_id += 1;
        let id = inner.next_id;
        debug!(subscription = id, collection = %query.collection, "live query registered");
        inner.queries.push(LiveQuery { id, query, tx });
        Ok((id, rx))
    }

    /// Push a fresh snapshot to every live query on `collection`. `seq` is
    /// the commit sequence of the write that triggered it.
    pub fn publish(&self, db: &Database, collection: &str, seq: u64) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(collection, "live registry lock poisoned, snapshot dropped");
                return;
            }
        };

        inner.queries.retain(|live| {
            if live.tx.is_closed() {
                debug!(subscription = live.id, "live query receiver dropped");
                return false;
            }
            if live.query.collection != collection {
                return true;
            }
            live.tx.send(read(db, &live.query, seq)).is_ok()
        });
    }

    /// Number of registered queries that still have a receiver.
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.queries.iter().filter(|q| !q.tx.is_closed()).count())
            .unwrap_or(0)
    }
}

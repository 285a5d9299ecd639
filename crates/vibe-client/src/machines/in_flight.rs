//! In-flight tracking for the forms whose writes are not optimistic.
//!
//! The chat input, comment box, settings form and delete control each stay
//! disabled from submit until the store settles. A [`WriteGuard`] holds the
//! slot and frees it when dropped, so both outcomes (and a cancelled
//! future) clear the flag.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use vibe_shared::types::PostId;

use crate::error::ClientError;

/// A control that can have one write outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingWrite {
    ChatSend,
    Comment(PostId),
    ProfileSave,
    PostDelete(PostId),
}

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<PendingWrite>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `write`. Fails with [`ClientError::Busy`] while an earlier
    /// submit of the same control is still outstanding.
    pub fn begin(&self, write: PendingWrite) -> Result<WriteGuard, ClientError> {
        if !lock(&self.active).insert(write.clone()) {
            debug!(?write, "submit ignored, write already in flight");
            return Err(ClientError::Busy);
        }
        Ok(WriteGuard {
            active: self.active.clone(),
            write,
        })
    }

    /// Whether the control for `write` is disabled.
    pub fn is_active(&self, write: &PendingWrite) -> bool {
        lock(&self.active).contains(write)
    }
}

/// Holds one [`PendingWrite`] slot until dropped.
#[derive(Debug)]
pub struct WriteGuard {
    active: Arc<Mutex<HashSet<PendingWrite>>>,
    write: PendingWrite,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.write);
    }
}

fn lock(active: &Mutex<HashSet<PendingWrite>>) -> MutexGuard<'_, HashSet<PendingWrite>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

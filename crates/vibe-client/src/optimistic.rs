//! Optimistic like toggles.
//!
//! Toggling flips the viewer's liked flag and the displayed counter at once;
//! the authoritative increment is sent afterwards and never awaited by the
//! caller. Every toggle carries a monotonic local version, and every
//! acknowledged write the store's commit sequence, so the ledger can
//! reconcile with snapshots whichever arrives first:
//!
//! * snapshots only ever replace the server-confirmed count;
//! * the displayed count is that count plus every delta the last snapshot
//!   did not contain yet;
//! * an acknowledged delta is dropped once a snapshot stamped at or after
//!   its commit has been seen, even if that snapshot came before the ack;
//! * a failed delta is dropped, which rolls the displayed value back.

use std::collections::{HashMap, HashSet};

use vibe_shared::types::PostId;

/// A toggle that has been applied locally but not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLike {
    pub version: u64,
    pub delta: i64,
}

/// A committed toggle whose snapshot has not been seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AckedLike {
    like: PendingLike,
    commit: u64,
}

#[derive(Debug, Default)]
struct LikeEntry {
    server_likes: i64,
    /// Commit sequence of the newest snapshot applied to `server_likes`.
    observed: u64,
    liked: bool,
    in_flight: Vec<PendingLike>,
    awaiting_echo: Vec<AckedLike>,
}

impl LikeEntry {
    fn pending(&self) -> impl Iterator<Item = &PendingLike> {
        self.in_flight
            .iter()
            .chain(self.awaiting_echo.iter().map(|a| &a.like))
    }

    fn displayed(&self) -> i64 {
        self.server_likes + self.pending().map(|p| p.delta).sum::<i64>()
    }

    fn is_settled(&self) -> bool {
        self.in_flight.is_empty() && self.awaiting_echo.is_empty()
    }
}

/// Local like state of the viewer, keyed by post.
#[derive(Debug, Default)]
pub struct LikeLedger {
    next_version: u64,
    entries: HashMap<PostId, LikeEntry>,
}

/// What the feed shows for one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeView {
    pub liked: bool,
    pub likes: i64,
}

impl LikeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the liked flag of `post`. `server_likes` seeds the entry the first
    /// time the post is touched.
    pub fn toggle(&mut self, post: &PostId, server_likes: i64) -> PendingLike {
        self.next_version += 1;
        let version = self.next_version;

        let entry = self.entries.entry(post.clone()).or_insert_with(|| LikeEntry {
            server_likes,
            ..LikeEntry::default()
        });
        let delta = if entry.liked { -1 } else { 1 };
        entry.liked = !entry.liked;

        let pending = PendingLike { version, delta };
        entry.in_flight.push(pending);
        pending
    }

    /// Record the count carried by a snapshot read at commit sequence `seq`.
    /// Snapshots older than one already applied are ignored.
    pub fn observe(&mut self, post: &PostId, server_likes: i64, seq: u64) {
        if let Some(entry) = self.entries.get_mut(post) {
            if seq < entry.observed {
                return;
            }
            entry.observed = seq;
            entry.server_likes = server_likes;
            entry.awaiting_echo.retain(|a| a.commit > seq);
        }
    }

    /// The write for `version` was committed by the store at sequence
    /// `commit`. If a snapshot containing it was already applied, the delta
    /// is already part of the server count.
    pub fn acknowledge(&mut self, post: &PostId, version: u64, commit: u64) {
        if let Some(entry) = self.entries.get_mut(post) {
            if let Some(pos) = entry.in_flight.iter().position(|p| p.version == version) {
                let like = entry.in_flight.remove(pos);
                if commit > entry.observed {
                    entry.awaiting_echo.push(AckedLike { like, commit });
                }
            }
        }
    }

    /// The write for `version` failed. Its delta no longer counts and, if it
    /// was the latest toggle, the liked flag goes back to what it was before.
    pub fn fail(&mut self, post: &PostId, version: u64) {
        if let Some(entry) = self.entries.get_mut(post) {
            if let Some(pos) = entry.in_flight.iter().position(|p| p.version == version) {
                let pending = entry.in_flight.remove(pos);
                let latest = entry.pending().all(|p| p.version < pending.version);
                if latest {
                    entry.liked = pending.delta < 0;
                }
            }
        }
    }

    /// Displayed state of `post`, given the count from the current window.
    pub fn view(&self, post: &PostId, server_likes: i64) -> LikeView {
        match self.entries.get(post) {
            Some(entry) => LikeView {
                liked: entry.liked,
                likes: entry.displayed(),
            },
            None => LikeView {
                liked: false,
                likes: server_likes,
            },
        }
    }

    pub fn is_settled(&self, post: &PostId) -> bool {
        self.entries.get(post).map_or(true, LikeEntry::is_settled)
    }

    /// Forget posts that left the window and have nothing in flight.
    pub fn retain_visible(&mut self, visible: &HashSet<PostId>) {
        self.entries
            .retain(|post, entry| visible.contains(post) || !entry.in_flight.is_empty());
    }
}

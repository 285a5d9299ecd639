//! The client core handle.
//!
//! A [`Client`] owns the collaborator handles, the session store, the like
//! ledger and the UI event sink. Command handlers live in
//! [`crate::commands`] as further `impl Client` blocks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use vibe_shared::constants::{NOTIFICATIONS, USERS};
use vibe_shared::models::{NotificationDraft, NotificationKind, Post, Profile};
use vibe_store::{DocumentStore, FieldUpdate, IdentityProvider, LocalBackend, StoreError};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{EventSink, UiEvent};
use crate::machines::{InFlight, PendingWrite};
use crate::optimistic::{LikeLedger, LikeView};
use crate::session::SessionStore;

pub struct Client {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) auth: Arc<dyn IdentityProvider>,
    pub(crate) config: ClientConfig,
    pub(crate) session: SessionStore,
    pub(crate) likes: Arc<Mutex<LikeLedger>>,
    pub(crate) in_flight: InFlight,
    pub(crate) events: EventSink,
}

impl Client {
    /// Wire a client to the given collaborators and start the session
    /// listener. Must be called from within a Tokio runtime.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn IdentityProvider>,
        config: ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, rx) = EventSink::channel();
        let session = SessionStore::start(
            store.clone(),
            auth.as_ref(),
            config.intro_delay,
            events.clone(),
        );

        let client = Self {
            store,
            auth,
            config,
            session,
            likes: Arc::new(Mutex::new(LikeLedger::new())),
            in_flight: InFlight::new(),
            events,
        };
        (client, rx)
    }

    /// Client backed by the local SQLite backend at `config.db_path`, or the
    /// platform data directory when unset.
    pub fn local(config: ClientConfig) -> Result<(Self, mpsc::UnboundedReceiver<UiEvent>), ClientError> {
        let backend = match &config.db_path {
            Some(path) => LocalBackend::open_at(path)?,
            None => LocalBackend::open_default()?,
        };
        let backend = Arc::new(backend);
        info!(path = ?config.db_path, "local backend opened");
        Ok(Self::new(backend.clone(), backend, config))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the control for `write` should be disabled.
    pub fn is_pending(&self, write: &PendingWrite) -> bool {
        self.in_flight.is_active(write)
    }

    /// Like state of `post` as the viewer should see it.
    pub fn like_view(&self, post: &Post) -> LikeView {
        lock_ledger(&self.likes).view(&post.id, post.likes)
    }

    /// Log a failed write and raise a blocking alert. The caller clears its
    /// own in-flight flag.
    pub(crate) fn report_write_failure(&self, action: &'static str, err: &ClientError) {
        error!(action, error = %err, "write failed");
        self.events.alert("Error", err.user_message());
    }

    /// Adjust the author's post counter. A user still on a synthesized
    /// profile gets a record written with the adjusted count.
    pub(crate) async fn bump_post_count(&self, author: &Profile, delta: i64) -> Result<(), ClientError> {
        let changes = vec![FieldUpdate::increment("postCount", delta)];
        match self.store.update(USERS, author.id.as_str(), changes).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound { .. }) => {
                let mut record = author.clone();
                record.post_count = (record.post_count + delta).max(0);
                self.store
                    .set(USERS, author.id.as_str(), serde_json::to_value(&record)?)
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fan out a notification for `actor`. Best effort: the action that
    /// produced it has already succeeded.
    pub(crate) async fn notify(&self, kind: NotificationKind, actor: &Profile) {
        if let Err(e) = produce_notification(self.store.as_ref(), kind, actor).await {
            warn!(?kind, error = %e, "failed to produce notification");
        }
    }
}

pub(crate) async fn produce_notification(
    store: &dyn DocumentStore,
    kind: NotificationKind,
    actor: &Profile,
) -> Result<String, ClientError> {
    let draft = NotificationDraft::new(kind, actor);
    Ok(store.create(NOTIFICATIONS, serde_json::to_value(&draft)?).await?)
}

pub(crate) fn lock_ledger(ledger: &Mutex<LikeLedger>) -> MutexGuard<'_, LikeLedger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

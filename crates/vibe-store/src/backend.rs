//! Backend interfaces and the local SQLite implementation.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use vibe_shared::constants::MIN_PASSWORD_LEN;
use vibe_shared::error::AuthError;
use vibe_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::live::{LiveRegistry, SnapshotResult};
use crate::query::{FieldUpdate, Query};

/// Receiving end of a live query. Dropping it tears the query down.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
}

impl Subscription {
    pub fn new(id: u64, rx: mpsc::UnboundedReceiver<SnapshotResult>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next snapshot. `None` once the backend has gone away.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        self.rx.recv().await
    }
}

/// A document database with server-assigned ids and timestamps.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return its new id.
    async fn create(&self, collection: &str, data: Value) -> Result<String>;

    /// Create or replace the document stored under `id`.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Apply field changes to an existing document. Returns the commit
    /// sequence of the write: every snapshot stamped with this sequence or a
    /// later one already contains the change.
    async fn update(&self, collection: &str, id: &str, changes: Vec<FieldUpdate>) -> Result<u64>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Open a live query. The first snapshot is delivered right away and a new
    /// one follows every change to the collection.
    fn subscribe(&self, query: Query) -> Result<Subscription>;
}

/// The identity currently signed in with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> std::result::Result<(), AuthError>;

    /// Change the provider-side display name. Not reported on the state stream.
    async fn update_display_name(&self, name: &str) -> std::result::Result<(), AuthError>;

    /// Signed-in / signed-out state. Changes only on actual transitions.
    fn auth_state(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// SQLite-backed [`DocumentStore`] and [`IdentityProvider`].
pub struct LocalBackend {
    db: Mutex<Database>,
    live: LiveRegistry,
    commits: AtomicU64,
    auth_tx: watch::Sender<Option<AuthUser>>,
}

impl LocalBackend {
    pub fn new(db: Database) -> Self {
        let (auth_tx, _) = watch::channel(None);
        Self {
            db: Mutex::new(db),
            live: LiveRegistry::new(),
            commits: AtomicU64::new(0),
            auth_tx,
        }
    }

    /// Open the backend in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::new()?))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Number of live queries that still have a subscriber.
    pub fn live_subscriptions(&self) -> usize {
        self.live.active()
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run a write and fan the new state of `collection` out to live queries
    /// while still holding the connection, so snapshots keep commit order.
    /// Returns the write's result with its commit sequence.
    fn write<T>(
        &self,
        collection: &str,
        op: impl FnOnce(&Database) -> Result<T>,
    ) -> Result<(T, u64)> {
        let db = self.db()?;
        let out = op(&db)?;
        let seq = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        self.live.publish(&db, collection, seq);
        Ok((out, seq))
    }

    fn set_current(&self, user: Option<AuthUser>) {
        let changed = self.auth_tx.send_if_modified(|current| {
            let same = current.as_ref().map(|u| &u.uid) == user.as_ref().map(|u| &u.uid);
            if !same {
                *current = user;
            }
            !same
        });
        if changed {
            debug!("auth state transition published");
        }
    }

    fn current(&self) -> Option<AuthUser> {
        self.auth_tx.borrow().clone()
    }
}

fn internal(e: StoreError) -> AuthError {
    AuthError::new("auth/internal-error", e.to_string())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[async_trait]
impl DocumentStore for LocalBackend {
    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        let (body, _) = self.write(collection, |db| db.insert_document(collection, data))?;
        Ok(body["id"].as_str().unwrap_or_default().to_string())
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.write(collection, |db| db.put_document(collection, id, data))?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, changes: Vec<FieldUpdate>) -> Result<u64> {
        let (_, seq) = self.write(collection, |db| db.update_document(collection, id, &changes))?;
        Ok(seq)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.write(collection, |db| db.delete_document(collection, id))?.0)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.db()?.get_document(collection, id)
    }

    fn subscribe(&self, query: Query) -> Result<Subscription> {
        let db = self.db()?;
        let seq = self.commits.load(Ordering::SeqCst);
        let (id, rx) = self.live.register(&db, query, seq)?;
        Ok(Subscription::new(id, rx))
    }
}

#[async_trait]
impl IdentityProvider for LocalBackend {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        let account = {
            let db = self.db().map_err(internal)?;
            let account = db
                .find_account(email)
                .map_err(internal)?
                .ok_or_else(|| AuthError::new(AuthError::USER_NOT_FOUND, "There is no user record for this email."))?;
            if !db.verify_password(email, password).map_err(internal)? {
                return Err(AuthError::new(AuthError::WRONG_PASSWORD, "The password is invalid."));
            }
            account
        };

        let user = AuthUser {
            uid: account.uid,
            email: account.email,
            display_name: account.display_name,
        };
        info!(uid = %user.uid, "signed in");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        if !looks_like_email(email) {
            return Err(AuthError::new(AuthError::INVALID_EMAIL, "The email address is badly formatted."));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(
                AuthError::WEAK_PASSWORD,
                "Password should be at least 6 characters.",
            ));
        }

        let account = self
            .db()
            .map_err(internal)?
            .create_account(email, password)
            .map_err(internal)?
            .ok_or_else(|| {
                AuthError::new(
                    AuthError::EMAIL_IN_USE,
                    "The email address is already in use by another account.",
                )
            })?;

        let user = AuthUser {
            uid: account.uid,
            email: account.email,
            display_name: None,
        };
        info!(uid = %user.uid, "account created");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> std::result::Result<(), AuthError> {
        if let Some(user) = self.current() {
            info!(uid = %user.uid, "signed out");
        }
        self.set_current(None);
        Ok(())
    }

    async fn update_display_name(&self, name: &str) -> std::result::Result<(), AuthError> {
        let user = self
            .current()
            .ok_or_else(|| AuthError::new(AuthError::NOT_SIGNED_IN, "No user is signed in."))?;
        self.db()
            .map_err(internal)?
            .set_account_display_name(&user.uid, Some(name))
            .map_err(internal)?;

        // Profile changes are not pushed on the state stream.
        self.auth_tx.send_if_modified(|current| {
            if let Some(u) = current.as_mut() {
                u.display_name = Some(name.to_string());
            }
            false
        });
        Ok(())
    }

    fn auth_state(&self) -> watch::Receiver<Option<AuthUser>> {
        self.auth_tx.subscribe()
    }
}

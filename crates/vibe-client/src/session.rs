//! Session store.
//!
//! Bridges the identity provider's signed-in / signed-out stream into the
//! current route and profile. The profile record is loaded on every sign-in
//! transition and on demand through [`SessionStore::refresh`], because the
//! provider does not push profile document changes.
//!
//! Loads may overlap and finish out of order. Each takes a ticket before it
//! reads; a load only publishes its profile if no later ticket has published
//! already.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vibe_shared::constants::USERS;
use vibe_shared::models::Profile;
use vibe_store::{AuthUser, DocumentStore, IdentityProvider};

use crate::error::ClientError;
use crate::events::{EventSink, UiEvent};

/// Top-level screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Splash screen, shown for the configured intro delay.
    Intro,
    /// Credential entry.
    SignIn,
    /// Tabbed main screens.
    Main,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub route: Route,
    pub profile: Option<Profile>,
}

struct SessionInner {
    store: Arc<dyn DocumentStore>,
    auth_rx: watch::Receiver<Option<AuthUser>>,
    state_tx: watch::Sender<SessionState>,
    events: EventSink,
    tickets: AtomicU64,
    published: AtomicU64,
}

pub struct SessionStore {
    inner: Arc<SessionInner>,
    task: JoinHandle<()>,
}

impl SessionStore {
    /// Subscribe to `auth` and start routing once `intro_delay` has elapsed.
    /// Must be called from within a Tokio runtime.
    pub fn start(
        store: Arc<dyn DocumentStore>,
        auth: &dyn IdentityProvider,
        intro_delay: Duration,
        events: EventSink,
    ) -> Self {
        let auth_rx = auth.auth_state();
        let (state_tx, _) = watch::channel(SessionState {
            route: Route::Intro,
            profile: None,
        });

        let inner = Arc::new(SessionInner {
            store,
            auth_rx: auth_rx.clone(),
            state_tx,
            events,
            tickets: AtomicU64::new(0),
            published: AtomicU64::new(0),
        });

        let task = tokio::spawn(run(inner.clone(), auth_rx, intro_delay));
        Self { inner, task }
    }

    pub fn current(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn route(&self) -> Route {
        self.inner.state_tx.borrow().route
    }

    pub fn profile(&self) -> Option<Profile> {
        self.inner.state_tx.borrow().profile.clone()
    }

    /// The signed-in profile, or [`ClientError::NotSignedIn`].
    pub fn viewer(&self) -> Result<Profile, ClientError> {
        self.profile().ok_or(ClientError::NotSignedIn)
    }

    /// Re-fetch the profile record of the signed-in user. Returns what was
    /// read, even when a newer load had already published.
    pub async fn refresh(&self) -> Option<Profile> {
        let ticket = self.inner.ticket();
        let user = self.inner.auth_rx.borrow().clone()?;
        let profile = load_profile(self.inner.store.as_ref(), &user).await;
        let fresh = self.inner.state_tx.send_if_modified(|state| {
            let fresh = self.inner.claim(ticket);
            if fresh {
                state.profile = Some(profile.clone());
            }
            fresh
        });
        debug!(uid = %user.uid, ticket, fresh, "session profile refreshed");
        Some(profile)
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    inner: Arc<SessionInner>,
    mut auth_rx: watch::Receiver<Option<AuthUser>>,
    intro_delay: Duration,
) {
    tokio::time::sleep(intro_delay).await;

    loop {
        let user = auth_rx.borrow_and_update().clone();
        inner.apply(user).await;

        if auth_rx.changed().await.is_err() {
            debug!("identity provider went away, session listener stopped");
            break;
        }
    }
}

impl SessionInner {
    fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a load holding `ticket` may still publish.
    fn claim(&self, ticket: u64) -> bool {
        self.published.fetch_max(ticket, Ordering::SeqCst) <= ticket
    }

    async fn apply(&self, user: Option<AuthUser>) {
        let ticket = self.ticket();
        match user {
            Some(user) => {
                info!(uid = %user.uid, "session signed in");
                let profile = load_profile(self.store.as_ref(), &user).await;
                self.publish(ticket, Route::Main, Some(profile));
            }
            None => {
                info!("session signed out");
                self.publish(ticket, Route::SignIn, None);
            }
        }
    }

    /// Move to `route`. The profile is only replaced if `ticket` is the
    /// newest load to publish.
    fn publish(&self, ticket: u64, route: Route, profile: Option<Profile>) {
        let mut previous = route;
        self.state_tx.send_modify(|state| {
            previous = state.route;
            state.route = route;
            if self.claim(ticket) {
                state.profile = profile;
            } else {
                debug!(ticket, "stale profile load discarded");
            }
        });
        if previous != route {
            self.events.emit(UiEvent::RouteChanged(route));
        }
    }
}

/// Load the profile record for `user`, falling back to a placeholder when it
/// is missing, malformed or the read fails.
pub(crate) async fn load_profile(store: &dyn DocumentStore, user: &AuthUser) -> Profile {
    let placeholder = || Profile::placeholder(&user.uid, user.display_name.as_deref());

    match store.get(USERS, user.uid.as_str()).await {
        Ok(Some(body)) => match serde_json::from_value::<Profile>(body) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(uid = %user.uid, error = %e, "malformed profile record, using placeholder");
                placeholder()
            }
        },
        Ok(None) => {
            debug!(uid = %user.uid, "no profile record, using placeholder");
            placeholder()
        }
        Err(e) => {
            warn!(uid = %user.uid, error = %e, "profile fetch failed, using placeholder");
            placeholder()
        }
    }
}

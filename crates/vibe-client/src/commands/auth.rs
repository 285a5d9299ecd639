use tracing::{info, warn};

use vibe_shared::constants::USERS;
use vibe_shared::models::Profile;

use crate::client::{lock_ledger, Client};
use crate::error::ClientError;
use crate::optimistic::LikeLedger;

impl Client {
    /// Sign in with e-mail and password. Routing follows from the provider's
    /// auth state stream.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let user = self.auth.sign_in(email.trim(), password).await?;
        info!(uid = %user.uid, "signed in");
        Ok(())
    }

    /// Create an account and its profile record (post count 0, unverified).
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Profile, ClientError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ClientError::InvalidUsername);
        }

        let user = self.auth.sign_up(email.trim(), password).await?;
        if let Err(e) = self.auth.update_display_name(username).await {
            warn!(uid = %user.uid, error = %e, "could not set provider display name");
        }

        let profile = Profile::placeholder(&user.uid, Some(username));
        self.store
            .set(USERS, user.uid.as_str(), serde_json::to_value(&profile)?)
            .await?;
        info!(uid = %user.uid, username, "account created");

        // The auth stream fired before the record existed.
        self.session.refresh().await;
        Ok(profile)
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.auth.sign_out().await?;
        *lock_ledger(&self.likes) = LikeLedger::new();
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use vibe_shared::error::AuthError;
    use vibe_store::{DocumentStore, LocalBackend};

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Route;

    fn client() -> (Client, Arc<LocalBackend>) {
        let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
        let config = ClientConfig {
            intro_delay: Duration::ZERO,
            ..ClientConfig::default()
        };
        let (client, _events) = Client::new(backend.clone(), backend.clone(), config);
        (client, backend)
    }

    #[tokio::test]
    async fn sign_up_writes_profile_record() {
        let (client, backend) = client();
        let profile = client.sign_up("ada@vibe.app", "secret1", " ada ").await.unwrap();
        assert_eq!(profile.username, "ada");

        let record = backend.get(USERS, profile.id.as_str()).await.unwrap().unwrap();
        let stored: Profile = serde_json::from_value(record).unwrap();
        assert_eq!(stored.post_count, 0);
        assert!(!stored.verified);
    }

    #[tokio::test]
    async fn blank_username_is_rejected_before_sign_up() {
        let (client, _backend) = client();
        let err = client.sign_up("ada@vibe.app", "secret1", "  ").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidUsername));
    }

    #[tokio::test]
    async fn wrong_password_is_translated() {
        let (client, _backend) = client();
        client.sign_up("ada@vibe.app", "secret1", "ada").await.unwrap();
        client.sign_out().await.unwrap();

        let err = client.sign_in("ada@vibe.app", "nope123").await.unwrap_err();
        assert!(matches!(&err, ClientError::Auth(e) if e.code == AuthError::WRONG_PASSWORD));
        assert_eq!(err.user_message(), AuthError::new(AuthError::WRONG_PASSWORD, "").user_message());
    }

    #[tokio::test]
    async fn sign_out_routes_to_credentials() {
        let (client, _backend) = client();
        client.sign_up("ada@vibe.app", "secret1", "ada").await.unwrap();
        let mut state = client.session().watch();
        state.wait_for(|s| s.route == Route::Main).await.unwrap();

        client.sign_out().await.unwrap();
        state.wait_for(|s| s.route == Route::SignIn).await.unwrap();
    }
}

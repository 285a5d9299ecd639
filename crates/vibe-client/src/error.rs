use thiserror::Error;

use vibe_shared::error::{AuthError, MediaError};
use vibe_store::StoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Malformed document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Nothing to publish")]
    EmptyContent,

    #[error("Only the author can delete this post")]
    NotAuthor,

    #[error("Username must not be empty")]
    InvalidUsername,

    #[error("Invalid theme color `{0}`, expected #rrggbb")]
    InvalidThemeColor(String),

    #[error("A request is already in flight")]
    Busy,
}

impl ClientError {
    /// Text for inline error labels and alerts.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(e) => e.user_message(),
            Self::Media(e) => e.user_message(),
            Self::Store(_) => "Something went wrong. Please try again.".into(),
            other => other.to_string(),
        }
    }
}

use thiserror::Error;

/// An identity provider failure, carrying the provider's error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub const EMAIL_IN_USE: &'static str = "auth/email-already-in-use";
    pub const INVALID_EMAIL: &'static str = "auth/invalid-email";
    pub const WEAK_PASSWORD: &'static str = "auth/weak-password";
    pub const WRONG_PASSWORD: &'static str = "auth/wrong-password";
    pub const USER_NOT_FOUND: &'static str = "auth/user-not-found";
    pub const INVALID_CREDENTIAL: &'static str = "auth/invalid-credential";
    pub const NOT_SIGNED_IN: &'static str = "auth/no-current-user";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Message for the credential screen. Known codes are translated, anything
    /// else is shown as the provider reported it.
    pub fn user_message(&self) -> String {
        match self.code.as_str() {
            Self::EMAIL_IN_USE => "This email is already registered.".into(),
            Self::INVALID_EMAIL => "Please enter a valid email address.".into(),
            Self::WEAK_PASSWORD => "Password must be at least 6 characters.".into(),
            Self::WRONG_PASSWORD | Self::INVALID_CREDENTIAL => {
                "Email or password is incorrect.".into()
            }
            Self::USER_NOT_FOUND => "No account found for this email.".into(),
            _ => self.message.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Image is too large ({size} bytes, max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Invalid inline image data")]
    InvalidDataUrl,

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl MediaError {
    /// Message shown next to the image picker.
    pub fn user_message(&self) -> String {
        match self {
            Self::TooLarge { max, .. } => {
                format!("Image is too large. Maximum size is {}.", human_size(*max))
            }
            Self::UnsupportedFormat => "Please choose a PNG, JPEG or WebP image.".into(),
            other => other.to_string(),
        }
    }
}

fn human_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{} KB", bytes / KB)
    }
}

use serde_json::Value;
use tracing::{info, warn};

use vibe_shared::constants::USERS;
use vibe_shared::media::InlineImage;
use vibe_shared::models::Profile;
use vibe_store::{FieldUpdate, StoreError};

use crate::client::Client;
use crate::error::ClientError;
use crate::machines::PendingWrite;

/// Values of the settings form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileEdit {
    pub username: String,
    pub bio: String,
    pub university: String,
    pub department: String,
    pub theme_color: String,
    /// Replacement avatar from the cropper; `None` keeps the current one.
    pub avatar: Option<InlineImage>,
}

impl ProfileEdit {
    /// Pre-fill the form from the current profile.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
            bio: profile.bio.clone().unwrap_or_default(),
            university: profile.university.clone().unwrap_or_default(),
            department: profile.department.clone().unwrap_or_default(),
            theme_color: profile.theme_color.clone().unwrap_or_default(),
            avatar: None,
        }
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.username.trim().is_empty() {
            return Err(ClientError::InvalidUsername);
        }
        let color = self.theme_color.trim();
        if !color.is_empty() && !is_hex_color(color) {
            return Err(ClientError::InvalidThemeColor(color.to_string()));
        }
        Ok(())
    }

    fn apply_to(&self, profile: &mut Profile) {
        profile.username = self.username.trim().to_string();
        profile.bio = optional(&self.bio);
        profile.university = optional(&self.university);
        profile.department = optional(&self.department);
        profile.theme_color = optional(&self.theme_color).map(|c| c.to_ascii_lowercase());
        if let Some(avatar) = &self.avatar {
            profile.avatar = avatar.as_str().to_string();
        }
    }
}

fn optional(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

/// `#rrggbb`, case-insensitive.
fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Client {
    /// Save the settings form and refresh the session so every screen shows
    /// the new values. Posts and messages already published keep the author
    /// details they were created with.
    pub async fn save_profile(&self, edit: &ProfileEdit) -> Result<Profile, ClientError> {
        let viewer = self.session.viewer()?;
        edit.validate()?;
        let _guard = self.in_flight.begin(PendingWrite::ProfileSave)?;

        let mut updated = viewer.clone();
        edit.apply_to(&mut updated);

        if let Err(e) = self.write_profile(&updated).await {
            self.report_write_failure("save_profile", &e);
            return Err(e);
        }
        if updated.username != viewer.username {
            if let Err(e) = self.auth.update_display_name(&updated.username).await {
                warn!(uid = %updated.id, error = %e, "could not update provider display name");
            }
        }
        info!(uid = %updated.id, "profile saved");

        Ok(self.session.refresh().await.unwrap_or(updated))
    }

    async fn write_profile(&self, profile: &Profile) -> Result<(), ClientError> {
        let changes = vec![
            FieldUpdate::set("username", profile.username.clone()),
            FieldUpdate::set("avatar", profile.avatar.clone()),
            FieldUpdate::set("bio", nullable(&profile.bio)),
            FieldUpdate::set("university", nullable(&profile.university)),
            FieldUpdate::set("department", nullable(&profile.department)),
            FieldUpdate::set("themeColor", nullable(&profile.theme_color)),
        ];
        match self.store.update(USERS, profile.id.as_str(), changes).await {
            Ok(_) => Ok(()),
            // Still on a synthesized profile: write the whole record.
            Err(StoreError::NotFound { .. }) => {
                self.store
                    .set(USERS, profile.id.as_str(), serde_json::to_value(profile)?)
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn nullable(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#a1B2c3"));
        assert!(!is_hex_color("a1b2c3"));
        assert!(!is_hex_color("#a1b2c"));
        assert!(!is_hex_color("#gggggg"));
        assert!(!is_hex_color("#ééé"));
    }

    #[test]
    fn edit_round_trips_profile_fields() {
        let mut profile = Profile::placeholder(&"u1".into(), Some("ada"));
        profile.bio = Some("hi".into());
        let mut edit = ProfileEdit::from_profile(&profile);
        assert_eq!(edit.username, "ada");
        assert_eq!(edit.bio, "hi");

        edit.bio = "  ".into();
        edit.theme_color = "#FF00AA".into();
        edit.apply_to(&mut profile);
        assert_eq!(profile.bio, None);
        assert_eq!(profile.theme_color.as_deref(), Some("#ff00aa"));
    }

    #[test]
    fn invalid_theme_color_is_rejected() {
        let edit = ProfileEdit {
            username: "ada".into(),
            theme_color: "red".into(),
            ..ProfileEdit::default()
        };
        assert!(matches!(edit.validate(), Err(ClientError::InvalidThemeColor(c)) if c == "red"));
    }
}

//! Draft state of the post and story composers.

use vibe_shared::media::{ImageKind, InlineImage};

use crate::error::ClientError;

/// Text, pending image and in-flight flag of one composer form.
#[derive(Debug, Clone, PartialEq)]
pub struct Composer {
    kind: ImageKind,
    pub text: String,
    pending_image: Option<InlineImage>,
    error: Option<String>,
    submitting: bool,
}

impl Composer {
    pub fn new(kind: ImageKind) -> Self {
        Self {
            kind,
            text: String::new(),
            pending_image: None,
            error: None,
            submitting: false,
        }
    }

    pub fn for_post() -> Self {
        Self::new(ImageKind::Post)
    }

    pub fn for_story() -> Self {
        Self::new(ImageKind::Story)
    }

    /// Attach a selected file. A rejected file leaves the pending image
    /// untouched and sets the inline error instead.
    pub fn select_image(&mut self, bytes: &[u8]) -> bool {
        match InlineImage::encode(bytes, self.kind) {
            Ok(image) => {
                self.pending_image = Some(image);
                self.error = None;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "image selection rejected");
                self.error = Some(e.user_message());
                false
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.pending_image = None;
    }

    pub fn pending_image(&self) -> Option<&InlineImage> {
        self.pending_image.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the submit control is disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Mark the form in flight. Fails if it already is.
    pub(crate) fn begin_submit(&mut self) -> Result<(), ClientError> {
        if self.submitting {
            return Err(ClientError::Busy);
        }
        self.submitting = true;
        self.error = None;
        Ok(())
    }

    /// The write settled successfully: reset the form.
    pub(crate) fn finish_ok(&mut self) {
        *self = Self::new(self.kind);
    }

    /// The write failed: keep the draft and re-enable the control.
    pub(crate) fn finish_err(&mut self, err: &ClientError) {
        self.submitting = false;
        self.error = Some(err.user_message());
    }
}

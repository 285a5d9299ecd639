//! Avatar crop / zoom editor.

use vibe_shared::constants::MIN_ZOOM;
use vibe_shared::error::MediaError;
use vibe_shared::media::{clamp_zoom, crop_center, ImageKind, InlineImage};

#[derive(Debug, Clone, PartialEq)]
pub enum CropState {
    Idle,
    Editing { source: InlineImage, zoom: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCropper {
    kind: ImageKind,
    state: CropState,
}

impl ImageCropper {
    pub fn new(kind: ImageKind) -> Self {
        Self {
            kind,
            state: CropState::Idle,
        }
    }

    pub fn state(&self) -> &CropState {
        &self.state
    }

    /// Load a source image and enter editing at zoom 1.0. An oversize or
    /// unreadable file leaves the cropper as it was.
    pub fn select(&mut self, bytes: &[u8]) -> Result<(), MediaError> {
        let source = InlineImage::encode(bytes, self.kind)?;
        self.state = CropState::Editing {
            source,
            zoom: MIN_ZOOM,
        };
        Ok(())
    }

    /// Set the zoom, clamped to the allowed range. Ignored while idle.
    pub fn set_zoom(&mut self, value: f32) {
        if let CropState::Editing { zoom, .. } = &mut self.state {
            *zoom = clamp_zoom(value);
        }
    }

    pub fn zoom(&self) -> Option<f32> {
        match &self.state {
            CropState::Editing { zoom, .. } => Some(*zoom),
            CropState::Idle => None,
        }
    }

    /// Commit the region visible in the preview and return to idle.
    /// Returns `Ok(None)` when nothing was being edited. On a decode error
    /// the editor stays open so the user can cancel or pick another file.
    pub fn confirm(&mut self) -> Result<Option<InlineImage>, MediaError> {
        let CropState::Editing { source, zoom } = &self.state else {
            return Ok(None);
        };
        let cropped = crop_center(source, *zoom)?;
        self.state = CropState::Idle;
        Ok(Some(cropped))
    }

    /// Drop the pending image and return to idle.
    pub fn cancel(&mut self) {
        self.state = CropState::Idle;
    }
}

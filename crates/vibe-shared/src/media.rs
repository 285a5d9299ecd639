//! Image input boundary.
//!
//! Images never leave the client as files: a selected image is size-checked,
//! sniffed for a supported format and embedded as a `data:` URL inside the
//! document that references it. Cropping decodes the source, extracts the
//! visible region and re-encodes it as PNG.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::constants::{
    MAX_AVATAR_IMAGE_SIZE, MAX_POST_IMAGE_SIZE, MAX_STORY_IMAGE_SIZE, MAX_ZOOM, MIN_ZOOM,
};
use crate::error::MediaError;

/// Where a selected image is going; each target has its own size cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Post,
    Story,
    Avatar,
}

impl ImageKind {
    pub fn max_bytes(self) -> usize {
        match self {
            Self::Post => MAX_POST_IMAGE_SIZE,
            Self::Story => MAX_STORY_IMAGE_SIZE,
            Self::Avatar => MAX_AVATAR_IMAGE_SIZE,
        }
    }
}

/// An image embedded as a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage(String);

impl InlineImage {
    /// Validate and encode raw file bytes selected by the user.
    pub fn encode(bytes: &[u8], kind: ImageKind) -> Result<Self, MediaError> {
        let max = kind.max_bytes();
        if bytes.len() > max {
            return Err(MediaError::TooLarge {
                size: bytes.len(),
                max,
            });
        }
        let format = image::guess_format(bytes).map_err(|_| MediaError::UnsupportedFormat)?;
        if !matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
        ) {
            return Err(MediaError::UnsupportedFormat);
        }
        Ok(Self::from_parts(format.to_mime_type(), bytes))
    }

    fn from_parts(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// Wrap an existing `data:` URL read back from a document.
    pub fn parse(data_url: &str) -> Result<Self, MediaError> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or(MediaError::InvalidDataUrl)?;
        if !rest.contains(";base64,") {
            return Err(MediaError::InvalidDataUrl);
        }
        Ok(Self(data_url.to_string()))
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or_default()
    }

    /// Decode the embedded payload back into raw file bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MediaError> {
        let (_, payload) = self
            .0
            .split_once(";base64,")
            .ok_or(MediaError::InvalidDataUrl)?;
        Ok(STANDARD.decode(payload)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Clamp a zoom factor into the cropper's allowed range.
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Extract the centered square region visible at `zoom` and return it as PNG.
///
/// At zoom 1.0 the region is the largest centered square; at zoom `z` its
/// side is that square's side divided by `z`.
pub fn crop_center(source: &InlineImage, zoom: f32) -> Result<InlineImage, MediaError> {
    let bytes = source.to_bytes()?;
    let img = image::load_from_memory(&bytes)?;

    let (width, height) = (img.width(), img.height());
    let full_side = width.min(height);
    let side = ((full_side as f32 / clamp_zoom(zoom)).round() as u32).clamp(1, full_side.max(1));
    let x = (width - side) / 2;
    let y = (height - side) / 2;

    let cropped = img.crop_imm(x, y, side, side);

    let mut out = Vec::new();
    cropped.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(InlineImage::from_parts("image/png", &out))
}

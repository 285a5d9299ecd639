//! # vibe-shared
//!
//! Types shared by every VIBE crate: the document models persisted in the
//! backing store, opaque identifiers, tunable constants, the error taxonomy
//! and the image input boundary.

pub mod constants;
pub mod error;
pub mod media;
pub mod models;
pub mod types;

pub use error::{AuthError, MediaError};

//! Ephemeral UI state machines.
//!
//! None of these touch the store; they hold per-screen state between user
//! gestures and hand finished values to the commands.

pub mod composer;
pub mod cropper;
pub mod in_flight;
pub mod overlay;
pub mod reply;
pub mod story;

pub use composer::Composer;
pub use cropper::{CropState, ImageCropper};
pub use in_flight::{InFlight, PendingWrite, WriteGuard};
pub use overlay::Overlay;
pub use reply::ReplyContext;
pub use story::{PlaybackState, StoryPlayback, StoryPlayer};

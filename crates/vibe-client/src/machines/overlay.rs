use vibe_shared::types::{PostId, StoryId};

/// The single modal overlay shown above a screen. Opening one replaces
/// whatever was open before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    Composer,
    Comments(PostId),
    StoryComposer,
    StoryViewer(StoryId),
}

impl Overlay {
    /// Replace the current overlay, returning the one that was closed.
    pub fn open(&mut self, next: Overlay) -> Overlay {
        std::mem::replace(self, next)
    }

    pub fn close(&mut self) -> Overlay {
        std::mem::take(self)
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Overlay::None)
    }
}

/// Application name
pub const APP_NAME: &str = "VIBE";

/// Maximum post image size in bytes (500 KB)
pub const MAX_POST_IMAGE_SIZE: usize = 500 * 1024;

/// Maximum story image size in bytes (2 MB)
pub const MAX_STORY_IMAGE_SIZE: usize = 2 * 1024 * 1024;

/// Maximum avatar source image size in bytes (2 MB)
pub const MAX_AVATAR_IMAGE_SIZE: usize = 2 * 1024 * 1024;

/// Zoom bounds for the image cropper.
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 3.0;

/// Story playback: progress added per tick, and the value that closes the viewer.
pub const STORY_TICK_STEP: u32 = 2;
pub const STORY_PROGRESS_MAX: u32 = 100;

/// Default interval between story ticks in milliseconds (5 s per story).
pub const STORY_TICK_MS: u64 = 100;

/// Splash screen duration before the first route is shown.
pub const INTRO_DELAY_MS: u64 = 2_000;

/// Reply quotes keep this many characters of the target text.
pub const REPLY_QUOTE_CHARS: usize = 50;

/// Reply quotes keep this many characters of the target author name.
pub const REPLY_AUTHOR_CHARS: usize = 20;

/// Live query windows.
pub const POSTS_LIMIT: usize = 50;
pub const STORIES_LIMIT: usize = 20;
pub const CHAT_LIMIT: usize = 50;
pub const NOTIFICATIONS_LIMIT: usize = 20;
pub const COMMENTS_LIMIT: usize = 100;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Placeholder avatar service, seeded with the user id.
pub const AVATAR_PLACEHOLDER_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// Gradient used for text-only stories when none is chosen.
pub const DEFAULT_STORY_BACKGROUND: &str = "sunset";

/// Collection names in the document store.
pub const USERS: &str = "users";
pub const POSTS: &str = "posts";
pub const STORIES: &str = "stories";
pub const CHAT: &str = "chat";
pub const NOTIFICATIONS: &str = "notifications";
pub const NOTIFICATION_READS: &str = "notification_reads";

/// Ordering field stamped by the store on every created document.
pub const CREATED_AT: &str = "createdAt";

/// Comments live in a sub-collection scoped to their post.
pub fn comments_collection(post_id: &str) -> String {
    format!("{POSTS}/{post_id}/comments")
}

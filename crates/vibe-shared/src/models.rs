//! Document models as stored in the backing document store.
//!
//! Field names follow the store's camelCase schema. `id` and `createdAt` are
//! stamped by the store on creation, so every model has a matching `*Draft`
//! type (or is written with an explicit key) for the write side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    AVATAR_PLACEHOLDER_URL, DEFAULT_STORY_BACKGROUND, REPLY_AUTHOR_CHARS, REPLY_QUOTE_CHARS,
};
use crate::types::{CommentId, MessageId, NotificationId, PostId, StoryId, UserId};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A user profile, keyed by the identity id in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub theme_color: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub staff: bool,
    #[serde(default)]
    pub post_count: i64,
}

impl Profile {
    /// Profile synthesized when the store has no record for a signed-in user.
    pub fn placeholder(id: &UserId, display_name: Option<&str>) -> Self {
        let username = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("user_{}", short_id(id)));

        Self {
            id: id.clone(),
            username,
            avatar: placeholder_avatar(id),
            bio: None,
            university: None,
            department: None,
            theme_color: None,
            verified: false,
            staff: false,
            post_count: 0,
        }
    }
}

/// Deterministic placeholder avatar for an identity.
pub fn placeholder_avatar(id: &UserId) -> String {
    format!("{AVATAR_PLACEHOLDER_URL}{}", id.as_str())
}

fn short_id(id: &UserId) -> String {
    id.as_str().chars().take(6).collect()
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A feed post. Badge and education fields are copied from the author when
/// the post is created and never refreshed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    pub content: String,
    pub image: Option<String>,
    pub likes: i64,
    pub comment_count: i64,
    pub verified: bool,
    pub university: Option<String>,
    pub department: Option<String>,
}

impl PostDraft {
    pub fn new(author: &Profile, content: String, image: Option<String>) -> Self {
        Self {
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            author_avatar: author.avatar.clone(),
            content,
            image,
            likes: 0,
            comment_count: 0,
            verified: author.verified,
            university: author.university.clone(),
            department: author.department.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment in a post's `comments` sub-collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    pub text: String,
}

impl CommentDraft {
    pub fn new(author: &Profile, text: String) -> Self {
        Self {
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            author_avatar: author.avatar.clone(),
            text,
        }
    }
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

/// An ephemeral story. `viewed` is carried for schema compatibility only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default = "default_background")]
    pub background: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub viewed: bool,
}

fn default_background() -> String {
    DEFAULT_STORY_BACKGROUND.to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryDraft {
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    pub image: Option<String>,
    pub text: Option<String>,
    pub background: String,
    pub viewed: bool,
}

impl StoryDraft {
    pub fn new(
        author: &Profile,
        image: Option<String>,
        text: Option<String>,
        background: Option<String>,
    ) -> Self {
        Self {
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            author_avatar: author.avatar.clone(),
            image,
            text,
            background: background.unwrap_or_else(default_background),
            viewed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Quoted snapshot of the message being replied to, frozen at send time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    pub id: MessageId,
    pub author: String,
    pub text: String,
}

impl ReplyRef {
    pub fn quote(target: &ChatMessage) -> Self {
        Self {
            id: target.id.clone(),
            author: truncate_with_ellipsis(&target.author_name, REPLY_AUTHOR_CHARS),
            text: truncate_with_ellipsis(&target.text, REPLY_QUOTE_CHARS),
        }
    }
}

/// A message in the single global chat channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reply_to: Option<ReplyRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDraft {
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub reply_to: Option<ReplyRef>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Post,
    Story,
    Like,
    Follow,
}

/// A global notification. Read state is tracked per viewer through
/// [`NotificationRead`] markers; the legacy `read` flag is never written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub actor_id: UserId,
    pub actor_name: String,
    pub actor_avatar: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub actor_id: UserId,
    pub actor_name: String,
    pub actor_avatar: String,
    pub message: String,
    pub read: bool,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, actor: &Profile) -> Self {
        let message = match kind {
            NotificationKind::Post => format!("{} shared a new post", actor.username),
            NotificationKind::Story => format!("{} added a new story", actor.username),
            NotificationKind::Like => format!("{} liked a post", actor.username),
            NotificationKind::Follow => format!("{} started following you", actor.username),
        };
        Self {
            kind,
            actor_id: actor.id.clone(),
            actor_name: actor.username.clone(),
            actor_avatar: actor.avatar.clone(),
            message,
            read: false,
        }
    }
}

/// Join record marking one notification as read by one viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRead {
    pub viewer_id: UserId,
    pub notification_id: NotificationId,
}

impl NotificationRead {
    pub fn key(viewer: &UserId, notification: &NotificationId) -> String {
        format!("{viewer}:{notification}")
    }
}

/// Keep at most `max` characters, appending `...` when something was cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new("m1"),
            author_id: UserId::new("u1"),
            author_name: "a very long display name indeed".into(),
            text: text.into(),
            created_at: Utc::now(),
            reply_to: None,
        }
    }

    #[test]
    fn short_text_is_quoted_verbatim() {
        let quote = ReplyRef::quote(&message("hello"));
        assert_eq!(quote.text, "hello");
        assert_eq!(quote.id, MessageId::new("m1"));
    }

    #[test]
    fn long_text_is_cut_at_fifty_chars() {
        let text = "x".repeat(80);
        let quote = ReplyRef::quote(&message(&text));
        assert_eq!(quote.text, format!("{}...", "x".repeat(50)));
        assert_eq!(quote.author, "a very long display ...");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "é".repeat(50);
        assert_eq!(truncate_with_ellipsis(&text, 50), text);
    }

    #[test]
    fn placeholder_profile_is_deterministic() {
        let id = UserId::new("abcdef123");
        let a = Profile::placeholder(&id, None);
        let b = Profile::placeholder(&id, None);
        assert_eq!(a, b);
        assert_eq!(a.username, "user_abcdef");
        assert!(a.avatar.ends_with("abcdef123"));
        assert_eq!(a.post_count, 0);
    }

    #[test]
    fn placeholder_uses_display_name() {
        let p = Profile::placeholder(&UserId::new("x"), Some("  ada "));
        assert_eq!(p.username, "ada");
    }

    #[test]
    fn notification_kind_uses_lowercase_tags() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::Like).unwrap(),
            "\"like\""
        );
    }

    #[test]
    fn post_deserializes_with_missing_counters() {
        let json = serde_json::json!({
            "id": "p1",
            "authorId": "u1",
            "authorName": "ada",
            "authorAvatar": "a.png",
            "content": "hi",
            "createdAt": "2024-01-01T00:00:00Z",
        });
        let post: Post = serde_json::from_value(json).unwrap();
        assert_eq!(post.likes, 0);
        assert_eq!(post.image, None);
    }
}

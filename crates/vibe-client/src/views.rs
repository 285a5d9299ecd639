//! View composition.
//!
//! Pure projections from live windows, the session and the like ledger to
//! what each tab renders, plus [`FeedScreen`], which owns the home tab's
//! subscriptions and its overlay.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use vibe_shared::models::{
    ChatMessage, Comment, Notification, NotificationRead, Post, Profile, Story,
};
use vibe_shared::types::{NotificationId, PostId, StoryId, UserId};

use crate::client::Client;
use crate::error::ClientError;
use crate::live::LiveCollection;
use crate::machines::{Overlay, StoryPlayer};
use crate::optimistic::LikeView;

/// Bottom navigation tabs of the main route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Home,
    Chat,
    Notifications,
    Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub post: Post,
    pub likes: LikeView,
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub message: ChatMessage,
    pub is_own: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationItem {
    pub notification: Notification,
    pub unread: bool,
}

/// Author shown at the top of the post and story composers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerContext {
    pub author_name: String,
    pub author_avatar: String,
}

impl ComposerContext {
    pub fn for_profile(profile: &Profile) -> Self {
        Self {
            author_name: profile.username.clone(),
            author_avatar: profile.avatar.clone(),
        }
    }
}

impl Client {
    /// Feed rows with the viewer's like state layered over the window.
    pub fn feed_items(&self, posts: &[Post]) -> Vec<FeedItem> {
        let viewer = self.session.profile().map(|p| p.id);
        posts
            .iter()
            .map(|post| FeedItem {
                likes: self.like_view(post),
                can_delete: viewer.as_ref() == Some(&post.author_id),
                post: post.clone(),
            })
            .collect()
    }

    /// Author context for the composers, once a profile is loaded.
    pub fn composer_context(&self) -> Option<ComposerContext> {
        self.session.profile().as_ref().map(ComposerContext::for_profile)
    }

    /// Open the home tab: posts and stories windows, no overlay.
    pub fn open_feed(&self) -> Result<FeedScreen, ClientError> {
        Ok(FeedScreen {
            posts: self.open_posts()?,
            stories: self.open_stories()?,
            overlay: Arc::new(watch::channel(Overlay::None).0),
            comments: None,
            player: None,
        })
    }
}

pub fn chat_lines(messages: &[ChatMessage], viewer: &UserId) -> Vec<ChatLine> {
    messages
        .iter()
        .map(|m| ChatLine {
            is_own: &m.author_id == viewer,
            message: m.clone(),
        })
        .collect()
}

fn read_ids(reads: &[NotificationRead]) -> HashSet<&NotificationId> {
    reads.iter().map(|r| &r.notification_id).collect()
}

/// Notification rows for a viewer, given that viewer's read markers.
pub fn notification_items(
    notifications: &[Notification],
    reads: &[NotificationRead],
) -> Vec<NotificationItem> {
    let read = read_ids(reads);
    notifications
        .iter()
        .map(|n| NotificationItem {
            unread: !read.contains(&n.id),
            notification: n.clone(),
        })
        .collect()
}

/// Badge count for the notifications tab.
pub fn unread_count(notifications: &[Notification], reads: &[NotificationRead]) -> usize {
    let read = read_ids(reads);
    notifications.iter().filter(|n| !read.contains(&n.id)).count()
}

/// The home tab while it is mounted. Dropping it tears down its
/// subscriptions and any running story timer.
pub struct FeedScreen {
    posts: LiveCollection<Post>,
    stories: LiveCollection<Story>,
    overlay: Arc<watch::Sender<Overlay>>,
    comments: Option<LiveCollection<Comment>>,
    player: Option<StoryPlayer>,
}

impl FeedScreen {
    pub fn posts(&self) -> &LiveCollection<Post> {
        &self.posts
    }

    pub fn stories(&self) -> &LiveCollection<Story> {
        &self.stories
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay.borrow().clone()
    }

    pub fn watch_overlay(&self) -> watch::Receiver<Overlay> {
        self.overlay.subscribe()
    }

    /// Show `next`, closing whatever overlay was open. A running story
    /// viewer is dismissed and an open comment thread is unsubscribed.
    pub fn open_overlay(&mut self, next: Overlay) {
        self.stop_story();
        self.comments = None;
        let previous = self.overlay.send_replace(next);
        debug!(?previous, "overlay changed");
    }

    pub fn close_overlay(&mut self) {
        self.open_overlay(Overlay::None);
    }

    /// Open the comment thread of `post`.
    pub fn open_comments(&mut self, client: &Client, post: PostId) -> Result<(), ClientError> {
        let thread = client.open_comments(&post)?;
        self.open_overlay(Overlay::Comments(post));
        self.comments = Some(thread);
        Ok(())
    }

    pub fn comments(&self) -> Option<&LiveCollection<Comment>> {
        self.comments.as_ref()
    }

    /// Open the story viewer on `story`. The overlay closes by itself when
    /// playback runs out.
    pub fn view_story(&mut self, client: &Client, story: StoryId) {
        self.open_overlay(Overlay::StoryViewer(story.clone()));

        let overlay = self.overlay.clone();
        self.player = Some(client.play_story(move || {
            overlay.send_if_modified(|current| {
                if *current == Overlay::StoryViewer(story) {
                    current.close();
                    true
                } else {
                    false
                }
            });
        }));
    }

    pub fn story_player(&self) -> Option<&StoryPlayer> {
        self.player.as_ref()
    }

    fn stop_story(&mut self) {
        if let Some(player) = self.player.take() {
            player.dismiss();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vibe_shared::models::NotificationKind;

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.into(),
            kind: NotificationKind::Post,
            actor_id: "u1".into(),
            actor_name: "ada".into(),
            actor_avatar: String::new(),
            message: "ada shared a new post".into(),
            created_at: Utc::now(),
            read: false,
        }
    }

    #[test]
    fn unread_ignores_shared_flag() {
        let mut globally_read = notification("n1");
        globally_read.read = true;
        let notes = vec![globally_read, notification("n2")];
        let reads = vec![NotificationRead {
            viewer_id: "u2".into(),
            notification_id: "n2".into(),
        }];

        assert_eq!(unread_count(&notes, &reads), 1);
        let items = notification_items(&notes, &reads);
        assert!(items[0].unread);
        assert!(!items[1].unread);
    }

    #[test]
    fn own_chat_lines_are_flagged() {
        let message = |author: &str| ChatMessage {
            id: "m".into(),
            author_id: author.into(),
            author_name: author.into(),
            text: "hi".into(),
            created_at: Utc::now(),
            reply_to: None,
        };
        let lines = chat_lines(&[message("u1"), message("u2")], &"u1".into());
        assert!(lines[0].is_own);
        assert!(!lines[1].is_own);
    }
}

//! Live collection subscriptions.
//!
//! A [`LiveCollection`] owns one live query. Every snapshot the store
//! delivers is decoded and fully replaces the previous contents; nothing is
//! merged across snapshots. Read errors are logged and the last known window
//! is kept. Dropping the collection cancels the background task, which drops
//! the store subscription with it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use vibe_shared::constants::{
    comments_collection, CHAT, COMMENTS_LIMIT, NOTIFICATIONS, NOTIFICATION_READS, POSTS, STORIES,
};
use vibe_shared::types::{PostId, UserId};
use vibe_store::{DocumentStore, Query, Subscription};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// A named live query plus how its window is presented.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSpec {
    pub name: &'static str,
    pub query: Query,
    /// Fetch newest-first, then present oldest-first (chat reads top-down).
    pub chronological: bool,
}

impl StreamSpec {
    pub fn posts(config: &ClientConfig) -> Self {
        Self::latest("posts", Query::latest(POSTS, config.posts_limit))
    }

    pub fn stories(config: &ClientConfig) -> Self {
        Self::latest("stories", Query::latest(STORIES, config.stories_limit))
    }

    pub fn chat(config: &ClientConfig) -> Self {
        Self {
            name: "chat",
            query: Query::latest(CHAT, config.chat_limit),
            chronological: true,
        }
    }

    pub fn notifications(config: &ClientConfig) -> Self {
        Self::latest(
            "notifications",
            Query::latest(NOTIFICATIONS, config.notifications_limit),
        )
    }

    /// The newest comments on one post, presented oldest first.
    pub fn comments(post: &PostId) -> Self {
        Self {
            name: "comments",
            query: Query::latest(comments_collection(post.as_str()), COMMENTS_LIMIT),
            chronological: true,
        }
    }

    /// Read markers written by one viewer.
    pub fn notification_reads(viewer: &UserId, config: &ClientConfig) -> Self {
        Self::latest(
            "notification_reads",
            Query::latest(NOTIFICATION_READS, config.notifications_limit.saturating_mul(5))
                .where_eq("viewerId", viewer.as_str()),
        )
    }

    fn latest(name: &'static str, query: Query) -> Self {
        Self {
            name,
            query,
            chronological: false,
        }
    }
}

/// Callback invoked with every decoded window and its commit sequence,
/// before the window is published.
pub type SnapshotHook<T> = Box<dyn Fn(&[T], u64) + Send + Sync>;

pub struct LiveCollection<T> {
    name: &'static str,
    rx: watch::Receiver<Arc<Vec<T>>>,
    task: JoinHandle<()>,
}

impl<T> LiveCollection<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Open `spec` against `store`. Must be called from within a Tokio runtime.
    pub fn open(store: &dyn DocumentStore, spec: StreamSpec) -> Result<Self, ClientError> {
        Self::open_with(store, spec, None)
    }

    /// Like [`LiveCollection::open`], calling `hook` on every snapshot.
    pub fn open_with(
        store: &dyn DocumentStore,
        spec: StreamSpec,
        hook: Option<SnapshotHook<T>>,
    ) -> Result<Self, ClientError> {
        let subscription = store.subscribe(spec.query.clone())?;
        let (tx, rx) = watch::channel(Arc::new(Vec::new()));
        let name = spec.name;
        let task = tokio::spawn(pump(subscription, spec, tx, hook));
        debug!(stream = name, "live collection opened");
        Ok(Self { name, rx, task })
    }
}

impl<T> LiveCollection<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The most recent window.
    pub fn current(&self) -> Arc<Vec<T>> {
        self.rx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_empty()
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.rx.clone()
    }
}

impl<T> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        debug!(stream = self.name, "live collection closed");
        self.task.abort();
    }
}

async fn pump<T>(
    mut subscription: Subscription,
    spec: StreamSpec,
    tx: watch::Sender<Arc<Vec<T>>>,
    hook: Option<SnapshotHook<T>>,
) where
    T: DeserializeOwned + Send + Sync + 'static,
{
    while let Some(result) = subscription.next().await {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(stream = spec.name, error = %e, "snapshot failed, keeping last window");
                continue;
            }
        };

        let mut items: Vec<T> = Vec::with_capacity(snapshot.documents.len());
        for doc in snapshot.documents {
            match serde_json::from_value::<T>(doc) {
                Ok(item) => items.push(item),
                Err(e) => warn!(stream = spec.name, error = %e, "skipping malformed document"),
            }
        }
        if spec.chronological {
            items.reverse();
        }

        if let Some(hook) = &hook {
            hook(&items, snapshot.seq);
        }
        debug!(stream = spec.name, seq = snapshot.seq, count = items.len(), "snapshot applied");
        tx.send_replace(Arc::new(items));
    }
    debug!(stream = spec.name, "subscription ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vibe_shared::models::{ChatMessage, Comment};
    use vibe_store::{LocalBackend, Snapshot, StoreError};

    async fn chat_line(store: &LocalBackend, text: &str) -> String {
        store
            .create(CHAT, json!({ "authorId": "u1", "authorName": "ada", "text": text }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn chat_window_is_chronological() {
        let store = LocalBackend::open_in_memory().unwrap();
        for text in ["one", "two", "three"] {
            chat_line(&store, text).await;
        }
        let config = ClientConfig {
            chat_limit: 2,
            ..ClientConfig::default()
        };

        let chat: LiveCollection<ChatMessage> =
            LiveCollection::open(&store, StreamSpec::chat(&config)).unwrap();
        let mut rx = chat.watch();
        let window = rx.wait_for(|w| !w.is_empty()).await.unwrap().clone();
        let texts: Vec<&str> = window.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn snapshot_replaces_previous_window() {
        let store = LocalBackend::open_in_memory().unwrap();
        let a = chat_line(&store, "a").await;
        chat_line(&store, "b").await;

        let chat: LiveCollection<ChatMessage> =
            LiveCollection::open(&store, StreamSpec::chat(&ClientConfig::default())).unwrap();
        let mut rx = chat.watch();
        rx.wait_for(|w| w.len() == 2).await.unwrap();

        store.delete(CHAT, &a).await.unwrap();
        let window = rx.wait_for(|w| w.len() == 1).await.unwrap().clone();
        assert_eq!(window[0].text, "b");
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped() {
        let store = LocalBackend::open_in_memory().unwrap();
        store.create(CHAT, json!({ "unexpected": true })).await.unwrap();
        chat_line(&store, "ok").await;

        let chat: LiveCollection<ChatMessage> =
            LiveCollection::open(&store, StreamSpec::chat(&ClientConfig::default())).unwrap();
        let window = chat.watch().wait_for(|w| !w.is_empty()).await.unwrap().clone();
        assert_eq!(window.len(), 1);
    }

    #[tokio::test]
    async fn hook_sees_every_snapshot() {
        let store = LocalBackend::open_in_memory().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let hook: SnapshotHook<ChatMessage> = Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let chat = LiveCollection::open_with(&store, StreamSpec::chat(&ClientConfig::default()), Some(hook))
            .unwrap();
        let mut rx = chat.watch();
        chat_line(&store, "a").await;
        rx.wait_for(|w| w.len() == 1).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn read_error_keeps_last_window() {
        let (snapshots, rx) = tokio::sync::mpsc::unbounded_channel();
        let (tx, window) = watch::channel(Arc::new(Vec::<ChatMessage>::new()));
        let spec = StreamSpec::chat(&ClientConfig::default());
        let task = tokio::spawn(pump(Subscription::new(1, rx), spec, tx, None));

        let line = json!({
            "id": "m1",
            "authorId": "u1",
            "authorName": "ada",
            "text": "kept",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        snapshots.send(Ok(Snapshot { seq: 1, documents: vec![line] })).unwrap();
        snapshots
            .send(Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "listener dropped",
            ))))
            .unwrap();
        drop(snapshots);
        task.await.unwrap();

        assert_eq!(window.borrow().len(), 1);
        assert_eq!(window.borrow()[0].text, "kept");
    }

    #[tokio::test]
    async fn comment_thread_shows_the_newest_comments() {
        let store = LocalBackend::open_in_memory().unwrap();
        let post = PostId::new("p1");
        let collection = comments_collection(post.as_str());
        for n in 0..=COMMENTS_LIMIT {
            store
                .create(
                    &collection,
                    json!({ "authorId": "u1", "authorName": "ada", "authorAvatar": "", "text": format!("c{n}") }),
                )
                .await
                .unwrap();
        }

        let thread: LiveCollection<Comment> =
            LiveCollection::open(&store, StreamSpec::comments(&post)).unwrap();
        let window = thread.watch().wait_for(|w| !w.is_empty()).await.unwrap().clone();
        assert_eq!(window.len(), COMMENTS_LIMIT);
        assert_eq!(window.first().unwrap().text, "c1");
        assert_eq!(window.last().unwrap().text, format!("c{COMMENTS_LIMIT}"));
    }

    #[test]
    fn huge_notification_limit_does_not_overflow() {
        let config = ClientConfig {
            notifications_limit: usize::MAX,
            ..ClientConfig::default()
        };
        let spec = StreamSpec::notification_reads(&UserId::new("u1"), &config);
        assert_eq!(spec.query.limit, usize::MAX);
    }

    #[tokio::test]
    async fn dropping_collection_releases_subscription() {
        let store = LocalBackend::open_in_memory().unwrap();
        let chat: LiveCollection<ChatMessage> =
            LiveCollection::open(&store, StreamSpec::chat(&ClientConfig::default())).unwrap();
        assert_eq!(store.live_subscriptions(), 1);
        drop(chat);
        tokio::task::yield_now().await;
        chat_line(&store, "after").await;
        assert_eq!(store.live_subscriptions(), 0);
    }
}

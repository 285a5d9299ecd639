use std::collections::HashSet;

use tracing::{debug, info, warn};

use vibe_shared::constants::POSTS;
use vibe_shared::media::InlineImage;
use vibe_shared::models::{NotificationKind, Post, PostDraft, Profile};
use vibe_shared::types::PostId;
use vibe_store::FieldUpdate;

use crate::client::{lock_ledger, produce_notification, Client};
use crate::error::ClientError;
use crate::live::{LiveCollection, SnapshotHook, StreamSpec};
use crate::machines::{Composer, PendingWrite};
use crate::optimistic::LikeView;

impl Client {
    /// Subscribe to the newest posts. Every snapshot also feeds the like
    /// ledger with the server-confirmed counts.
    pub fn open_posts(&self) -> Result<LiveCollection<Post>, ClientError> {
        let likes = self.likes.clone();
        let hook: SnapshotHook<Post> = Box::new(move |posts, seq| {
            let mut ledger = lock_ledger(&likes);
            for post in posts {
                ledger.observe(&post.id, post.likes, seq);
            }
            let visible: HashSet<PostId> = posts.iter().map(|p| p.id.clone()).collect();
            ledger.retain_visible(&visible);
        });
        LiveCollection::open_with(self.store.as_ref(), StreamSpec::posts(&self.config), Some(hook))
    }

    /// Publish the composer's draft. The composer stays in flight until the
    /// store settles and is reset on success.
    pub async fn create_post(&self, composer: &mut Composer) -> Result<PostId, ClientError> {
        let viewer = self.session.viewer()?;
        let content = composer.text.trim().to_string();
        let image = composer.pending_image().cloned();
        if content.is_empty() && image.is_none() {
            return Err(ClientError::EmptyContent);
        }

        composer.begin_submit()?;
        match self.publish_post(&viewer, content, image).await {
            Ok(id) => {
                composer.finish_ok();
                Ok(id)
            }
            Err(e) => {
                self.report_write_failure("create_post", &e);
                composer.finish_err(&e);
                Err(e)
            }
        }
    }

    async fn publish_post(
        &self,
        author: &Profile,
        content: String,
        image: Option<InlineImage>,
    ) -> Result<PostId, ClientError> {
        let draft = PostDraft::new(author, content, image.map(InlineImage::into_string));
        let id = PostId::new(self.store.create(POSTS, serde_json::to_value(&draft)?).await?);
        info!(post = %id, author = %author.id, "post created");

        // The post exists from here on. Nothing after this fails the publish.
        if let Err(e) = self.bump_post_count(author, 1).await {
            warn!(post = %id, error = %e, "post counter not incremented");
        }
        self.notify(NotificationKind::Post, author).await;
        self.session.refresh().await;
        Ok(id)
    }

    /// Delete one of the viewer's own posts. The delete control of `post`
    /// stays disabled until the store settles.
    pub async fn delete_post(&self, post: &Post) -> Result<(), ClientError> {
        let viewer = self.session.viewer()?;
        if post.author_id != viewer.id {
            return Err(ClientError::NotAuthor);
        }
        let _guard = self.in_flight.begin(PendingWrite::PostDelete(post.id.clone()))?;

        match self.store.delete(POSTS, post.id.as_str()).await {
            Ok(deleted) => {
                info!(post = %post.id, deleted, "post deleted");
                if deleted {
                    if let Err(e) = self.bump_post_count(&viewer, -1).await {
                        warn!(post = %post.id, error = %e, "post counter not decremented");
                    }
                }
                self.session.refresh().await;
                Ok(())
            }
            Err(e) => {
                let e = ClientError::from(e);
                self.report_write_failure("delete_post", &e);
                Err(e)
            }
        }
    }

    /// Flip the viewer's like on `post` and return what to display right
    /// away. The increment is sent in the background; a failure rolls the
    /// local state back without telling the user.
    pub fn toggle_like(&self, post: &Post) -> Result<LikeView, ClientError> {
        let viewer = self.session.viewer()?;
        let (pending, view) = {
            let mut ledger = lock_ledger(&self.likes);
            let pending = ledger.toggle(&post.id, post.likes);
            (pending, ledger.view(&post.id, post.likes))
        };
        debug!(post = %post.id, version = pending.version, delta = pending.delta, "like toggled");

        let store = self.store.clone();
        let likes = self.likes.clone();
        let post_id = post.id.clone();
        tokio::spawn(async move {
            let changes = vec![FieldUpdate::increment("likes", pending.delta)];
            match store.update(POSTS, post_id.as_str(), changes).await {
                Ok(commit) => {
                    lock_ledger(&likes).acknowledge(&post_id, pending.version, commit);
                }
                Err(e) => {
                    debug!(post = %post_id, version = pending.version, error = %e, "like write failed, rolled back");
                    lock_ledger(&likes).fail(&post_id, pending.version);
                    return;
                }
            }
            if pending.delta > 0 {
                if let Err(e) = produce_notification(store.as_ref(), NotificationKind::Like, &viewer).await {
                    debug!(post = %post_id, error = %e, "like notification dropped");
                }
            }
        });

        Ok(view)
    }
}

use tracing::info;

use vibe_shared::constants::{comments_collection, POSTS};
use vibe_shared::models::{Comment, CommentDraft};
use vibe_shared::types::{CommentId, PostId};
use vibe_store::FieldUpdate;

use crate::client::Client;
use crate::error::ClientError;
use crate::live::{LiveCollection, StreamSpec};
use crate::machines::PendingWrite;

impl Client {
    /// Subscribe to the newest comments on `post`, oldest first. Drop the
    /// collection when the thread overlay closes.
    pub fn open_comments(&self, post: &PostId) -> Result<LiveCollection<Comment>, ClientError> {
        LiveCollection::open(self.store.as_ref(), StreamSpec::comments(post))
    }

    /// Add a comment to `post` and bump its comment counter. The comment box
    /// of `post` stays disabled until both writes settle.
    pub async fn add_comment(&self, post: &PostId, text: &str) -> Result<CommentId, ClientError> {
        let viewer = self.session.viewer()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let _guard = self.in_flight.begin(PendingWrite::Comment(post.clone()))?;

        let result = async {
            let draft = CommentDraft::new(&viewer, text.to_string());
            let id = self
                .store
                .create(&comments_collection(post.as_str()), serde_json::to_value(&draft)?)
                .await?;
            self.store
                .update(POSTS, post.as_str(), vec![FieldUpdate::increment("commentCount", 1)])
                .await?;
            Ok::<_, ClientError>(CommentId::new(id))
        }
        .await;

        match result {
            Ok(id) => {
                info!(post = %post, comment = %id, "comment added");
                Ok(id)
            }
            Err(e) => {
                self.report_write_failure("add_comment", &e);
                Err(e)
            }
        }
    }
}

use tracing::info;

use vibe_shared::constants::STORIES;
use vibe_shared::media::InlineImage;
use vibe_shared::models::{NotificationKind, Story, StoryDraft};
use vibe_shared::types::StoryId;

use crate::client::Client;
use crate::error::ClientError;
use crate::live::{LiveCollection, StreamSpec};
use crate::machines::{Composer, StoryPlayer};

impl Client {
    pub fn open_stories(&self) -> Result<LiveCollection<Story>, ClientError> {
        LiveCollection::open(self.store.as_ref(), StreamSpec::stories(&self.config))
    }

    /// Publish a story from the story composer. Needs text, an image, or
    /// both; `background` is the gradient token behind text-only stories.
    pub async fn create_story(
        &self,
        composer: &mut Composer,
        background: Option<String>,
    ) -> Result<StoryId, ClientError> {
        let viewer = self.session.viewer()?;
        let text = Some(composer.text.trim().to_string()).filter(|t| !t.is_empty());
        let image = composer.pending_image().cloned();
        if text.is_none() && image.is_none() {
            return Err(ClientError::EmptyContent);
        }

        composer.begin_submit()?;
        let draft = StoryDraft::new(&viewer, image.map(InlineImage::into_string), text, background);
        let result = async {
            let id = self.store.create(STORIES, serde_json::to_value(&draft)?).await?;
            Ok::<_, ClientError>(StoryId::new(id))
        }
        .await;

        match result {
            Ok(id) => {
                info!(story = %id, author = %viewer.id, "story created");
                self.notify(NotificationKind::Story, &viewer).await;
                composer.finish_ok();
                Ok(id)
            }
            Err(e) => {
                self.report_write_failure("create_story", &e);
                composer.finish_err(&e);
                Err(e)
            }
        }
    }

    /// Start the story viewer timer at the configured tick rate.
    pub fn play_story(&self, on_close: impl FnOnce() + Send + 'static) -> StoryPlayer {
        StoryPlayer::play(self.config.story_tick, on_close)
    }
}

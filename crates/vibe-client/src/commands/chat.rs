use tracing::info;

use vibe_shared::constants::CHAT;
use vibe_shared::models::{ChatMessage, ChatMessageDraft};
use vibe_shared::types::MessageId;

use crate::client::Client;
use crate::error::ClientError;
use crate::live::{LiveCollection, StreamSpec};
use crate::machines::{PendingWrite, ReplyContext};

impl Client {
    /// Subscribe to the last messages of the global channel, oldest first.
    pub fn open_chat(&self) -> Result<LiveCollection<ChatMessage>, ClientError> {
        LiveCollection::open(self.store.as_ref(), StreamSpec::chat(&self.config))
    }

    /// Send `text`, quoting the current reply target if there is one. The
    /// reply banner is cleared on success and restored if the send fails.
    /// The input stays disabled while the send is outstanding.
    pub async fn send_chat(
        &self,
        text: &str,
        reply: &mut ReplyContext,
    ) -> Result<MessageId, ClientError> {
        let viewer = self.session.viewer()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let _guard = self.in_flight.begin(PendingWrite::ChatSend)?;

        let reply_to = reply.take();
        let draft = ChatMessageDraft {
            author_id: viewer.id.clone(),
            author_name: viewer.username.clone(),
            text: text.to_string(),
            reply_to: reply_to.clone(),
        };

        let result = async {
            let id = self.store.create(CHAT, serde_json::to_value(&draft)?).await?;
            Ok::<_, ClientError>(MessageId::new(id))
        }
        .await;

        match result {
            Ok(id) => {
                info!(message = %id, reply = reply_to.is_some(), "chat message sent");
                Ok(id)
            }
            Err(e) => {
                reply.restore(reply_to);
                self.report_write_failure("send_chat", &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use vibe_store::LocalBackend;

    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn reply_quote_travels_with_the_message() {
        let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
        let config = ClientConfig {
            intro_delay: Duration::ZERO,
            ..ClientConfig::default()
        };
        let (client, _events) = Client::new(backend.clone(), backend, config);
        client.sign_up("ada@vibe.app", "secret1", "ada").await.unwrap();

        let chat = client.open_chat().unwrap();
        let mut reply = ReplyContext::new();
        client.send_chat("first", &mut reply).await.unwrap();

        let mut rx = chat.watch();
        let first = rx.wait_for(|w| w.len() == 1).await.unwrap()[0].clone();
        reply.select(&first);
        client.send_chat("second", &mut reply).await.unwrap();
        assert!(reply.target().is_none());

        let window = rx.wait_for(|w| w.len() == 2).await.unwrap().clone();
        let quote = window[1].reply_to.as_ref().unwrap();
        assert_eq!(quote.id, first.id);
        assert_eq!(quote.text, "first");
        assert_eq!(quote.author, "ada");
    }

    #[tokio::test]
    async fn sending_requires_a_session() {
        let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
        let (client, _events) = Client::new(backend.clone(), backend, ClientConfig::default());
        let mut reply = ReplyContext::new();
        assert!(matches!(
            client.send_chat("hi", &mut reply).await,
            Err(ClientError::NotSignedIn)
        ));
    }
}

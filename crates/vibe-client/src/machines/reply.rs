use vibe_shared::models::{ChatMessage, ReplyRef};

/// The "replying to" banner above the chat input. Holds at most one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyContext {
    target: Option<ReplyRef>,
}

impl ReplyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `message`, replacing any previous target. The quote is taken
    /// now, so later edits to the target do not change it.
    pub fn select(&mut self, message: &ChatMessage) {
        self.target = Some(ReplyRef::quote(message));
    }

    pub fn dismiss(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<&ReplyRef> {
        self.target.as_ref()
    }

    /// Hand the quote to an outgoing message and clear the banner.
    pub fn take(&mut self) -> Option<ReplyRef> {
        self.target.take()
    }

    /// Put a quote back after a failed send.
    pub fn restore(&mut self, reply: Option<ReplyRef>) {
        if self.target.is_none() {
            self.target = reply;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vibe_shared::types::{MessageId, UserId};

    fn message(id: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(id),
            author_id: UserId::new("u"),
            author_name: "ada".into(),
            text: text.into(),
            created_at: Utc::now(),
            reply_to: None,
        }
    }

    #[test]
    fn select_replaces_and_take_clears() {
        let mut ctx = ReplyContext::new();
        ctx.select(&message("a", "first"));
        ctx.select(&message("b", "second"));
        assert_eq!(ctx.target().unwrap().id, MessageId::new("b"));

        let taken = ctx.take().unwrap();
        assert_eq!(taken.text, "second");
        assert!(ctx.target().is_none());
    }

    #[test]
    fn dismiss_clears_without_sending() {
        let mut ctx = ReplyContext::new();
        ctx.select(&message("a", "first"));
        ctx.dismiss();
        assert!(ctx.take().is_none());
    }
}

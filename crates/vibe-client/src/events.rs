//! Events pushed from the client core to the UI shell.

use tokio::sync::mpsc;

use crate::session::Route;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Blocking alert for a failed write.
    Alert { title: String, message: String },
    /// The session moved to another top-level route.
    RouteChanged(Route),
}

/// Sending half of the UI event channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: UiEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(event = ?e.0, "UI event dropped, no receiver");
        }
    }

    pub fn alert(&self, title: impl Into<String>, message: impl Into<String>) {
        self.emit(UiEvent::Alert {
            title: title.into(),
            message: message.into(),
        });
    }
}

use std::collections::HashSet;

use tracing::{debug, warn};

use vibe_shared::constants::NOTIFICATION_READS;
use vibe_shared::models::{Notification, NotificationRead};
use vibe_shared::types::NotificationId;

use crate::client::Client;
use crate::error::ClientError;
use crate::live::{LiveCollection, StreamSpec};

impl Client {
    pub fn open_notifications(&self) -> Result<LiveCollection<Notification>, ClientError> {
        LiveCollection::open(self.store.as_ref(), StreamSpec::notifications(&self.config))
    }

    /// Subscribe to the read markers of the signed-in viewer.
    pub fn open_notification_reads(&self) -> Result<LiveCollection<NotificationRead>, ClientError> {
        let viewer = self.session.viewer()?;
        LiveCollection::open(
            self.store.as_ref(),
            StreamSpec::notification_reads(&viewer.id, &self.config),
        )
    }

    /// Mark every notification in `notifications` as read for the current
    /// viewer only. Returns how many markers were written.
    ///
    /// Called when the notifications screen opens. Failures are logged and
    /// the remaining markers are still attempted.
    pub async fn mark_all_read(
        &self,
        notifications: &[Notification],
        reads: &[NotificationRead],
    ) -> Result<usize, ClientError> {
        let viewer = self.session.viewer()?;
        let already: HashSet<&NotificationId> = reads
            .iter()
            .filter(|r| r.viewer_id == viewer.id)
            .map(|r| &r.notification_id)
            .collect();

        let mut written = 0;
        for notification in notifications.iter().filter(|n| !already.contains(&n.id)) {
            let marker = NotificationRead {
                viewer_id: viewer.id.clone(),
                notification_id: notification.id.clone(),
            };
            let key = NotificationRead::key(&viewer.id, &notification.id);
            match self
                .store
                .set(NOTIFICATION_READS, &key, serde_json::to_value(&marker)?)
                .await
            {
                Ok(()) => written += 1,
                Err(e) => warn!(notification = %notification.id, error = %e, "failed to mark notification read"),
            }
        }
        debug!(viewer = %viewer.id, written, "notifications marked read");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use vibe_store::LocalBackend;

    use super::*;
    use crate::config::ClientConfig;
    use crate::machines::Composer;
    use crate::views::unread_count;

    fn client(backend: &Arc<LocalBackend>) -> Client {
        let config = ClientConfig {
            intro_delay: Duration::ZERO,
            ..ClientConfig::default()
        };
        Client::new(backend.clone(), backend.clone(), config).0
    }

    #[tokio::test]
    async fn read_state_is_per_viewer() {
        let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
        let ada = client(&backend);
        ada.sign_up("ada@vibe.app", "secret1", "ada").await.unwrap();
        let mut composer = Composer::for_post();
        composer.text = "hello".into();
        ada.create_post(&mut composer).await.unwrap();

        let feed = ada.open_notifications().unwrap();
        let notes = feed.watch().wait_for(|w| w.len() == 1).await.unwrap().clone();
        let reads = ada.open_notification_reads().unwrap();
        let mut reads_rx = reads.watch();

        assert_eq!(ada.mark_all_read(&notes, &reads.current()).await.unwrap(), 1);
        let ada_reads = reads_rx.wait_for(|w| w.len() == 1).await.unwrap().clone();
        assert_eq!(unread_count(&notes, &ada_reads), 0);
        // Already marked: nothing new is written.
        assert_eq!(ada.mark_all_read(&notes, &ada_reads).await.unwrap(), 0);

        // Another viewer on the same store still sees it unread.
        ada.sign_out().await.unwrap();
        let bob = client(&backend);
        bob.sign_up("bob@vibe.app", "secret1", "bob").await.unwrap();
        let bob_reads = bob.open_notification_reads().unwrap();
        let window = bob_reads.watch().wait_for(|_| true).await.unwrap().clone();
        assert_eq!(unread_count(&notes, &window), 1);
    }
}

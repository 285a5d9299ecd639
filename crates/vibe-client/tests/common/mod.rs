#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use vibe_client::events::UiEvent;
use vibe_client::session::Route;
use vibe_client::{Client, ClientConfig};
use vibe_store::{DocumentStore, FieldUpdate, LocalBackend, Query, StoreError, Subscription};

pub fn fast_config() -> ClientConfig {
    ClientConfig {
        intro_delay: Duration::ZERO,
        ..ClientConfig::default()
    }
}

/// A [`LocalBackend`] whose requests can be made to fail or settle late on
/// demand. Delays are applied after the inner call has completed, so the
/// write is already committed (and its snapshot pushed) when the caller is
/// still waiting for the result.
pub struct FlakyStore {
    inner: Arc<LocalBackend>,
    pub fail_creates: AtomicBool,
    pub fail_updates: AtomicBool,
    pub fail_gets: AtomicBool,
    /// Milliseconds every write waits before reporting its result.
    pub write_delay_ms: AtomicU64,
    /// Milliseconds the next `get` waits before returning what it read.
    pub next_get_delay_ms: AtomicU64,
}

impl FlakyStore {
    pub fn new(inner: Arc<LocalBackend>) -> Self {
        Self {
            inner,
            fail_creates: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_gets: AtomicBool::new(false),
            write_delay_ms: AtomicU64::new(0),
            next_get_delay_ms: AtomicU64::new(0),
        }
    }

    async fn settle(&self) {
        let ms = self.write_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check(flag: &AtomicBool) -> vibe_store::Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "backend unreachable",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create(&self, collection: &str, data: Value) -> vibe_store::Result<String> {
        Self::check(&self.fail_creates)?;
        let out = self.inner.create(collection, data).await;
        self.settle().await;
        out
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> vibe_store::Result<()> {
        let out = self.inner.set(collection, id, data).await;
        self.settle().await;
        out
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Vec<FieldUpdate>,
    ) -> vibe_store::Result<u64> {
        Self::check(&self.fail_updates)?;
        let out = self.inner.update(collection, id, changes).await;
        self.settle().await;
        out
    }

    async fn delete(&self, collection: &str, id: &str) -> vibe_store::Result<bool> {
        let out = self.inner.delete(collection, id).await;
        self.settle().await;
        out
    }

    async fn get(&self, collection: &str, id: &str) -> vibe_store::Result<Option<Value>> {
        Self::check(&self.fail_gets)?;
        let out = self.inner.get(collection, id).await;
        let ms = self.next_get_delay_ms.swap(0, Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        out
    }

    fn subscribe(&self, query: Query) -> vibe_store::Result<Subscription> {
        self.inner.subscribe(query)
    }
}

/// Client on a fresh in-memory backend, signed up as `username` and routed
/// to the main screen.
pub async fn signed_in(username: &str) -> (Client, Arc<LocalBackend>, mpsc::UnboundedReceiver<UiEvent>) {
    let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
    let (client, events) = Client::new(backend.clone(), backend.clone(), fast_config());
    client
        .sign_up(&format!("{username}@vibe.app"), "secret1", username)
        .await
        .unwrap();
    client
        .session()
        .watch()
        .wait_for(|s| s.route == Route::Main)
        .await
        .unwrap();
    (client, backend, events)
}

/// Drain pending events and return the alerts among them.
pub fn alerts(events: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let UiEvent::Alert { message, .. } = event {
            out.push(message);
        }
    }
    out
}

pub const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A file of exactly `len` bytes that sniffs as PNG.
pub fn png_file(len: usize) -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.resize(len, 0);
    bytes
}

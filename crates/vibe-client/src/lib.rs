//! # vibe-client
//!
//! Client core of the VIBE social feed: session handling, live collection
//! subscriptions, optimistic likes, the ephemeral UI state machines and the
//! screen projections built on top of them. Persistence, authentication and
//! real-time delivery are delegated to a [`vibe_store::DocumentStore`] and a
//! [`vibe_store::IdentityProvider`].

pub mod client;
pub mod commands;
pub mod config;
pub mod events;
pub mod live;
pub mod machines;
pub mod optimistic;
pub mod session;
pub mod views;

mod error;

pub use client::Client;
pub use config::ClientConfig;
pub use error::ClientError;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vibe_client=debug,vibe_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    tracing::info!("VIBE client tracing initialised");
}

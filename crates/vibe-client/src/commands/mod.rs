//! Command handlers.
//!
//! Each sub-module adds an `impl Client` block for one domain. Writes other
//! than like toggles are not optimistic: the owning form stays in flight
//! until the store settles, and failures are logged and raised as alerts.

pub mod auth;
pub mod chat;
pub mod comments;
pub mod notifications;
pub mod posts;
pub mod settings;
pub mod stories;

pub use settings::ProfileEdit;

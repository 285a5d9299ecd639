//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration against the local backend.

use std::path::PathBuf;
use std::time::Duration;

use vibe_shared::constants::{
    CHAT_LIMIT, INTRO_DELAY_MS, NOTIFICATIONS_LIMIT, POSTS_LIMIT, STORIES_LIMIT, STORY_TICK_MS,
};

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// SQLite file for the local backend.
    /// Env: `VIBE_DB_PATH`
    /// Default: platform data directory.
    pub db_path: Option<PathBuf>,

    /// Splash duration before the first route is decided.
    /// Env: `VIBE_INTRO_DELAY_MS`
    pub intro_delay: Duration,

    /// Interval between story progress ticks.
    /// Env: `VIBE_STORY_TICK_MS`
    pub story_tick: Duration,

    /// Live query windows.
    /// Env: `VIBE_POSTS_LIMIT`, `VIBE_STORIES_LIMIT`, `VIBE_CHAT_LIMIT`,
    /// `VIBE_NOTIFICATIONS_LIMIT`
    pub posts_limit: usize,
    pub stories_limit: usize,
    pub chat_limit: usize,
    pub notifications_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            intro_delay: Duration::from_millis(INTRO_DELAY_MS),
            story_tick: Duration::from_millis(STORY_TICK_MS),
            posts_limit: POSTS_LIMIT,
            stories_limit: STORIES_LIMIT,
            chat_limit: CHAT_LIMIT,
            notifications_limit: NOTIFICATIONS_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("VIBE_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(ms) = parse_number::<u64>(&lookup, "VIBE_INTRO_DELAY_MS") {
            config.intro_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number::<u64>(&lookup, "VIBE_STORY_TICK_MS") {
            if ms > 0 {
                config.story_tick = Duration::from_millis(ms);
            }
        }

        if let Some(n) = parse_number(&lookup, "VIBE_POSTS_LIMIT") {
            config.posts_limit = n;
        }
        if let Some(n) = parse_number(&lookup, "VIBE_STORIES_LIMIT") {
            config.stories_limit = n;
        }
        if let Some(n) = parse_number(&lookup, "VIBE_CHAT_LIMIT") {
            config.chat_limit = n;
        }
        if let Some(n) = parse_number(&lookup, "VIBE_NOTIFICATIONS_LIMIT") {
            config.notifications_limit = n;
        }

        config
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse::<T>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value = %value, "Invalid numeric setting, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.posts_limit, 50);
        assert_eq!(config.stories_limit, 20);
        assert_eq!(config.chat_limit, 50);
        assert_eq!(config.notifications_limit, 20);
        assert_eq!(config.intro_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("VIBE_DB_PATH", "/tmp/vibe.db"),
            ("VIBE_INTRO_DELAY_MS", "0"),
            ("VIBE_CHAT_LIMIT", "10"),
        ]));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/vibe.db")));
        assert_eq!(config.intro_delay, Duration::ZERO);
        assert_eq!(config.chat_limit, 10);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("VIBE_POSTS_LIMIT", "lots"),
            ("VIBE_STORY_TICK_MS", "0"),
        ]));
        assert_eq!(config.posts_limit, 50);
        assert_eq!(config.story_tick, Duration::from_millis(100));
    }
}

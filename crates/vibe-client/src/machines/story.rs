//! Story playback.
//!
//! [`StoryPlayback`] is the bare state machine: `Playing { progress }` until
//! the progress reaches its maximum or the viewer is dismissed, then
//! `Closed` for good. [`StoryPlayer`] drives it from a Tokio interval and
//! runs the close callback exactly once, whichever way playback ended.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use vibe_shared::constants::{STORY_PROGRESS_MAX, STORY_TICK_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing { progress: u32 },
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPlayback {
    state: PlaybackState,
    step: u32,
    max: u32,
}

impl StoryPlayback {
    pub fn new(step: u32, max: u32) -> Self {
        Self {
            state: PlaybackState::Playing { progress: 0 },
            step: step.max(1),
            max,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Advance by one step. Returns `true` only on the tick that closes.
    pub fn tick(&mut self) -> bool {
        let PlaybackState::Playing { progress } = self.state else {
            return false;
        };
        let progress = progress.saturating_add(self.step).min(self.max);
        if progress >= self.max {
            self.state = PlaybackState::Closed;
            true
        } else {
            self.state = PlaybackState::Playing { progress };
            false
        }
    }

    /// Close early. Returns `true` if this call did the closing.
    pub fn dismiss(&mut self) -> bool {
        let was_playing = matches!(self.state, PlaybackState::Playing { .. });
        self.state = PlaybackState::Closed;
        was_playing
    }
}

impl Default for StoryPlayback {
    fn default() -> Self {
        Self::new(STORY_TICK_STEP, STORY_PROGRESS_MAX)
    }
}

type CloseCallback = Box<dyn FnOnce() + Send>;

struct Shared {
    playback: Mutex<StoryPlayback>,
    on_close: Mutex<Option<CloseCallback>>,
}

impl Shared {
    fn fire_close(&self) {
        let callback = self.on_close.lock().ok().and_then(|mut slot| slot.take());
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// A story viewer playing on a timer.
pub struct StoryPlayer {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl StoryPlayer {
    /// Start playing with the default step and maximum. Must be called from
    /// within a Tokio runtime.
    pub fn play(tick: Duration, on_close: impl FnOnce() + Send + 'static) -> Self {
        Self::with_playback(StoryPlayback::default(), tick, on_close)
    }

    pub fn with_playback(
        playback: StoryPlayback,
        tick: Duration,
        on_close: impl FnOnce() + Send + 'static,
    ) -> Self {
        let shared = Arc::new(Shared {
            playback: Mutex::new(playback),
            on_close: Mutex::new(Some(Box::new(on_close))),
        });

        let driver = shared.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick of a Tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let closed = match driver.playback.lock() {
                    Ok(mut playback) => playback.tick(),
                    Err(_) => break,
                };
                if closed {
                    debug!("story playback finished");
                    driver.fire_close();
                    break;
                }
            }
        });

        Self { shared, task }
    }

    pub fn state(&self) -> PlaybackState {
        self.shared
            .playback
            .lock()
            .map(|p| p.state())
            .unwrap_or(PlaybackState::Closed)
    }

    /// Close the viewer (tap or navigation). Stops the timer.
    pub fn dismiss(&self) {
        self.task.abort();
        let closed = self
            .shared
            .playback
            .lock()
            .map(|mut p| p.dismiss())
            .unwrap_or(false);
        if closed {
            debug!("story playback dismissed");
            self.shared.fire_close();
        }
    }
}

impl Drop for StoryPlayer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// src/services/playback_timer.rs
//
// Mock Playback Timer - simulated player driving the rating overlay
//
// CRITICAL RULES:
// - Runs in background task
// - Advances the play-head on a fixed tick
// - Fires credits start at most once per crossing of the rolling-credits
//   boundary; a seek back before the boundary re-arms it
// - Does NOT know anything about ratings or overlay state

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Receiver of playback signals. The rating controller implements this;
/// any real player integration can drive it the same way.
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackSignalSink: Send + Sync {
    fn on_duration_changed(&self, duration_ms: u64);
    fn on_playback_position_changed(&self, position_ms: u64);
    fn on_credits_start(&self, position_ms: u64);
    fn on_end_reached(&self);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackTimerConfig {
    pub tick_interval_ms: u64,
    pub position_step_ms: u64,
    pub duration_ms: u64,
}

impl Default for PlaybackTimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            position_step_ms: 1000,
            duration_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone)]
struct TimerSession {
    position_ms: u64,
    duration_ms: u64,
    credits_boundary_ms: u64,
    credits_emitted: bool,
}

impl TimerSession {
    fn credits_due(&self) -> bool {
        !self.credits_emitted
            && self.position_ms >= self.credits_boundary_ms
            && self.position_ms < self.duration_ms
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MockPlaybackTimer {
    sink: Arc<dyn PlaybackSignalSink>,
    config: PlaybackTimerConfig,
    current_session: Arc<Mutex<Option<TimerSession>>>,
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MockPlaybackTimer {
    pub fn new(sink: Arc<dyn PlaybackSignalSink>, config: PlaybackTimerConfig) -> Self {
        Self {
            sink,
            config,
            current_session: Arc::new(Mutex::new(None)),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &PlaybackTimerConfig {
        &self.config
    }

    /// Start playback from zero. Credits start fires at
    /// `duration_ms - rolling_offset_ms`.
    pub fn start(&self, duration_ms: u64, rolling_offset_ms: u64) {
        self.stop();

        *lock(&self.current_session) = Some(TimerSession {
            position_ms: 0,
            duration_ms,
            credits_boundary_ms: duration_ms.saturating_sub(rolling_offset_ms),
            credits_emitted: false,
        });

        self.sink.on_duration_changed(duration_ms);
        self.spawn_timer_task();
    }

    /// Move the play-head. Seeking before the credits boundary re-arms the
    /// credits signal; seeking after playback ended resumes it.
    /// Returns false when nothing is playing.
    pub fn seek(&self, position_ms: u64) -> bool {
        {
            let mut guard = lock(&self.current_session);
            let Some(session) = guard.as_mut() else {
                return false;
            };

            session.position_ms = position_ms.min(session.duration_ms);
            if session.position_ms < session.credits_boundary_ms {
                session.credits_emitted = false;
            }
            self.sink.on_playback_position_changed(session.position_ms);
        }

        if !self.is_running() {
            self.spawn_timer_task();
        }
        true
    }

    pub fn stop(&self) {
        *lock(&self.current_session) = None;
        if let Some(task) = lock(&self.task_handle).take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.task_handle)
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn position_ms(&self) -> Option<u64> {
        lock(&self.current_session).as_ref().map(|s| s.position_ms)
    }

    fn spawn_timer_task(&self) {
        let sink = Arc::clone(&self.sink);
        let session = Arc::clone(&self.current_session);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            let interval = Duration::from_millis(config.tick_interval_ms.max(1));

            loop {
                tokio::time::sleep(interval).await;

                let mut guard = lock(&session);
                let Some(current) = guard.as_mut() else {
                    break;
                };

                current.position_ms = current
                    .position_ms
                    .saturating_add(config.position_step_ms)
                    .min(current.duration_ms);
                sink.on_playback_position_changed(current.position_ms);

                if current.credits_due() {
                    current.credits_emitted = true;
                    sink.on_credits_start(current.position_ms);
                }

                if current.position_ms >= current.duration_ms {
                    log::debug!("Mock playback reached end at {}ms", current.duration_ms);
                    sink.on_end_reached();
                    break;
                }
            }
        });

        if let Some(previous) = lock(&self.task_handle).replace(task) {
            previous.abort();
        }
    }
}

impl Drop for MockPlaybackTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

use serde::{Deserialize, Serialize};

/// Playback position as last reported by the signal source.
/// Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackClock {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub end_reached: bool,
}

impl PlaybackClock {
    /// End-of-playback rule used when the countdown runs out.
    /// An unknown (zero) duration never counts as reached by position alone.
    pub fn is_at_or_past_end(&self) -> bool {
        self.end_reached || (self.duration_ms > 0 && self.position_ms >= self.duration_ms)
    }
}

use serde::{Deserialize, Serialize};

/// Default countdown length in seconds
pub const DEFAULT_DISPLAY_TIME_SECONDS: i32 = 10;

/// Default ceiling for the countdown in seconds
pub const DEFAULT_MAX_DISPLAY_TIME_SECONDS: i32 = 60;

/// Default distance from end-of-content at which credits start
pub const DEFAULT_ROLLING_CREDITS_OFFSET_MS: i64 = 3000;

/// Absolute countdown ceiling, independent of any settings
pub const ABSOLUTE_MAX_COUNTDOWN_SECONDS: u32 = 60;

/// Countdown floor
pub const MIN_COUNTDOWN_SECONDS: u32 = 1;

/// Tunable overlay settings.
///
/// Values are kept exactly as delivered by the settings source (including
/// nonsense like negative seconds); normalization happens when they are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub display_time_seconds: i32,
    pub max_display_time_seconds: i32,
    #[serde(alias = "rollingCreditsTimeMs")]
    pub rolling_credits_offset_ms: i64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            display_time_seconds: DEFAULT_DISPLAY_TIME_SECONDS,
            max_display_time_seconds: DEFAULT_MAX_DISPLAY_TIME_SECONDS,
            rolling_credits_offset_ms: DEFAULT_ROLLING_CREDITS_OFFSET_MS,
        }
    }
}

impl OverlaySettings {
    /// Initial countdown value for a new overlay session:
    /// `max(1, min(display, max_display, 60))`
    pub fn countdown_seconds(&self) -> u32 {
        let capped = i64::from(self.display_time_seconds)
            .min(i64::from(self.max_display_time_seconds))
            .min(i64::from(ABSOLUTE_MAX_COUNTDOWN_SECONDS));

        capped.max(i64::from(MIN_COUNTDOWN_SECONDS)) as u32
    }

    /// Rolling-credits offset, never negative
    pub fn rolling_credits_offset_ms(&self) -> u64 {
        self.rolling_credits_offset_ms.max(0) as u64
    }

    /// Position at which credits start for a given duration.
    /// Saturates at zero for content shorter than the offset.
    pub fn credits_boundary_ms(&self, duration_ms: u64) -> u64 {
        duration_ms.saturating_sub(self.rolling_credits_offset_ms())
    }
}

use serde::{Deserialize, Serialize};

/// Title shown when content info cannot be loaded
pub const FALLBACK_TITLE: &str = "The Ocean and the Sky";

/// Poster shown when content info cannot be loaded
pub const FALLBACK_POSTER_URL: &str = "file:///android_asset/figmaimages/figma_image_176_1015.png";

/// Display metadata for the overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    pub id: String,
    pub title: String,
    pub poster_url: String,
}

impl ContentInfo {
    pub fn fallback(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: FALLBACK_TITLE.to_string(),
            poster_url: FALLBACK_POSTER_URL.to_string(),
        }
    }
}

/// Ephemeral data of one visible overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySession {
    pub title: String,
    pub poster_url: String,
    pub remaining_seconds: u32,
    /// Always false when the session is created
    pub rating_already_given: bool,
}

impl OverlaySession {
    pub fn new(info: ContentInfo, remaining_seconds: u32) -> Self {
        Self {
            title: info.title,
            poster_url: info.poster_url,
            remaining_seconds,
            rating_already_given: false,
        }
    }
}

/// Everything the view layer needs to render the overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayState {
    Hidden,
    Loading,
    Visible(OverlaySession),
    AutoClosing { remaining_seconds: u32 },
    Closed,
    NavigateToNext,
}

impl OverlayState {
    /// Visible or its AutoClosing substate, i.e. a countdown is running
    pub fn is_showing(&self) -> bool {
        matches!(self, OverlayState::Visible(_) | OverlayState::AutoClosing { .. })
    }

    /// Closed or NavigateToNext
    pub fn is_terminal(&self) -> bool {
        matches!(self, OverlayState::Closed | OverlayState::NavigateToNext)
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        match self {
            OverlayState::Visible(session) => Some(session.remaining_seconds),
            OverlayState::AutoClosing { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OverlayState::Hidden => "Hidden",
            OverlayState::Loading => "Loading",
            OverlayState::Visible(_) => "Visible",
            OverlayState::AutoClosing { .. } => "AutoClosing",
            OverlayState::Closed => "Closed",
            OverlayState::NavigateToNext => "NavigateToNext",
        }
    }
}

/// Where the host navigates once an overlay lifecycle ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayRoute {
    ClosedScreen,
    NextContent,
}

impl OverlayRoute {
    /// Terminal overlay state matching this route
    pub fn terminal_state(self) -> OverlayState {
        match self {
            OverlayRoute::ClosedScreen => OverlayState::Closed,
            OverlayRoute::NextContent => OverlayState::NavigateToNext,
        }
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        OverlayState::Hidden
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key identifying one piece of content.
/// All persisted and in-session rating state is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The three rating buttons offered by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
    Like,
    Love,
    Dislike,
}

impl RatingKind {
    /// Like and Love both persist as liked; Dislike persists as not liked
    pub fn is_liked(self) -> bool {
        !matches!(self, RatingKind::Dislike)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatingKind::Like => "like",
            RatingKind::Love => "love",
            RatingKind::Dislike => "dislike",
        }
    }
}

/// Persisted rating state for one content identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub content_id: ContentId,

    /// Set once the user picked any rating. Never reset by normal flow.
    pub has_rated: bool,

    /// True for Like/Love, false for Dislike or no rating
    pub is_liked: bool,

    pub updated_at: DateTime<Utc>,
}

impl RatingRecord {
    /// A record for content that was never rated
    pub fn unrated(content_id: ContentId) -> Self {
        Self {
            content_id,
            has_rated: false,
            is_liked: false,
            updated_at: Utc::now(),
        }
    }

    /// Apply a rating selection.
    pub fn apply(&mut self, kind: RatingKind) {
        self.has_rated = true;
        self.is_liked = kind.is_liked();
        self.updated_at = Utc::now();
    }
}

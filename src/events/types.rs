// src/events/types.rs
//
// All domain events emitted by the rating overlay.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No overlay logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ContentId, OverlayRoute, RatingKind};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! impl_domain_event {
    ($event:ident) => {
        impl DomainEvent for $event {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($event)
            }
        }
    };
}

// ============================================================================
// OVERLAY LIFECYCLE EVENTS
// ============================================================================

/// Emitted when an overlay session becomes visible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingOverlayShown {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
    pub countdown_seconds: u32,
}

impl RatingOverlayShown {
    pub fn new(content_id: ContentId, countdown_seconds: u32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
            countdown_seconds,
        }
    }
}

impl_domain_event!(RatingOverlayShown);

/// Emitted when credits started but the content was already rated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingOverlaySuppressed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
}

impl RatingOverlaySuppressed {
    pub fn new(content_id: ContentId) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
        }
    }
}

impl_domain_event!(RatingOverlaySuppressed);

/// Emitted when the user closes the overlay explicitly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingOverlayDismissed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
    pub closed_without_rating: bool,
}

impl RatingOverlayDismissed {
    pub fn new(content_id: ContentId, closed_without_rating: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
            closed_without_rating,
        }
    }
}

impl_domain_event!(RatingOverlayDismissed);

/// Emitted when the countdown ran out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingCountdownExpired {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
    pub route: OverlayRoute,
}

impl RatingCountdownExpired {
    pub fn new(content_id: ContentId, route: OverlayRoute) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
            route,
        }
    }
}

impl_domain_event!(RatingCountdownExpired);

// ============================================================================
// RATING EVENTS
// ============================================================================

/// Emitted when the user picks a rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSubmitted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
    pub kind: RatingKind,
    pub liked: bool,
}

impl RatingSubmitted {
    pub fn new(content_id: ContentId, kind: RatingKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
            kind,
            liked: kind.is_liked(),
        }
    }
}

impl_domain_event!(RatingSubmitted);

/// Emitted when a rating write failed after its retry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingPersistFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
    pub operation: String, // "set_like", "set_rated"
    pub attempts: u32,
    pub reason: String,
}

impl RatingPersistFailed {
    pub fn new(content_id: ContentId, operation: &str, attempts: u32, reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
            operation: operation.to_string(),
            attempts,
            reason,
        }
    }
}

impl_domain_event!(RatingPersistFailed);

// ============================================================================
// FALLBACK EVENTS
// ============================================================================

/// Emitted when overlay settings could not be loaded and defaults apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsFallbackApplied {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
}

impl SettingsFallbackApplied {
    pub fn new(reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            reason,
        }
    }
}

impl_domain_event!(SettingsFallbackApplied);

/// Emitted when content info could not be loaded and the fallback poster is used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentInfoFallbackApplied {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub content_id: ContentId,
    pub reason: String,
}

impl ContentInfoFallbackApplied {
    pub fn new(content_id: ContentId, reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            content_id,
            reason,
        }
    }
}

impl_domain_event!(ContentInfoFallbackApplied);

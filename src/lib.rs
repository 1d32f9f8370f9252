// src/lib.rs
// Post-playback rating - content rating overlay shown when credits roll
//
// Architecture:
// - Domain-centric: overlay states, settings and rating records live in domain
// - Actor-driven: one controller task owns all overlay state
// - Event-driven: lifecycle facts are published on the EventBus
// - Explicit: every failure has a fixed fallback, nothing reaches the caller

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_content_id,
    validate_rating_record,
    // Rating
    ContentId,
    // Overlay
    ContentInfo,
    OverlayRoute,
    OverlaySession,
    OverlaySettings,
    OverlayState,
    PlaybackClock,
    RatingKind,
    RatingRecord,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    ContentInfoFallbackApplied,
    DomainEvent,
    EventBus,
    EventLogEntry,
    RatingCountdownExpired,
    RatingOverlayDismissed,
    RatingOverlayShown,
    RatingOverlaySuppressed,
    RatingPersistFailed,
    RatingSubmitted,
    SettingsFallbackApplied,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    ContentInfoProvider,
    InMemoryRatingRepository,
    MockMetadataRepository,
    RatingStateStore,
    SettingsProvider,
    SqliteRatingRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Overlay controller
    ControllerConfig,
    ControllerDependencies,
    PostPlaybackRatingController,
    // Navigation
    LoggingOverlayHost,
    OverlayHost,
    // Playback source
    MockPlaybackTimer,
    PlaybackSignalSink,
    PlaybackTimerConfig,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppConfig, AppState, DataSource, NetworkConfig};
pub use integrations::MetadataApiClient;

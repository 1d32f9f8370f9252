// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod overlay;
pub mod rating;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Rating Domain
pub use rating::{
    validate_content_id, validate_rating_record, ContentId, RatingKind, RatingRecord,
};

// Overlay Domain
pub use overlay::{
    ContentInfo, OverlayRoute, OverlaySession, OverlaySettings, OverlayState, PlaybackClock,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

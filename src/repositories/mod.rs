// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO overlay logic
// - NO event emission
// - Explicit SQL only

pub mod memory_rating_repository;
pub mod metadata_repository;
pub mod rating_repository;

pub use memory_rating_repository::InMemoryRatingRepository;
pub use metadata_repository::{ContentInfoProvider, MockMetadataRepository, SettingsProvider};
pub use rating_repository::{RatingStateStore, SqliteRatingRepository};

#[cfg(test)]
pub use metadata_repository::{MockContentInfoProvider, MockSettingsProvider};
#[cfg(test)]
pub use rating_repository::MockRatingStateStore;

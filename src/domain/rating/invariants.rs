use super::entity::{ContentId, RatingRecord};
use crate::domain::{DomainError, DomainResult};

/// Validates a content identifier before it is used as a storage key
pub fn validate_content_id(content_id: &ContentId) -> DomainResult<()> {
    if content_id.as_str().trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "content id must not be blank".to_string(),
        ));
    }
    Ok(())
}

/// Validates all RatingRecord invariants
pub fn validate_rating_record(record: &RatingRecord) -> DomainResult<()> {
    validate_content_id(&record.content_id)?;

    // A liked record without a rating can only come from a corrupted store
    if record.is_liked && !record.has_rated {
        return Err(DomainError::InvariantViolation(format!(
            "content {} is liked but not rated",
            record.content_id
        )));
    }
    Ok(())
}

/// Critical Rating Invariants:
///
/// 1. Records are keyed by a non-blank content id
/// 2. has_rated never goes back to false through normal flow
/// 3. is_liked implies has_rated

pub mod entity;
pub mod invariants;

pub use entity::{ContentId, RatingKind, RatingRecord};
pub use invariants::{validate_content_id, validate_rating_record};

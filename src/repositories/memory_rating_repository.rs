// src/repositories/memory_rating_repository.rs
//
// In-memory rating store for mock mode and tests. Same semantics as the
// SQLite store, nothing survives the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{validate_content_id, ContentId, RatingRecord};
use crate::error::AppResult;
use crate::repositories::RatingStateStore;

#[derive(Default)]
pub struct InMemoryRatingRepository {
    records: RwLock<HashMap<ContentId, RatingRecord>>,
}

impl InMemoryRatingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_record(&self, content_id: &ContentId) -> Option<RatingRecord> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(content_id)
            .cloned()
    }

    fn update<F>(&self, content_id: &ContentId, mutate: F)
    where
        F: FnOnce(&mut RatingRecord),
    {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let record = records
            .entry(content_id.clone())
            .or_insert_with(|| RatingRecord::unrated(content_id.clone()));
        mutate(record);
        record.updated_at = chrono::Utc::now();
    }
}

#[async_trait]
impl RatingStateStore for InMemoryRatingRepository {
    async fn has_rated(&self, content_id: &ContentId) -> AppResult<bool> {
        Ok(self.get_record(content_id).map(|r| r.has_rated).unwrap_or(false))
    }

    async fn set_rated(&self, content_id: &ContentId, rated: bool) -> AppResult<bool> {
        validate_content_id(content_id)?;
        self.update(content_id, |record| record.has_rated = rated);
        Ok(true)
    }

    async fn is_liked(&self, content_id: &ContentId) -> AppResult<bool> {
        Ok(self.get_record(content_id).map(|r| r.is_liked).unwrap_or(false))
    }

    async fn set_like(&self, content_id: &ContentId, liked: bool) -> AppResult<bool> {
        validate_content_id(content_id)?;
        self.update(content_id, |record| {
            record.is_liked = liked;
            record.has_rated = true;
        });
        Ok(true)
    }
}

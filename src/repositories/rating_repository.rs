// src/repositories/rating_repository.rs
//
// Rating state persistence: two facts per content id, "has been rated"
// and "is liked", kept across process restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

use crate::db::{get_connection, ConnectionPool};
use crate::domain::{validate_content_id, validate_rating_record, ContentId, RatingRecord};
use crate::error::AppResult;

/// Per-content rating persistence.
///
/// Setters return `Ok(true)` when the value was persisted. Errors are
/// returned, never panicked, so callers can retry or fall back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingStateStore: Send + Sync {
    async fn has_rated(&self, content_id: &ContentId) -> AppResult<bool>;
    async fn set_rated(&self, content_id: &ContentId, rated: bool) -> AppResult<bool>;
    async fn is_liked(&self, content_id: &ContentId) -> AppResult<bool>;
    /// Also marks the content as rated
    async fn set_like(&self, content_id: &ContentId, liked: bool) -> AppResult<bool>;
}

pub struct SqliteRatingRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteRatingRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Full record for a content id, if one was ever written
    pub async fn get_record(&self, content_id: &ContentId) -> AppResult<Option<RatingRecord>> {
        let id = content_id.clone();
        self.with_connection(move |conn| Self::select_record(conn, &id))
            .await
    }

    /// Runs a blocking SQLite operation off the async executor
    async fn with_connection<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let conn = get_connection(&pool)?;
            op(&conn)
        })
        .await?
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<RatingRecord> {
        let content_id: String = row.get("content_id")?;
        let updated_at_str: String = row.get("updated_at")?;

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid updated_at timestamp '{}': {}", updated_at_str, e),
                    )),
                )
            })?;

        Ok(RatingRecord {
            content_id: ContentId::new(content_id),
            has_rated: row.get("has_rated")?,
            is_liked: row.get("is_liked")?,
            updated_at,
        })
    }

    fn select_record(conn: &Connection, content_id: &ContentId) -> AppResult<Option<RatingRecord>> {
        let record = conn
            .query_row(
                "SELECT content_id, has_rated, is_liked, updated_at
                 FROM content_ratings WHERE content_id = ?1",
                params![content_id.as_str()],
                Self::row_to_record,
            )
            .optional()?;

        if let Some(record) = &record {
            if let Err(err) = validate_rating_record(record) {
                log::warn!("Stored rating row is inconsistent: {}", err);
            }
        }
        Ok(record)
    }

    fn upsert_rated(conn: &Connection, content_id: &ContentId, rated: bool) -> AppResult<bool> {
        let changed = conn.execute(
            "INSERT INTO content_ratings (content_id, has_rated, is_liked, updated_at)
             VALUES (?1, ?2, 0, ?3)
             ON CONFLICT(content_id) DO UPDATE SET
                has_rated = excluded.has_rated,
                updated_at = excluded.updated_at",
            params![content_id.as_str(), rated, Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    fn upsert_like(conn: &Connection, content_id: &ContentId, liked: bool) -> AppResult<bool> {
        let changed = conn.execute(
            "INSERT INTO content_ratings (content_id, has_rated, is_liked, updated_at)
             VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(content_id) DO UPDATE SET
                has_rated = 1,
                is_liked = excluded.is_liked,
                updated_at = excluded.updated_at",
            params![content_id.as_str(), liked, Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl RatingStateStore for SqliteRatingRepository {
    async fn has_rated(&self, content_id: &ContentId) -> AppResult<bool> {
        let record = self.get_record(content_id).await?;
        Ok(record.map(|r| r.has_rated).unwrap_or(false))
    }

    async fn set_rated(&self, content_id: &ContentId, rated: bool) -> AppResult<bool> {
        validate_content_id(content_id)?;
        let id = content_id.clone();
        self.with_connection(move |conn| Self::upsert_rated(conn, &id, rated))
            .await
    }

    async fn is_liked(&self, content_id: &ContentId) -> AppResult<bool> {
        let record = self.get_record(content_id).await?;
        Ok(record.map(|r| r.is_liked).unwrap_or(false))
    }

    async fn set_like(&self, content_id: &ContentId, liked: bool) -> AppResult<bool> {
        validate_content_id(content_id)?;
        let id = content_id.clone();
        self.with_connection(move |conn| Self::upsert_like(conn, &id, liked))
            .await
    }
}

// src/repositories/metadata_repository.rs
//
// Display metadata and overlay settings sources.
// Both may fail; the controller substitutes fixed fallbacks when they do.

use async_trait::async_trait;

use crate::domain::{ContentId, ContentInfo, OverlaySettings};
use crate::error::AppResult;

/// Title and poster for the content being rated
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentInfoProvider: Send + Sync {
    async fn get_content_info(&self, content_id: &ContentId) -> AppResult<ContentInfo>;
}

/// Tunable countdown and rolling-credits settings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get_overlay_settings(&self) -> AppResult<OverlaySettings>;
}

/// Static offline data source
#[derive(Debug, Clone, Default)]
pub struct MockMetadataRepository {
    settings: OverlaySettings,
}

impl MockMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: OverlaySettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ContentInfoProvider for MockMetadataRepository {
    async fn get_content_info(&self, content_id: &ContentId) -> AppResult<ContentInfo> {
        Ok(ContentInfo::fallback(content_id.as_str()))
    }
}

#[async_trait]
impl SettingsProvider for MockMetadataRepository {
    async fn get_overlay_settings(&self) -> AppResult<OverlaySettings> {
        Ok(self.settings)
    }
}

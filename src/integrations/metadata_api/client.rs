// src/integrations/metadata_api/client.rs
//
// Metadata API Integration
//
// ARCHITECTURE:
// - JSON client for the content and metadata services
// - Maps wire DTOs → domain values with safe defaults
// - Used through the ContentInfoProvider / SettingsProvider traits
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Missing fields are filled, never rejected
// - Transport failures are returned as AppError::Http; callers fall back

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::application::config::NetworkConfig;
use crate::domain::overlay::settings::{
    DEFAULT_DISPLAY_TIME_SECONDS, DEFAULT_MAX_DISPLAY_TIME_SECONDS,
    DEFAULT_ROLLING_CREDITS_OFFSET_MS,
};
use crate::domain::{ContentId, ContentInfo, OverlaySettings};
use crate::error::{AppError, AppResult};
use crate::repositories::{ContentInfoProvider, SettingsProvider};

const USER_AGENT: &str = concat!("post_playback_rating/", env!("CARGO_PKG_VERSION"));

/// `GET v1/content/{id}/min`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentInfoDto {
    id: Option<String>,
    title: Option<String>,
    poster_url: Option<String>,
}

impl ContentInfoDto {
    fn into_domain(self, requested: &ContentId) -> ContentInfo {
        let fallback = ContentInfo::fallback(requested.as_str());
        ContentInfo {
            id: self.id.unwrap_or(fallback.id),
            title: self.title.unwrap_or(fallback.title),
            poster_url: self.poster_url.unwrap_or(fallback.poster_url),
        }
    }
}

/// `GET v1/metadata/vod-rating-settings`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VodRatingSettingsDto {
    display_time_seconds: Option<i32>,
    max_display_time_seconds: Option<i32>,
    rolling_credits_time_ms: Option<i64>,
}

impl VodRatingSettingsDto {
    fn into_domain(self) -> OverlaySettings {
        OverlaySettings {
            display_time_seconds: self
                .display_time_seconds
                .unwrap_or(DEFAULT_DISPLAY_TIME_SECONDS),
            max_display_time_seconds: self
                .max_display_time_seconds
                .unwrap_or(DEFAULT_MAX_DISPLAY_TIME_SECONDS),
            rolling_credits_offset_ms: self
                .rolling_credits_time_ms
                .unwrap_or(DEFAULT_ROLLING_CREDITS_OFFSET_MS),
        }
    }
}

/// Metadata API Client
pub struct MetadataApiClient {
    content_base_url: Url,
    metadata_base_url: Url,
    http_client: Client,
}

impl MetadataApiClient {
    /// Create a client for the configured base URLs
    pub fn new(config: &NetworkConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            content_base_url: parse_base_url(&config.content_base_url)?,
            metadata_base_url: parse_base_url(&config.metadata_base_url)?,
            http_client,
        })
    }

    /// The content id is pushed as a single, percent-encoded path segment
    fn content_info_url(&self, content_id: &ContentId) -> AppResult<Url> {
        let mut url = self.content_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Http(format!("{} cannot be a base URL", self.content_base_url))
            })?
            .pop_if_empty()
            .extend(["v1", "content", content_id.as_str(), "min"]);
        Ok(url)
    }

    fn settings_url(&self) -> AppResult<Url> {
        self.metadata_base_url
            .join("v1/metadata/vod-rating-settings")
            .map_err(|e| AppError::Http(format!("Invalid settings URL: {}", e)))
    }

    // ========================================================================
    // INTERNAL: Request Execution
    // ========================================================================

    async fn get_json<T>(&self, url: Url) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Http(format!(
                "{} returned status: {}",
                url,
                response.status()
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ContentInfoProvider for MetadataApiClient {
    async fn get_content_info(&self, content_id: &ContentId) -> AppResult<ContentInfo> {
        let dto: ContentInfoDto = self.get_json(self.content_info_url(content_id)?).await?;
        Ok(dto.into_domain(content_id))
    }
}

#[async_trait]
impl SettingsProvider for MetadataApiClient {
    async fn get_overlay_settings(&self) -> AppResult<OverlaySettings> {
        let dto: VodRatingSettingsDto = self.get_json(self.settings_url()?).await?;
        Ok(dto.into_domain())
    }
}

/// Base URLs always end in `/` so relative joins keep their path
fn parse_base_url(url: &str) -> AppResult<Url> {
    let trimmed = url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash)
        .map_err(|e| AppError::Http(format!("Invalid base URL '{}': {}", trimmed, e)))
}

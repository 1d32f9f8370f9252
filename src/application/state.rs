// src/application/state.rs
//
// Application state: the single place where collaborators are chosen and
// wired together.

use std::sync::Arc;

use crate::application::config::{AppConfig, DataSource};
use crate::db::{
    create_connection_pool, get_connection, initialize_database, verify_database_integrity,
    ConnectionPool,
};
use crate::domain::{ContentId, OverlaySettings};
use crate::error::AppResult;
use crate::events::{create_event_bus, EventBus};
use crate::integrations::MetadataApiClient;
use crate::repositories::{
    ContentInfoProvider, InMemoryRatingRepository, MockMetadataRepository, RatingStateStore,
    SettingsProvider, SqliteRatingRepository,
};
use crate::services::{
    ControllerDependencies, MockPlaybackTimer, OverlayHost, PostPlaybackRatingController,
};

/// All fields are Arc-wrapped or cheap handles for sharing across tasks.
pub struct AppState {
    pub config: AppConfig,
    pub data_source: DataSource,
    pub event_bus: Arc<EventBus>,
    pub pool: Option<Arc<ConnectionPool>>,
    pub rating_store: Arc<dyn RatingStateStore>,
    pub settings: Arc<dyn SettingsProvider>,
    pub content_info: Arc<dyn ContentInfoProvider>,
    pub controller: PostPlaybackRatingController,
    pub timer: MockPlaybackTimer,
}

impl AppState {
    /// Build every collaborator from `config` and start the controller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(config: AppConfig, host: Arc<dyn OverlayHost>) -> AppResult<Self> {
        config.validate()?;

        // 1. INFRASTRUCTURE
        let event_bus = Arc::new(create_event_bus());

        let (pool, rating_store): (Option<Arc<ConnectionPool>>, Arc<dyn RatingStateStore>) =
            if config.in_memory_ratings {
                log::info!("Rating state kept in memory");
                (None, Arc::new(InMemoryRatingRepository::new()))
            } else {
                let db_path = config.resolve_database_path()?;
                let pool = Arc::new(create_connection_pool(&db_path)?);
                {
                    let conn = get_connection(&pool)?;
                    initialize_database(&conn)?;
                    verify_database_integrity(&conn)?;
                }
                log::info!("Rating state stored at {}", db_path.display());
                (
                    Some(Arc::clone(&pool)),
                    Arc::new(SqliteRatingRepository::new(pool)),
                )
            };

        // 2. PROVIDERS
        let data_source = config.effective_data_source();
        let (settings, content_info): (Arc<dyn SettingsProvider>, Arc<dyn ContentInfoProvider>) =
            match data_source {
                DataSource::Mock => {
                    let mock = Arc::new(MockMetadataRepository::new());
                    (mock.clone(), mock)
                }
                DataSource::Network => {
                    let client = Arc::new(MetadataApiClient::new(&config.network)?);
                    (client.clone(), client)
                }
            };
        log::info!("Using {:?} data source", data_source);

        // 3. CONTROLLER + PLAYBACK
        let controller = PostPlaybackRatingController::spawn(
            ContentId::new(config.content_id.clone()),
            ControllerDependencies {
                rating_store: Arc::clone(&rating_store),
                content_info: Arc::clone(&content_info),
                settings: Arc::clone(&settings),
                host,
                event_bus: Arc::clone(&event_bus),
            },
            config.overlay.clone(),
        );

        let timer = MockPlaybackTimer::new(
            Arc::new(controller.clone()),
            config.playback.clone(),
        );

        Ok(Self {
            config,
            data_source,
            event_bus,
            pool,
            rating_store,
            settings,
            content_info,
            controller,
            timer,
        })
    }

    /// Start the mock playback using the rolling-credits offset from the
    /// settings source. Falls back to default settings when it fails.
    pub async fn start_playback(&self) -> OverlaySettings {
        let settings = match self.settings.get_overlay_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Playback uses default settings: {}", err);
                OverlaySettings::default()
            }
        };

        let duration_ms = self.config.playback.duration_ms;
        let offset_ms = settings.rolling_credits_offset_ms();
        log::info!(
            "Starting playback of {} ({}ms, credits at {}ms)",
            self.config.content_id,
            duration_ms,
            settings.credits_boundary_ms(duration_ms)
        );
        self.timer.start(duration_ms, offset_ms);
        settings
    }

    pub fn shutdown(&self) {
        self.timer.stop();
        self.controller.shutdown();
    }
}

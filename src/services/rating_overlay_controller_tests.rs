// src/services/rating_overlay_controller_tests.rs
//
// Rating overlay controller behaviour under virtual time
//
// COVERED:
// - Countdown expiry routes by the end-of-content rule
// - A rating or close terminates immediately and routes the host once
// - Already-rated content never shows the overlay
// - Rewinding re-arms the overlay for unrated content
// - Settings and content info fall back when their sources fail
// - Persistence failures are retried once and reported, never surfaced
// - Force hide is idempotent and drops in-flight work

#[cfg(test)]
mod controller_tests {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::domain::overlay::state::FALLBACK_TITLE;
    use crate::domain::{ContentId, ContentInfo, OverlaySettings, OverlayState};
    use crate::error::{AppError, AppResult};
    use crate::events::EventBus;
    use crate::repositories::{
        ContentInfoProvider, InMemoryRatingRepository, MockContentInfoProvider,
        MockMetadataRepository, MockRatingStateStore, MockSettingsProvider, RatingStateStore,
        SettingsProvider,
    };
    use crate::services::overlay_host::OverlayHost;
    use crate::services::playback_timer::{MockPlaybackTimer, PlaybackTimerConfig};
    use crate::services::rating_overlay_controller::{
        ControllerConfig, ControllerDependencies, PostPlaybackRatingController,
    };

    const CONTENT: &str = "content-123";

    #[derive(Default)]
    struct RecordingHost {
        closed: AtomicUsize,
        next: AtomicUsize,
    }

    impl RecordingHost {
        fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }

        fn next(&self) -> usize {
            self.next.load(Ordering::SeqCst)
        }
    }

    impl OverlayHost for RecordingHost {
        fn route_to_closed_screen(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }

        fn route_to_next_content_screen(&self) {
            self.next.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// In-memory store whose writes take a while
    #[derive(Default)]
    struct SlowWriteStore {
        inner: InMemoryRatingRepository,
    }

    #[async_trait]
    impl RatingStateStore for SlowWriteStore {
        async fn has_rated(&self, content_id: &ContentId) -> AppResult<bool> {
            self.inner.has_rated(content_id).await
        }

        async fn set_rated(&self, content_id: &ContentId, rated: bool) -> AppResult<bool> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.inner.set_rated(content_id, rated).await
        }

        async fn is_liked(&self, content_id: &ContentId) -> AppResult<bool> {
            self.inner.is_liked(content_id).await
        }

        async fn set_like(&self, content_id: &ContentId, liked: bool) -> AppResult<bool> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.inner.set_like(content_id, liked).await
        }
    }

    /// Content info source that answers after a delay
    struct SlowContentInfo;

    #[async_trait]
    impl ContentInfoProvider for SlowContentInfo {
        async fn get_content_info(&self, content_id: &ContentId) -> AppResult<ContentInfo> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(ContentInfo::fallback(content_id.as_str()))
        }
    }

    struct Harness {
        controller: PostPlaybackRatingController,
        host: Arc<RecordingHost>,
        bus: Arc<EventBus>,
    }

    impl Harness {
        fn event_count(&self, event_type: &str) -> usize {
            self.bus
                .get_event_log()
                .iter()
                .filter(|entry| entry.event_type == event_type)
                .count()
        }
    }

    fn spawn_with(
        rating_store: Arc<dyn RatingStateStore>,
        settings: Arc<dyn SettingsProvider>,
        content_info: Arc<dyn ContentInfoProvider>,
        config: ControllerConfig,
    ) -> Harness {
        let host = Arc::new(RecordingHost::default());
        let bus = Arc::new(EventBus::new());
        let deps = ControllerDependencies {
            rating_store,
            content_info,
            settings,
            host: host.clone(),
            event_bus: bus.clone(),
        };

        Harness {
            controller: PostPlaybackRatingController::spawn(ContentId::from(CONTENT), deps, config),
            host,
            bus,
        }
    }

    fn spawn_default(store: Arc<InMemoryRatingRepository>) -> Harness {
        let metadata = Arc::new(MockMetadataRepository::new());
        spawn_with(store, metadata.clone(), metadata, ControllerConfig::default())
    }

    fn spawn_with_settings(settings: OverlaySettings) -> Harness {
        let metadata = Arc::new(MockMetadataRepository::with_settings(settings));
        spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            metadata.clone(),
            metadata,
            ControllerConfig::default(),
        )
    }

    /// Let every runnable task finish its work
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Drive playback into the credits of a 30s item
    async fn reach_credits(harness: &Harness) {
        settle().await;
        harness.controller.on_duration_changed(30_000);
        harness.controller.on_playback_position_changed(27_000);
        harness.controller.on_credits_start(27_000);
        settle().await;
    }

    fn remaining(harness: &Harness) -> Option<u32> {
        harness.controller.current_state().remaining_seconds()
    }

    // ------------------------------------------------------------------
    // Countdown
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_countdown_expiry_before_end_routes_to_closed_screen() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        match harness.controller.current_state() {
            OverlayState::Visible(session) => {
                assert_eq!(session.remaining_seconds, 10);
                assert_eq!(session.title, FALLBACK_TITLE);
                assert!(!session.rating_already_given);
            }
            other => panic!("expected Visible, got {:?}", other),
        }

        advance(1_000).await;
        assert_eq!(remaining(&harness), Some(9));

        advance(8_500).await;
        assert_eq!(remaining(&harness), Some(1));

        advance(1_000).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);
        assert_eq!(harness.host.next(), 0);
        assert_eq!(harness.event_count("RatingOverlayShown"), 1);
        assert_eq!(harness.event_count("RatingCountdownExpired"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_expiry_after_end_navigates_to_next() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        advance(3_000).await;
        harness.controller.on_end_reached();

        advance(7_500).await;
        assert_eq!(harness.controller.current_state(), OverlayState::NavigateToNext);
        assert_eq!(harness.host.next(), 1);
        assert_eq!(harness.host.closed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_at_duration_counts_as_end() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        harness.controller.on_playback_position_changed(30_000);
        advance(10_500).await;

        assert_eq!(harness.controller.current_state(), OverlayState::NavigateToNext);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_duration_never_counts_as_end() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        settle().await;

        harness.controller.on_playback_position_changed(90_000);
        harness.controller.on_credits_start(90_000);
        settle().await;
        advance(10_500).await;

        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_never_publishes_zero() {
        let harness = spawn_with_settings(OverlaySettings {
            display_time_seconds: 2,
            ..OverlaySettings::default()
        });
        reach_credits(&harness).await;

        let mut rx = harness.controller.subscribe();
        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let terminal = state.is_terminal();
                seen.push(state);
                if terminal {
                    break;
                }
            }
            seen
        });

        advance(2_500).await;
        let seen = watcher.await.unwrap();

        assert!(seen.iter().all(|s| s.remaining_seconds() != Some(0)));
        assert_eq!(seen.last(), Some(&OverlayState::Closed));
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_countdown_capped_at_sixty_seconds() {
        let harness = spawn_with_settings(OverlaySettings {
            display_time_seconds: 120,
            max_display_time_seconds: 90,
            ..OverlaySettings::default()
        });
        reach_credits(&harness).await;

        assert_eq!(remaining(&harness), Some(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_display_time_clamps_to_one_second() {
        let harness = spawn_with_settings(OverlaySettings {
            display_time_seconds: -5,
            ..OverlaySettings::default()
        });
        reach_credits(&harness).await;

        assert_eq!(remaining(&harness), Some(1));
        advance(1_000).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_failure_uses_defaults() {
        let mut settings = MockSettingsProvider::new();
        settings
            .expect_get_overlay_settings()
            .returning(|| Err(AppError::Http("503 Service Unavailable".to_string())));

        let harness = spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            Arc::new(settings),
            Arc::new(MockMetadataRepository::new()),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        assert_eq!(remaining(&harness), Some(10));
        assert_eq!(harness.event_count("SettingsFallbackApplied"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_settings_applies_to_next_session() {
        let store = Arc::new(InMemoryRatingRepository::new());
        let mut settings = MockSettingsProvider::new();
        let calls = AtomicUsize::new(0);
        settings.expect_get_overlay_settings().returning(move || {
            let display = if calls.fetch_add(1, Ordering::SeqCst) == 0 { 10 } else { 4 };
            Ok(OverlaySettings {
                display_time_seconds: display,
                ..OverlaySettings::default()
            })
        });

        let harness = spawn_with(
            store,
            Arc::new(settings),
            Arc::new(MockMetadataRepository::new()),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;
        assert_eq!(remaining(&harness), Some(10));

        harness.controller.reload_settings();
        harness.controller.on_close_pressed();
        settle().await;

        harness.controller.on_playback_position_changed(1_000);
        harness.controller.on_credits_start(27_000);
        settle().await;
        assert_eq!(remaining(&harness), Some(4));
    }

    // ------------------------------------------------------------------
    // Content info
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_content_info_shown_on_overlay() {
        let mut content = MockContentInfoProvider::new();
        content.expect_get_content_info().returning(|id| {
            Ok(ContentInfo {
                id: id.to_string(),
                title: "Night Harbour".to_string(),
                poster_url: "https://cdn.example.com/night-harbour.jpg".to_string(),
            })
        });

        let harness = spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            Arc::new(MockMetadataRepository::new()),
            Arc::new(content),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        match harness.controller.current_state() {
            OverlayState::Visible(session) => {
                assert_eq!(session.title, "Night Harbour");
                assert_eq!(session.poster_url, "https://cdn.example.com/night-harbour.jpg");
            }
            other => panic!("expected Visible, got {:?}", other),
        }
        assert_eq!(harness.event_count("ContentInfoFallbackApplied"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_info_failure_uses_fallback() {
        let mut content = MockContentInfoProvider::new();
        content
            .expect_get_content_info()
            .returning(|_| Err(AppError::Http("connection refused".to_string())));

        let harness = spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            Arc::new(MockMetadataRepository::new()),
            Arc::new(content),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        match harness.controller.current_state() {
            OverlayState::Visible(session) => assert_eq!(session.title, FALLBACK_TITLE),
            other => panic!("expected Visible, got {:?}", other),
        }
        assert_eq!(harness.event_count("ContentInfoFallbackApplied"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_state_while_content_info_pending() {
        let metadata = Arc::new(MockMetadataRepository::new());
        let harness = spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            metadata,
            Arc::new(SlowContentInfo),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Loading);

        // Intents while loading are ignored
        harness.controller.on_close_pressed();
        advance(600).await;

        assert_eq!(remaining(&harness), Some(10));
        assert_eq!(harness.host.closed(), 0);
    }

    // ------------------------------------------------------------------
    // Ratings
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_love_mid_countdown_closes_and_persists() {
        let store = Arc::new(InMemoryRatingRepository::new());
        let harness = spawn_default(store.clone());
        reach_credits(&harness).await;

        advance(4_500).await;
        assert_eq!(remaining(&harness), Some(6));

        harness.controller.on_love();
        settle().await;

        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);

        let persisted = store.get_record(&ContentId::from(CONTENT)).unwrap();
        assert!(persisted.has_rated);
        assert!(persisted.is_liked);

        let record = harness.controller.rating_record();
        assert!(record.has_rated);
        assert!(record.is_liked);
        assert!(!harness.controller.closed_without_rating());

        // Countdown is gone: nothing else happens
        advance(20_000).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);
        assert_eq!(harness.event_count("RatingCountdownExpired"), 0);
        assert_eq!(harness.event_count("RatingSubmitted"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dislike_persists_rated_but_not_liked() {
        let store = Arc::new(InMemoryRatingRepository::new());
        let harness = spawn_default(store.clone());
        reach_credits(&harness).await;

        harness.controller.on_dislike();
        settle().await;

        let persisted = store.get_record(&ContentId::from(CONTENT)).unwrap();
        assert!(persisted.has_rated);
        assert!(!persisted.is_liked);
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rating_while_hidden_is_ignored() {
        let store = Arc::new(InMemoryRatingRepository::new());
        let harness = spawn_default(store.clone());
        settle().await;

        harness.controller.on_like();
        harness.controller.on_close_pressed();
        settle().await;

        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
        assert!(store.get_record(&ContentId::from(CONTENT)).is_none());
        assert_eq!(harness.host.closed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_rated_content_never_shows() {
        let store = Arc::new(InMemoryRatingRepository::new());
        store
            .set_like(&ContentId::from(CONTENT), true)
            .await
            .unwrap();

        let harness = spawn_default(store);
        reach_credits(&harness).await;
        advance(15_000).await;

        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
        assert_eq!(harness.event_count("RatingOverlaySuppressed"), 1);
        assert_eq!(harness.event_count("RatingOverlayShown"), 0);
        assert_eq!(harness.host.closed() + harness.host.next(), 0);
        assert!(harness.controller.rating_record().is_liked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rated_in_session_suppresses_replay() {
        let store = Arc::new(InMemoryRatingRepository::new());
        let harness = spawn_default(store);
        reach_credits(&harness).await;

        harness.controller.on_like();
        settle().await;

        harness.controller.on_playback_position_changed(2_000);
        harness.controller.on_credits_start(27_000);
        settle().await;

        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.event_count("RatingOverlaySuppressed"), 1);
        assert_eq!(harness.event_count("RatingOverlayShown"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_credits_during_pending_write_waits_for_write() {
        let store = Arc::new(SlowWriteStore::default());
        let metadata = Arc::new(MockMetadataRepository::new());
        let harness = spawn_with(
            store.clone(),
            metadata.clone(),
            metadata,
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        harness.controller.on_love();
        settle().await;
        harness.controller.on_playback_position_changed(1_000);
        harness.controller.on_credits_start(27_000);
        settle().await;

        // Writes still in flight: nothing decided yet
        assert_eq!(harness.event_count("RatingOverlaySuppressed"), 0);

        advance(1_500).await;
        assert_eq!(harness.event_count("RatingOverlaySuppressed"), 1);
        assert_eq!(harness.event_count("RatingOverlayShown"), 1);
        assert!(store.inner.get_record(&ContentId::from(CONTENT)).unwrap().has_rated);
    }

    // ------------------------------------------------------------------
    // Persistence failures
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_persist_failure_is_retried_once_and_reported() {
        let mut store = MockRatingStateStore::new();
        store.expect_has_rated().returning(|_| Ok(false));
        store.expect_is_liked().returning(|_| Ok(false));
        store
            .expect_set_like()
            .times(2)
            .returning(|_, _| Err(AppError::Other("disk full".to_string())));
        store.expect_set_rated().times(1).returning(|_, _| Ok(true));

        let metadata = Arc::new(MockMetadataRepository::new());
        let harness = spawn_with(
            Arc::new(store),
            metadata.clone(),
            metadata,
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        harness.controller.on_like();
        settle().await;

        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);
        assert_eq!(harness.event_count("RatingPersistFailed"), 1);
        // Optimistic in-memory state survives the failed write
        assert!(harness.controller.rating_record().is_liked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_reporting_false_counts_as_failure() {
        let mut store = MockRatingStateStore::new();
        store.expect_has_rated().returning(|_| Ok(false));
        store.expect_is_liked().returning(|_| Ok(false));
        store.expect_set_like().times(1).returning(|_, _| Ok(true));
        store.expect_set_rated().times(2).returning(|_, _| Ok(false));

        let metadata = Arc::new(MockMetadataRepository::new());
        let harness = spawn_with(
            Arc::new(store),
            metadata.clone(),
            metadata,
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        harness.controller.on_dislike();
        settle().await;

        assert_eq!(harness.event_count("RatingPersistFailed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_read_failure_falls_back_to_memory() {
        let mut store = MockRatingStateStore::new();
        let calls = AtomicUsize::new(0);
        store.expect_has_rated().returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(true)
            } else {
                Err(AppError::Other("database is locked".to_string()))
            }
        });
        store.expect_is_liked().returning(|_| Ok(true));

        let metadata = Arc::new(MockMetadataRepository::new());
        let harness = spawn_with(
            Arc::new(store),
            metadata.clone(),
            metadata,
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;

        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
        assert_eq!(harness.event_count("RatingOverlaySuppressed"), 1);
    }

    // ------------------------------------------------------------------
    // Close and hide
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_routes_once() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        harness.controller.on_close_pressed();
        harness.controller.on_close_pressed();
        settle().await;
        advance(15_000).await;

        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);
        assert!(harness.controller.closed_without_rating());
        assert_eq!(harness.event_count("RatingOverlayDismissed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewind_after_close_shows_overlay_again() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        advance(3_500).await;
        harness.controller.on_close_pressed();
        settle().await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);

        harness.controller.on_playback_position_changed(1_000);
        advance(26_000).await;
        harness.controller.on_credits_start(27_000);
        settle().await;

        assert_eq!(remaining(&harness), Some(10));
        assert!(!harness.controller.closed_without_rating());

        advance(10_500).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 2);
        assert_eq!(harness.event_count("RatingOverlayShown"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_hide_is_idempotent_and_never_routes() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        harness.controller.hide_overlay();
        harness.controller.hide_overlay();
        settle().await;
        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);

        advance(15_000).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
        assert_eq!(harness.host.closed() + harness.host.next(), 0);

        harness.controller.on_close_pressed();
        settle().await;
        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_hide_drops_pending_content_info() {
        let harness = spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            Arc::new(MockMetadataRepository::new()),
            Arc::new(SlowContentInfo),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Loading);

        harness.controller.hide_overlay();
        advance(1_000).await;

        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
        assert_eq!(harness.event_count("RatingOverlayShown"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rated_elsewhere_while_loading_releases_loading() {
        // Unrated for the startup load and the first gate, rated afterwards
        let mut store = MockRatingStateStore::new();
        let calls = AtomicUsize::new(0);
        store
            .expect_has_rated()
            .returning(move |_| Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2));
        store.expect_is_liked().returning(|_| Ok(false));

        let harness = spawn_with(
            Arc::new(store),
            Arc::new(MockMetadataRepository::new()),
            Arc::new(SlowContentInfo),
            ControllerConfig::default(),
        );
        reach_credits(&harness).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Loading);

        harness.controller.on_credits_start(27_100);
        settle().await;
        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);

        advance(120_000).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
        assert_eq!(harness.event_count("RatingOverlaySuppressed"), 1);
        assert_eq!(harness.event_count("RatingOverlayShown"), 0);
        assert_eq!(harness.host.closed() + harness.host.next(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_credits_while_visible_routes_each_lifecycle() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;

        advance(3_500).await;
        assert_eq!(remaining(&harness), Some(7));

        harness.controller.on_credits_start(27_000);
        settle().await;
        assert_eq!(remaining(&harness), Some(10));
        assert_eq!(harness.host.closed(), 1);

        advance(10_500).await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.event_count("RatingOverlayShown"), 2);
        assert_eq!(harness.host.closed(), 2);
        assert_eq!(harness.host.next(), 0);
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_late_subscriber_receives_current_state() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        reach_credits(&harness).await;
        advance(2_500).await;

        let rx = harness.controller.subscribe();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().remaining_seconds(), Some(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_closing_below_threshold() {
        let metadata = Arc::new(MockMetadataRepository::new());
        let harness = spawn_with(
            Arc::new(InMemoryRatingRepository::new()),
            metadata.clone(),
            metadata,
            ControllerConfig {
                auto_closing_threshold_seconds: 3,
                ..ControllerConfig::default()
            },
        );
        reach_credits(&harness).await;

        advance(6_500).await;
        assert!(matches!(
            harness.controller.current_state(),
            OverlayState::Visible(_)
        ));

        advance(1_000).await;
        assert_eq!(
            harness.controller.current_state(),
            OverlayState::AutoClosing {
                remaining_seconds: 3
            }
        );

        // Still accepts a rating
        harness.controller.on_like();
        settle().await;
        assert_eq!(harness.controller.current_state(), OverlayState::Closed);
        assert_eq!(harness.host.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signals_after_shutdown_are_dropped() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        settle().await;

        harness.controller.shutdown();
        settle().await;
        harness.controller.on_credits_start(27_000);
        settle().await;

        assert_eq!(harness.controller.current_state(), OverlayState::Hidden);
    }

    // ------------------------------------------------------------------
    // Driven by the mock playback timer
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_mock_playback_drives_full_lifecycle() {
        let harness = spawn_default(Arc::new(InMemoryRatingRepository::new()));
        let timer = MockPlaybackTimer::new(
            Arc::new(harness.controller.clone()),
            PlaybackTimerConfig::default(),
        );

        // Credits at 7s, end at 10s, countdown expires at 17s
        timer.start(10_000, OverlaySettings::default().rolling_credits_offset_ms());

        advance(7_500).await;
        assert_eq!(remaining(&harness), Some(10));

        advance(9_000).await;
        assert_eq!(remaining(&harness), Some(1));
        assert!(!timer.is_running());

        advance(1_000).await;
        assert_eq!(harness.controller.current_state(), OverlayState::NavigateToNext);
        assert_eq!(harness.host.next(), 1);
    }
}

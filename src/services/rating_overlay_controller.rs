// src/services/rating_overlay_controller.rs
//
// Post-Playback Rating Controller
//
// ARCHITECTURE:
// - One actor task per content-playback session owns all overlay state
// - Playback signals, user intents and async completions share one inbox,
//   processed strictly in arrival order
// - The countdown tick is polled in the same select as the inbox, inbox first,
//   so a close/rating/hide is always applied before the next tick
// - Persistence and metadata calls run in spawned tasks and re-enter the
//   inbox as ordinary events tagged with the session generation
//
// CRITICAL RULES:
// - Gating always re-reads the store at credits start, never a cached flag
// - Every overlay lifecycle ends in exactly one host route
// - No error here ever surfaces to the caller or blocks a terminal state

use serde::{Deserialize, Serialize};
use std::future::pending;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::domain::{
    ContentId, ContentInfo, OverlayRoute, OverlaySession, OverlaySettings, OverlayState,
    PlaybackClock, RatingKind, RatingRecord,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    ContentInfoFallbackApplied, EventBus, RatingCountdownExpired, RatingOverlayDismissed,
    RatingOverlayShown, RatingOverlaySuppressed, RatingPersistFailed, RatingSubmitted,
    SettingsFallbackApplied,
};
use crate::repositories::{ContentInfoProvider, RatingStateStore, SettingsProvider};
use crate::services::overlay_host::{route_host, OverlayHost};
use crate::services::playback_timer::PlaybackSignalSink;

/// Initial attempt plus one best-effort retry
const PERSIST_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Countdown tick period
    pub tick_interval_ms: u64,
    /// Emit AutoClosing instead of Visible once remaining seconds drop to
    /// this value. Zero disables the substate.
    pub auto_closing_threshold_seconds: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            auto_closing_threshold_seconds: 0,
        }
    }
}

/// Collaborators the controller talks to
#[derive(Clone)]
pub struct ControllerDependencies {
    pub rating_store: Arc<dyn RatingStateStore>,
    pub content_info: Arc<dyn ContentInfoProvider>,
    pub settings: Arc<dyn SettingsProvider>,
    pub host: Arc<dyn OverlayHost>,
    pub event_bus: Arc<EventBus>,
}

#[derive(Debug)]
enum ControllerEvent {
    // Playback signals
    DurationChanged(u64),
    PositionChanged(u64),
    CreditsStart(u64),
    EndReached,

    // User intents
    RatingSelected(RatingKind),
    ClosePressed,

    // Host
    ForceHide,
    ReloadSettings,
    Shutdown,

    // Async completions
    SettingsLoaded(AppResult<OverlaySettings>),
    RecordLoaded(AppResult<(bool, bool)>),
    GateResolved {
        generation: u64,
        has_rated: AppResult<bool>,
    },
    ContentInfoLoaded {
        generation: u64,
        info: AppResult<ContentInfo>,
    },
    RatingPersisted(Vec<PersistFailure>),

    CountdownTick,
}

#[derive(Debug, Clone, Copy)]
enum PersistOp {
    SetLike(bool),
    SetRated,
}

impl PersistOp {
    fn name(self) -> &'static str {
        match self {
            PersistOp::SetLike(_) => "set_like",
            PersistOp::SetRated => "set_rated",
        }
    }
}

#[derive(Debug)]
struct PersistFailure {
    operation: &'static str,
    attempts: u32,
    reason: String,
}

/// Handle to a running rating overlay controller.
///
/// All methods are fire-and-forget: they enqueue the event and return.
/// Cloning the handle shares the same controller.
#[derive(Clone)]
pub struct PostPlaybackRatingController {
    content_id: ContentId,
    inbox: mpsc::UnboundedSender<ControllerEvent>,
    state: watch::Receiver<OverlayState>,
    record: Arc<Mutex<RatingRecord>>,
    closed_without_rating: Arc<AtomicBool>,
}

impl PostPlaybackRatingController {
    /// Start the controller task for `content_id`.
    ///
    /// Must be called from within a tokio runtime. Settings and the
    /// persisted rating record start loading immediately.
    pub fn spawn(
        content_id: ContentId,
        deps: ControllerDependencies,
        config: ControllerConfig,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(OverlayState::Hidden);
        let record = Arc::new(Mutex::new(RatingRecord::unrated(content_id.clone())));
        let closed_without_rating = Arc::new(AtomicBool::new(false));

        let actor = ControllerActor {
            content_id: content_id.clone(),
            deps,
            config,
            inbox: inbox_tx.downgrade(),
            state: state_tx,
            record: Arc::clone(&record),
            closed_without_rating: Arc::clone(&closed_without_rating),
            settings: OverlaySettings::default(),
            clock: PlaybackClock::default(),
            generation: 0,
            session: None,
            countdown: None,
            lifecycle_open: false,
            rated_in_session: false,
            pending_writes: 0,
            deferred_credits: false,
        };

        tokio::spawn(actor.run(inbox_rx));

        Self {
            content_id,
            inbox: inbox_tx,
            state: state_rx,
            record,
            closed_without_rating,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    /// Latest overlay state
    pub fn current_state(&self) -> OverlayState {
        self.state.borrow().clone()
    }

    /// Subscribe to overlay states. The receiver sees the current value
    /// immediately.
    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        let mut rx = self.state.clone();
        rx.mark_changed();
        rx
    }

    /// In-memory rating state, optimistically updated on selection
    pub fn rating_record(&self) -> RatingRecord {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether the last overlay was closed without a rating.
    /// Observability only, never used for gating.
    pub fn closed_without_rating(&self) -> bool {
        self.closed_without_rating.load(Ordering::SeqCst)
    }

    pub fn on_duration_changed(&self, duration_ms: u64) {
        self.send(ControllerEvent::DurationChanged(duration_ms));
    }

    pub fn on_playback_position_changed(&self, position_ms: u64) {
        self.send(ControllerEvent::PositionChanged(position_ms));
    }

    /// The only signal that can open the overlay
    pub fn on_credits_start(&self, position_ms: u64) {
        self.send(ControllerEvent::CreditsStart(position_ms));
    }

    pub fn on_end_reached(&self) {
        self.send(ControllerEvent::EndReached);
    }

    pub fn on_rating_selected(&self, kind: RatingKind) {
        self.send(ControllerEvent::RatingSelected(kind));
    }

    pub fn on_like(&self) {
        self.on_rating_selected(RatingKind::Like);
    }

    pub fn on_love(&self) {
        self.on_rating_selected(RatingKind::Love);
    }

    pub fn on_dislike(&self) {
        self.on_rating_selected(RatingKind::Dislike);
    }

    pub fn on_close_pressed(&self) {
        self.send(ControllerEvent::ClosePressed);
    }

    /// Host navigating away: drop everything and go Hidden. Idempotent.
    pub fn hide_overlay(&self) {
        self.send(ControllerEvent::ForceHide);
    }

    /// Fetch settings again; the last completed load wins
    pub fn reload_settings(&self) {
        self.send(ControllerEvent::ReloadSettings);
    }

    /// Stop the controller task
    pub fn shutdown(&self) {
        self.send(ControllerEvent::Shutdown);
    }

    fn send(&self, event: ControllerEvent) {
        if let Err(err) = self.inbox.send(event) {
            log::debug!(
                "Rating controller for {} is gone, dropping {:?}",
                self.content_id,
                err.0
            );
        }
    }
}

impl PlaybackSignalSink for PostPlaybackRatingController {
    fn on_duration_changed(&self, duration_ms: u64) {
        PostPlaybackRatingController::on_duration_changed(self, duration_ms);
    }

    fn on_playback_position_changed(&self, position_ms: u64) {
        PostPlaybackRatingController::on_playback_position_changed(self, position_ms);
    }

    fn on_credits_start(&self, position_ms: u64) {
        PostPlaybackRatingController::on_credits_start(self, position_ms);
    }

    fn on_end_reached(&self) {
        PostPlaybackRatingController::on_end_reached(self);
    }
}

struct ControllerActor {
    content_id: ContentId,
    deps: ControllerDependencies,
    config: ControllerConfig,
    inbox: mpsc::WeakUnboundedSender<ControllerEvent>,
    state: watch::Sender<OverlayState>,
    record: Arc<Mutex<RatingRecord>>,
    closed_without_rating: Arc<AtomicBool>,

    settings: OverlaySettings,
    clock: PlaybackClock,
    /// Bumped whenever in-flight gate/content loads become obsolete
    generation: u64,
    session: Option<OverlaySession>,
    countdown: Option<Interval>,
    /// A lifecycle is open from Visible until its single host route
    lifecycle_open: bool,
    rated_in_session: bool,
    pending_writes: usize,
    /// Credits start that arrived while rating writes were in flight
    deferred_credits: bool,
}

impl ControllerActor {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<ControllerEvent>) {
        log::debug!("Rating controller started for {}", self.content_id);
        self.load_settings();
        self.load_record();

        loop {
            let event = tokio::select! {
                biased;
                event = inbox.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = next_tick(&mut self.countdown) => ControllerEvent::CountdownTick,
            };

            if !self.handle(event) {
                break;
            }
        }

        self.countdown = None;
        log::debug!("Rating controller stopped for {}", self.content_id);
    }

    /// Returns false when the actor should stop
    fn handle(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::DurationChanged(duration_ms) => self.clock.duration_ms = duration_ms,
            ControllerEvent::PositionChanged(position_ms) => self.clock.position_ms = position_ms,
            ControllerEvent::EndReached => self.clock.end_reached = true,
            ControllerEvent::CreditsStart(position_ms) => self.on_credits_start(position_ms),
            ControllerEvent::RatingSelected(kind) => self.on_rating_selected(kind),
            ControllerEvent::ClosePressed => self.on_close_pressed(),
            ControllerEvent::ForceHide => self.force_hide(),
            ControllerEvent::ReloadSettings => self.load_settings(),
            ControllerEvent::Shutdown => return false,
            ControllerEvent::SettingsLoaded(result) => self.on_settings_loaded(result),
            ControllerEvent::RecordLoaded(result) => self.on_record_loaded(result),
            ControllerEvent::GateResolved {
                generation,
                has_rated,
            } => self.on_gate_resolved(generation, has_rated),
            ControllerEvent::ContentInfoLoaded { generation, info } => {
                self.on_content_info_loaded(generation, info)
            }
            ControllerEvent::RatingPersisted(failures) => self.on_rating_persisted(failures),
            ControllerEvent::CountdownTick => self.on_tick(),
        }
        true
    }

    // ------------------------------------------------------------------
    // Playback signals
    // ------------------------------------------------------------------

    fn on_credits_start(&mut self, position_ms: u64) {
        self.clock.position_ms = position_ms;

        if self.pending_writes > 0 {
            log::debug!(
                "Credits start for {} deferred until {} rating write(s) finish",
                self.content_id,
                self.pending_writes
            );
            self.deferred_credits = true;
            return;
        }

        self.begin_gate();
    }

    fn begin_gate(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let store = Arc::clone(&self.deps.rating_store);
        let content_id = self.content_id.clone();

        self.spawn_completion(async move {
            let has_rated = store.has_rated(&content_id).await;
            ControllerEvent::GateResolved {
                generation,
                has_rated,
            }
        });
    }

    fn on_gate_resolved(&mut self, generation: u64, has_rated: AppResult<bool>) {
        if generation != self.generation {
            log::debug!("Dropping stale gate result for {}", self.content_id);
            return;
        }

        let has_rated = match has_rated {
            Ok(has_rated) => {
                self.update_record(|record| record.has_rated = has_rated || record.has_rated);
                has_rated
            }
            Err(err) => {
                let fallback = self.rating_snapshot().has_rated;
                log::warn!(
                    "Could not read rating state for {}: {}. Using in-memory value {}",
                    self.content_id,
                    err,
                    fallback
                );
                fallback
            }
        };

        if has_rated {
            log::debug!("{} already rated, overlay suppressed", self.content_id);
            self.deps
                .event_bus
                .emit(RatingOverlaySuppressed::new(self.content_id.clone()));

            // This gate superseded the content info an earlier one was waiting for
            if *self.state.borrow() == OverlayState::Loading {
                self.publish(OverlayState::Hidden);
            }
            return;
        }

        // A new session replaces whatever was running; the replaced
        // lifecycle still gets its route
        self.countdown = None;
        self.session = None;
        if std::mem::take(&mut self.lifecycle_open) {
            log::debug!("Overlay for {} restarted by credits start", self.content_id);
            route_host(self.deps.host.as_ref(), OverlayRoute::ClosedScreen);
        }
        self.closed_without_rating.store(false, Ordering::SeqCst);
        self.publish(OverlayState::Loading);

        let provider = Arc::clone(&self.deps.content_info);
        let content_id = self.content_id.clone();
        self.spawn_completion(async move {
            let info = provider.get_content_info(&content_id).await;
            ControllerEvent::ContentInfoLoaded { generation, info }
        });
    }

    fn on_content_info_loaded(&mut self, generation: u64, info: AppResult<ContentInfo>) {
        if generation != self.generation || *self.state.borrow() != OverlayState::Loading {
            log::debug!("Dropping stale content info for {}", self.content_id);
            return;
        }

        let info = info.unwrap_or_else(|err| {
            log::warn!(
                "Content info for {} unavailable, using fallback: {}",
                self.content_id,
                err
            );
            self.deps.event_bus.emit(ContentInfoFallbackApplied::new(
                self.content_id.clone(),
                err.to_string(),
            ));
            ContentInfo::fallback(self.content_id.as_str())
        });

        let countdown_seconds = self.settings.countdown_seconds();
        self.session = Some(OverlaySession::new(info, countdown_seconds));
        self.lifecycle_open = true;
        self.countdown = Some(self.new_interval());
        self.publish_session();

        log::info!(
            "Rating overlay shown for {} ({}s countdown)",
            self.content_id,
            countdown_seconds
        );
        self.deps
            .event_bus
            .emit(RatingOverlayShown::new(self.content_id.clone(), countdown_seconds));
    }

    // ------------------------------------------------------------------
    // Countdown
    // ------------------------------------------------------------------

    fn on_tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.countdown = None;
            return;
        };

        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        if session.remaining_seconds > 0 {
            self.publish_session();
            return;
        }

        let route = if self.clock.is_at_or_past_end() {
            OverlayRoute::NextContent
        } else {
            OverlayRoute::ClosedScreen
        };

        log::info!(
            "Rating countdown expired for {}, routing to {:?}",
            self.content_id,
            route
        );
        self.deps
            .event_bus
            .emit(RatingCountdownExpired::new(self.content_id.clone(), route));
        self.terminate(route);
    }

    fn new_interval(&self) -> Interval {
        let period = Duration::from_millis(self.config.tick_interval_ms.max(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    // ------------------------------------------------------------------
    // User intents
    // ------------------------------------------------------------------

    fn on_rating_selected(&mut self, kind: RatingKind) {
        if !self.state.borrow().is_showing() {
            log::debug!(
                "Ignoring {} rating for {} while overlay is {}",
                kind.as_str(),
                self.content_id,
                self.state.borrow().name()
            );
            return;
        }

        self.countdown = None;
        self.rated_in_session = true;
        self.update_record(|record| record.apply(kind));
        self.closed_without_rating.store(false, Ordering::SeqCst);

        log::info!("{} rated {}", self.content_id, kind.as_str());
        self.deps
            .event_bus
            .emit(RatingSubmitted::new(self.content_id.clone(), kind));
        self.terminate(OverlayRoute::ClosedScreen);
        self.persist_rating(kind.is_liked());
    }

    fn on_close_pressed(&mut self) {
        if !self.state.borrow().is_showing() {
            log::debug!(
                "Ignoring close for {} while overlay is {}",
                self.content_id,
                self.state.borrow().name()
            );
            return;
        }

        let without_rating = !self.rating_snapshot().has_rated;
        self.closed_without_rating
            .store(without_rating, Ordering::SeqCst);

        self.deps.event_bus.emit(RatingOverlayDismissed::new(
            self.content_id.clone(),
            without_rating,
        ));
        self.terminate(OverlayRoute::ClosedScreen);
    }

    fn force_hide(&mut self) {
        self.generation += 1;
        self.countdown = None;
        self.session = None;
        self.lifecycle_open = false;
        self.deferred_credits = false;

        if *self.state.borrow() != OverlayState::Hidden {
            log::debug!("Rating overlay for {} force-hidden", self.content_id);
            self.publish(OverlayState::Hidden);
        }
    }

    /// Cancel the countdown, drop the session, publish the terminal state
    /// and route the host once per lifecycle.
    fn terminate(&mut self, route: OverlayRoute) {
        self.countdown = None;
        self.session = None;
        self.publish(route.terminal_state());

        if std::mem::take(&mut self.lifecycle_open) {
            route_host(self.deps.host.as_ref(), route);
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn persist_rating(&mut self, liked: bool) {
        self.pending_writes += 1;
        let store = Arc::clone(&self.deps.rating_store);
        let content_id = self.content_id.clone();

        self.spawn_completion(async move {
            let mut failures = Vec::new();
            for op in [PersistOp::SetLike(liked), PersistOp::SetRated] {
                if let Err(failure) = write_with_retry(store.as_ref(), &content_id, op).await {
                    failures.push(failure);
                }
            }
            ControllerEvent::RatingPersisted(failures)
        });
    }

    fn on_rating_persisted(&mut self, failures: Vec<PersistFailure>) {
        self.pending_writes = self.pending_writes.saturating_sub(1);

        for failure in failures {
            log::warn!(
                "Rating for {} not persisted: {} failed after {} attempt(s): {}",
                self.content_id,
                failure.operation,
                failure.attempts,
                failure.reason
            );
            self.deps.event_bus.emit(RatingPersistFailed::new(
                self.content_id.clone(),
                failure.operation,
                failure.attempts,
                failure.reason,
            ));
        }

        if self.pending_writes == 0 && std::mem::take(&mut self.deferred_credits) {
            self.begin_gate();
        }
    }

    // ------------------------------------------------------------------
    // Startup loads
    // ------------------------------------------------------------------

    fn load_settings(&mut self) {
        let provider = Arc::clone(&self.deps.settings);
        self.spawn_completion(async move {
            ControllerEvent::SettingsLoaded(provider.get_overlay_settings().await)
        });
    }

    fn on_settings_loaded(&mut self, result: AppResult<OverlaySettings>) {
        match result {
            Ok(settings) => {
                log::debug!("Overlay settings loaded: {:?}", settings);
                self.settings = settings;
            }
            Err(err) => {
                log::warn!("Overlay settings unavailable, keeping {:?}: {}", self.settings, err);
                self.deps
                    .event_bus
                    .emit(SettingsFallbackApplied::new(err.to_string()));
            }
        }
    }

    fn load_record(&mut self) {
        let store = Arc::clone(&self.deps.rating_store);
        let content_id = self.content_id.clone();
        self.spawn_completion(async move {
            let result = async {
                let has_rated = store.has_rated(&content_id).await?;
                let is_liked = store.is_liked(&content_id).await?;
                Ok::<_, AppError>((has_rated, is_liked))
            }
            .await;
            ControllerEvent::RecordLoaded(result)
        });
    }

    fn on_record_loaded(&mut self, result: AppResult<(bool, bool)>) {
        match result {
            Ok((has_rated, is_liked)) if !self.rated_in_session => {
                self.update_record(|record| {
                    record.has_rated = has_rated;
                    record.is_liked = is_liked;
                });
            }
            Ok(_) => {}
            Err(err) => log::warn!(
                "Could not load rating state for {}: {}",
                self.content_id,
                err
            ),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn publish(&self, state: OverlayState) {
        log::debug!("Overlay state for {} -> {}", self.content_id, state.name());
        self.state.send_replace(state);
    }

    fn publish_session(&self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let threshold = self.config.auto_closing_threshold_seconds;
        let state = if threshold > 0 && session.remaining_seconds <= threshold {
            OverlayState::AutoClosing {
                remaining_seconds: session.remaining_seconds,
            }
        } else {
            OverlayState::Visible(session.clone())
        };
        self.state.send_replace(state);
    }

    fn rating_snapshot(&self) -> RatingRecord {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update_record<F>(&self, mutate: F)
    where
        F: FnOnce(&mut RatingRecord),
    {
        let mut record = self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        mutate(&mut record);
    }

    /// Run `work` off the processing line and feed its result back into
    /// the inbox.
    fn spawn_completion<F>(&self, work: F)
    where
        F: std::future::Future<Output = ControllerEvent> + Send + 'static,
    {
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let event = work.await;
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox.send(event);
            }
        });
    }
}

async fn next_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn write_with_retry(
    store: &dyn RatingStateStore,
    content_id: &ContentId,
    op: PersistOp,
) -> Result<(), PersistFailure> {
    let mut reason = String::new();

    for attempt in 1..=PERSIST_ATTEMPTS {
        let result = match op {
            PersistOp::SetLike(liked) => store.set_like(content_id, liked).await,
            PersistOp::SetRated => store.set_rated(content_id, true).await,
        };

        match result {
            Ok(true) => return Ok(()),
            Ok(false) => reason = "store did not persist the value".to_string(),
            Err(err) => reason = err.to_string(),
        }

        log::debug!(
            "{} for {} failed (attempt {}/{}): {}",
            op.name(),
            content_id,
            attempt,
            PERSIST_ATTEMPTS,
            reason
        );
    }

    Err(PersistFailure {
        operation: op.name(),
        attempts: PERSIST_ATTEMPTS,
        reason,
    })
}

// src/main.rs
//
// Headless demo: plays one mock item and logs every overlay state until the
// overlay lifecycle and playback are both over.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use env_logger::{Builder, Target};
use log::LevelFilter;

use post_playback_rating::application::{AppConfig, AppState};
use post_playback_rating::domain::OverlayState;
use post_playback_rating::events::{RatingOverlayShown, RatingPersistFailed};
use post_playback_rating::services::LoggingOverlayHost;

/// Longest countdown plus slack
const MAX_OVERLAY_WAIT: Duration = Duration::from_secs(70);

fn init_logger() {
    if std::env::var("RUST_LOG").is_err() {
        Builder::new()
            .target(Target::Stdout)
            .filter_level(LevelFilter::Warn)
            .filter_module("post_playback_rating", LevelFilter::Info)
            .init();
    } else {
        env_logger::init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    // 1. CONFIGURATION
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("failed to load config")?;

    // 2. APPLICATION STATE
    let state = AppState::build(config, Arc::new(LoggingOverlayHost))
        .context("failed to build application state")?;

    // 3. EVENT HANDLER REGISTRATION
    state.event_bus.subscribe::<RatingOverlayShown, _>(|event| {
        log::info!(
            "Overlay for {} counting down from {}s",
            event.content_id,
            event.countdown_seconds
        );
    });
    state.event_bus.subscribe::<RatingPersistFailed, _>(|event| {
        log::error!(
            "Rating for {} was not saved ({}): {}",
            event.content_id,
            event.operation,
            event.reason
        );
    });

    // 4. PLAYBACK
    let mut states = state.controller.subscribe();
    state.start_playback().await;

    let deadline = Duration::from_millis(state.config.playback.duration_ms) + MAX_OVERLAY_WAIT;
    let poll = Duration::from_millis(state.config.playback.tick_interval_ms.max(1));
    let run = async {
        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    log::info!("Overlay state: {:?}", *states.borrow_and_update());
                }
                _ = tokio::time::sleep(poll) => {}
            }

            // Hidden after playback ended means the overlay was suppressed
            let current = state.controller.current_state();
            let overlay_done = current.is_terminal() || current == OverlayState::Hidden;
            if overlay_done && !state.timer.is_running() {
                break;
            }
        }
    };

    if tokio::time::timeout(deadline, run).await.is_err() {
        log::warn!("Demo stopped after {:?} without a terminal overlay state", deadline);
    }

    let record = state.controller.rating_record();
    log::info!(
        "Final rating state for {}: rated={} liked={} closed_without_rating={}",
        record.content_id,
        record.has_rated,
        record.is_liked,
        state.controller.closed_without_rating()
    );

    state.shutdown();
    Ok(())
}

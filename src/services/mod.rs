// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod overlay_host;
pub mod playback_timer;
pub mod rating_overlay_controller;

#[cfg(test)]
mod rating_overlay_controller_tests;

pub use overlay_host::{route_host, LoggingOverlayHost, OverlayHost};

pub use playback_timer::{MockPlaybackTimer, PlaybackSignalSink, PlaybackTimerConfig};

pub use rating_overlay_controller::{
    ControllerConfig,
    ControllerDependencies,
    PostPlaybackRatingController,
};

// src/services/overlay_host.rs
//
// Navigation hooks of the host application. Each overlay lifecycle ends
// in exactly one of these calls.

use crate::domain::OverlayRoute;

#[cfg_attr(test, mockall::automock)]
pub trait OverlayHost: Send + Sync {
    /// Overlay dismissed: back to the end-of-playback screen
    fn route_to_closed_screen(&self);

    /// Countdown ran out at or after the end of playback
    fn route_to_next_content_screen(&self);
}

/// Dispatch a route to the matching host hook
pub fn route_host(host: &dyn OverlayHost, route: OverlayRoute) {
    match route {
        OverlayRoute::ClosedScreen => host.route_to_closed_screen(),
        OverlayRoute::NextContent => host.route_to_next_content_screen(),
    }
}

/// Host that only logs, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingOverlayHost;

impl OverlayHost for LoggingOverlayHost {
    fn route_to_closed_screen(&self) {
        log::info!("Routing to closed screen");
    }

    fn route_to_next_content_screen(&self) {
        log::info!("Routing to next content screen");
    }
}

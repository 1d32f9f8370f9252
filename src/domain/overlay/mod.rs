pub mod clock;
pub mod settings;
pub mod state;

pub use clock::PlaybackClock;
pub use settings::OverlaySettings;
pub use state::{ContentInfo, OverlayRoute, OverlaySession, OverlayState};

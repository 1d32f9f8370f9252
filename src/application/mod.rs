// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Loads configuration
// - Chooses mock or network collaborators
// - Wires the controller, its stores and the playback source together

pub mod config;
pub mod state;

pub use config::{AppConfig, DataSource, NetworkConfig};
pub use state::AppState;

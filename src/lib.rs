//! Workout Timer - A headless interval workout timer
//! 
//! This library provides a free-run, Tabata and EMOM timer driven by a
//! cancellable one-second tick loop, with best-effort audio cues at phase
//! boundaries and an HTTP control surface for presentation clients.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, WorkoutTimer};
pub use api::create_router;
pub use utils::signals::shutdown_signal;

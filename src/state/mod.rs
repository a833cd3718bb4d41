//! State management module
//! 
//! This module contains all state-related structures and their management logic.

pub mod app_state;
pub mod timer_state;
pub mod view_state;
pub mod workout_timer;

// Re-export main types
pub use app_state::AppState;
pub use timer_state::{
    ConfigField, ConfigOutcome, ConfigRejection, Cue, Phase, TickOutcome, TimerMode,
    TimerSnapshot, TimerState,
};
pub use view_state::ViewState;
pub use workout_timer::WorkoutTimer;

//! Services module
//! 
//! This module contains the collaborators the timer talks to outside its own state.

pub mod cues;

// Re-export main types
pub use cues::{CommandPlayer, CueNotifier, CuePlayer, CueStats, TerminalBell};

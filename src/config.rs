//! Configuration and CLI argument handling

use clap::Parser;
use tracing::warn;

use crate::state::{
    timer_state::{DEFAULT_REST_SECS, DEFAULT_ROUNDS, DEFAULT_WORK_SECS},
    ConfigField, ConfigOutcome, TimerMode, TimerState,
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "workout-timer")]
#[command(about = "A headless interval workout timer with an HTTP control surface")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Initial timer mode
    #[arg(short, long, value_enum, default_value_t = TimerMode::Free)]
    pub mode: TimerMode,

    /// Tabata work phase length in seconds
    #[arg(long, default_value_t = i64::from(DEFAULT_WORK_SECS), allow_negative_numbers = true)]
    pub work: i64,

    /// Tabata rest phase length in seconds
    #[arg(long, default_value_t = i64::from(DEFAULT_REST_SECS), allow_negative_numbers = true)]
    pub rest: i64,

    /// Number of Tabata rounds
    #[arg(long, default_value_t = i64::from(DEFAULT_ROUNDS), allow_negative_numbers = true)]
    pub rounds: i64,

    /// Program spawned for every cue, receives the cue name as its argument.
    /// Rings the terminal bell when unset.
    #[arg(long)]
    pub cue_command: Option<String>,

    /// Start with audio cues muted
    #[arg(long)]
    pub mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Build the initial timer state. Invalid Tabata values fall back to the defaults.
    pub fn initial_timer_state(&self) -> TimerState {
        let mut state = TimerState::with_mode(self.mode);
        for (field, value) in [
            (ConfigField::WorkDuration, self.work),
            (ConfigField::RestDuration, self.rest),
            (ConfigField::Rounds, self.rounds),
        ] {
            if let ConfigOutcome::Kept { value: kept, reason } = state.set_config(field, value) {
                warn!("Ignoring {:?}={} from the command line ({:?}), using {}", field, value, reason, kept);
            }
        }
        state
    }
}

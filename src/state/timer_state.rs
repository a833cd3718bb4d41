//! Timer state machine for the free, Tabata and EMOM disciplines
//!
//! Everything in here is synchronous and free of I/O. The owning
//! [`WorkoutTimer`](super::WorkoutTimer) serialises calls and turns the
//! returned [`TickOutcome`]s into audio cues.

use serde::{Deserialize, Serialize};

use crate::utils::format_clock;

pub const DEFAULT_WORK_SECS: u32 = 20;
pub const DEFAULT_REST_SECS: u32 = 10;
pub const DEFAULT_ROUNDS: u32 = 8;

pub const MAX_ROUNDS: u32 = 999;
pub const MAX_DURATION_SECS: u32 = 86_400;

const SECONDS_PER_MINUTE: u32 = 60;

/// Counting discipline of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Plain stopwatch, counts up forever
    #[default]
    Free,
    /// Alternating work/rest intervals for a fixed number of rounds
    Tabata,
    /// Every minute on the minute
    Emom,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Free => "free",
            TimerMode::Tabata => "tabata",
            TimerMode::Emom => "emom",
        }
    }
}

/// Editable Tabata settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Rounds,
    #[serde(alias = "workDuration")]
    WorkDuration,
    #[serde(alias = "restDuration")]
    RestDuration,
}

impl ConfigField {
    fn max(&self) -> u32 {
        match self {
            ConfigField::Rounds => MAX_ROUNDS,
            ConfigField::WorkDuration | ConfigField::RestDuration => MAX_DURATION_SECS,
        }
    }
}

/// Why a config edit left the previous value in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigRejection {
    Running,
    NotPositive,
    NotInteger,
    TooLarge,
}

/// Result of a config edit. A rejected edit is not an error, the old value is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfigOutcome {
    Applied { value: u32 },
    Kept { value: u32, reason: ConfigRejection },
}

impl ConfigOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ConfigOutcome::Applied { .. })
    }

    pub fn value(&self) -> u32 {
        match self {
            ConfigOutcome::Applied { value } | ConfigOutcome::Kept { value, .. } => *value,
        }
    }
}

/// Boundary signals emitted by [`TimerState::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Tabata work phase finished, rest begins
    WorkEnded,
    /// Tabata rest phase finished, next round begins
    RestEnded,
    /// Last Tabata rest phase finished, timer stopped
    SessionComplete,
    /// EMOM minute wrapped
    MinuteBoundary,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::WorkEnded => "work-ended",
            Cue::RestEnded => "rest-ended",
            Cue::SessionComplete => "session-complete",
            Cue::MinuteBoundary => "minute-boundary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running, nothing changed
    Idle,
    /// One second counted inside the current phase
    Counted,
    /// One second counted and a phase or minute boundary was crossed
    Boundary(Cue),
}

/// What the current `elapsed` value is counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Free,
    Work,
    Rest,
    Minute,
}

/// Read-only view handed to presentation collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub running: bool,
    pub elapsed: u32,
    pub rounds: u32,
    pub work_duration: u32,
    pub rest_duration: u32,
    pub current_round: u32,
    pub is_work_phase: bool,
    pub minute: u32,
    pub session_seconds: u64,
    pub phase: Phase,
    pub phase_remaining: Option<u32>,
    pub display: String,
}

/// Timer state for one workout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    mode: TimerMode,
    running: bool,
    elapsed: u32,
    rounds: u32,
    work_duration: u32,
    rest_duration: u32,
    current_round: u32,
    is_work_phase: bool,
    minute: u32,
    session_seconds: u64,
}

impl TimerState {
    /// Create a stopped free-mode timer with the default Tabata settings
    pub fn new() -> Self {
        Self {
            mode: TimerMode::Free,
            running: false,
            elapsed: 0,
            rounds: DEFAULT_ROUNDS,
            work_duration: DEFAULT_WORK_SECS,
            rest_duration: DEFAULT_REST_SECS,
            current_round: 1,
            is_work_phase: true,
            minute: 1,
            session_seconds: 0,
        }
    }

    pub fn with_mode(mode: TimerMode) -> Self {
        Self { mode, ..Self::new() }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn work_duration(&self) -> u32 {
        self.work_duration
    }

    pub fn rest_duration(&self) -> u32 {
        self.rest_duration
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn is_work_phase(&self) -> bool {
        self.is_work_phase
    }

    /// EMOM minute number, starting at 1
    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Seconds ticked since the last reset, across every phase
    pub fn session_seconds(&self) -> u64 {
        self.session_seconds
    }

    pub fn config_value(&self, field: ConfigField) -> u32 {
        match field {
            ConfigField::Rounds => self.rounds,
            ConfigField::WorkDuration => self.work_duration,
            ConfigField::RestDuration => self.rest_duration,
        }
    }

    /// Switch discipline. Always performs a full reset.
    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.reset();
    }

    /// Edit one Tabata setting. Only positive values within bounds are
    /// applied, and only while stopped.
    pub fn set_config(&mut self, field: ConfigField, value: i64) -> ConfigOutcome {
        if self.running {
            return self.reject_config(field, ConfigRejection::Running);
        }
        if value < 1 {
            return self.reject_config(field, ConfigRejection::NotPositive);
        }
        let value = match u32::try_from(value) {
            Ok(v) if v <= field.max() => v,
            _ => return self.reject_config(field, ConfigRejection::TooLarge),
        };

        match field {
            ConfigField::Rounds => {
                self.rounds = value;
                // Keep a paused session inside the new round range
                self.current_round = self.current_round.min(value);
            }
            ConfigField::WorkDuration => self.work_duration = value,
            ConfigField::RestDuration => self.rest_duration = value,
        }
        ConfigOutcome::Applied { value }
    }

    /// Report a rejected edit without touching state
    pub fn reject_config(&self, field: ConfigField, reason: ConfigRejection) -> ConfigOutcome {
        ConfigOutcome::Kept {
            value: self.config_value(field),
            reason,
        }
    }

    /// Returns true if the timer was stopped before
    pub fn start(&mut self) -> bool {
        let was_stopped = !self.running;
        self.running = true;
        was_stopped
    }

    /// Stop counting, keeping elapsed time and phase markers. Returns true if
    /// the timer was running before.
    pub fn pause(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.elapsed = 0;
        self.current_round = 1;
        self.is_work_phase = true;
        self.minute = 1;
        self.session_seconds = 0;
    }

    /// Advance by exactly one second
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.session_seconds = self.session_seconds.saturating_add(1);

        match self.mode {
            TimerMode::Free => {
                self.elapsed = self.elapsed.saturating_add(1);
                TickOutcome::Counted
            }
            TimerMode::Tabata => self.tick_tabata(),
            TimerMode::Emom => self.tick_emom(),
        }
    }

    fn tick_tabata(&mut self) -> TickOutcome {
        let phase_len = self.current_phase_len();
        if self.elapsed + 1 < phase_len {
            self.elapsed += 1;
            return TickOutcome::Counted;
        }

        self.elapsed = 0;
        if self.is_work_phase {
            self.is_work_phase = false;
            return TickOutcome::Boundary(Cue::WorkEnded);
        }
        if self.current_round >= self.rounds {
            self.reset();
            return TickOutcome::Boundary(Cue::SessionComplete);
        }
        self.current_round += 1;
        self.is_work_phase = true;
        TickOutcome::Boundary(Cue::RestEnded)
    }

    fn tick_emom(&mut self) -> TickOutcome {
        self.elapsed += 1;
        if self.elapsed < SECONDS_PER_MINUTE {
            return TickOutcome::Counted;
        }
        self.elapsed = 0;
        self.minute = self.minute.saturating_add(1);
        TickOutcome::Boundary(Cue::MinuteBoundary)
    }

    fn current_phase_len(&self) -> u32 {
        if self.is_work_phase {
            self.work_duration
        } else {
            self.rest_duration
        }
    }

    pub fn phase(&self) -> Phase {
        match self.mode {
            TimerMode::Free => Phase::Free,
            TimerMode::Tabata if self.is_work_phase => Phase::Work,
            TimerMode::Tabata => Phase::Rest,
            TimerMode::Emom => Phase::Minute,
        }
    }

    /// Seconds left in the current phase, `None` in free mode
    pub fn phase_remaining(&self) -> Option<u32> {
        match self.mode {
            TimerMode::Free => None,
            TimerMode::Tabata => Some(self.current_phase_len().saturating_sub(self.elapsed)),
            TimerMode::Emom => Some(SECONDS_PER_MINUTE - self.elapsed),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let phase_remaining = self.phase_remaining();
        let display = match self.mode {
            TimerMode::Tabata => format_clock(u64::from(phase_remaining.unwrap_or(0))),
            TimerMode::Free | TimerMode::Emom => format_clock(u64::from(self.elapsed)),
        };

        TimerSnapshot {
            mode: self.mode,
            running: self.running,
            elapsed: self.elapsed,
            rounds: self.rounds,
            work_duration: self.work_duration,
            rest_duration: self.rest_duration,
            current_round: self.current_round,
            is_work_phase: self.is_work_phase,
            minute: self.minute,
            session_seconds: self.session_seconds,
            phase: self.phase(),
            phase_remaining,
            display,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::CueStats,
    state::{ConfigField, ConfigOutcome, TimerMode, TimerSnapshot, ViewState},
};

/// Body of PUT /timer/mode
#[derive(Debug, Clone, Deserialize)]
pub struct ModeRequest {
    pub mode: TimerMode,
}

/// Body of PUT /timer/config. `value` stays a raw JSON number so fractional
/// input can be rejected instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigRequest {
    pub field: ConfigField,
    pub value: serde_json::Number,
}

/// Body of PUT /cues
#[derive(Debug, Clone, Deserialize)]
pub struct CueRequest {
    pub muted: bool,
}

/// API response structure for timer control endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigOutcome>,
}

impl ApiResponse {
    /// Create a new API response, status follows the timer
    pub fn new(message: String, timer: TimerSnapshot) -> Self {
        Self {
            status: if timer.running { "running" } else { "stopped" }.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
            config: None,
        }
    }

    /// Attach the outcome of a config edit
    pub fn with_config(mut self, outcome: ConfigOutcome) -> Self {
        self.config = Some(outcome);
        self
    }
}

/// Response for view endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ViewResponse {
    pub view: ViewState,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

/// Response for the cue endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CueResponse {
    pub cues: CueStats,
    pub timestamp: DateTime<Utc>,
}

/// Status response with timer, view and cue information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub view: ViewState,
    pub cues: CueStats,
    pub ticking: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, info};

use crate::state::{AppState, ConfigRejection, TimerSnapshot, ViewState};
use super::responses::{
    ApiResponse, ConfigRequest, CueRequest, CueResponse, HealthResponse, ModeRequest,
    StatusResponse, ViewResponse,
};

fn internal_error(context: &str, e: String) -> StatusCode {
    error!("Failed to {}: {}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Handle GET /timer - Return the current timer snapshot
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerSnapshot>, StatusCode> {
    state.timer
        .snapshot()
        .map(Json)
        .map_err(|e| internal_error("read timer", e))
}

/// Handle POST /timer/start - Start or resume the timer
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    let timer = state.timer.start().map_err(|e| internal_error("start timer", e))?;
    state.record_action("start");
    info!("Start endpoint called");
    Ok(Json(ApiResponse::new("Timer started".to_string(), timer)))
}

/// Handle POST /timer/pause - Pause the timer, keeping progress
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    let timer = state.timer.pause().map_err(|e| internal_error("pause timer", e))?;
    state.record_action("pause");
    info!("Pause endpoint called");
    Ok(Json(ApiResponse::new("Timer paused".to_string(), timer)))
}

/// Handle POST /timer/reset - Stop the timer and clear progress
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    let timer = state.timer.reset().map_err(|e| internal_error("reset timer", e))?;
    state.record_action("reset");
    info!("Reset endpoint called");
    Ok(Json(ApiResponse::new("Timer reset".to_string(), timer)))
}

/// Handle PUT /timer/mode - Switch mode, which always resets the timer
pub async fn mode_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let timer = state.timer
        .set_mode(request.mode)
        .map_err(|e| internal_error("switch timer mode", e))?;
    state.record_action("mode");
    Ok(Json(ApiResponse::new(
        format!("Mode set to {}", request.mode.as_str()),
        timer,
    )))
}

/// Handle PUT /timer/config - Edit one Tabata setting
///
/// Rejected edits still answer 200: the response carries the kept value and
/// the reason.
pub async fn config_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfigRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let result = match request.value.as_i64() {
        Some(value) => state.timer.set_config(request.field, value),
        None if request.value.is_u64() => state.timer.reject_config(request.field, ConfigRejection::TooLarge),
        None => state.timer.reject_config(request.field, ConfigRejection::NotInteger),
    };
    let (outcome, timer) = result.map_err(|e| internal_error("update timer config", e))?;
    state.record_action("config");

    let message = if outcome.is_applied() {
        format!("{:?} updated", request.field)
    } else {
        format!("{:?} unchanged", request.field)
    };
    Ok(Json(ApiResponse::new(message, timer).with_config(outcome)))
}

fn view_response(
    state: &AppState,
    action: &str,
    updater: impl FnOnce(&mut ViewState),
) -> Result<Json<ViewResponse>, StatusCode> {
    let view = state
        .update_view(action, updater)
        .map_err(|e| internal_error("update view state", e))?;
    let timer = state.timer.snapshot().map_err(|e| internal_error("read timer", e))?;
    Ok(Json(ViewResponse {
        view,
        timestamp: Utc::now(),
        timer,
    }))
}

/// Handle POST /view/minimize - Show the floating badge
pub async fn minimize_handler(State(state): State<Arc<AppState>>) -> Result<Json<ViewResponse>, StatusCode> {
    view_response(&state, "minimize", ViewState::minimize)
}

/// Handle POST /view/maximize - Show the full control panel
pub async fn maximize_handler(State(state): State<Arc<AppState>>) -> Result<Json<ViewResponse>, StatusCode> {
    view_response(&state, "maximize", ViewState::maximize)
}

/// Handle POST /view/toggle - Flip between panel and badge
pub async fn toggle_view_handler(State(state): State<Arc<AppState>>) -> Result<Json<ViewResponse>, StatusCode> {
    view_response(&state, "toggle-view", |view| {
        view.toggle();
    })
}

/// Handle PUT /cues - Mute or unmute audio cues
pub async fn cues_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CueRequest>,
) -> Json<CueResponse> {
    let notifier = state.timer.notifier();
    notifier.set_muted(request.muted);
    state.record_action(if request.muted { "mute" } else { "unmute" });
    info!("Cues {}", if request.muted { "muted" } else { "unmuted" });

    Json(CueResponse {
        cues: notifier.stats(),
        timestamp: Utc::now(),
    })
}

/// Handle GET /status - Return timer, view and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = state.timer.snapshot().map_err(|e| internal_error("read timer", e))?;
    let view = state.get_view_state().map_err(|e| internal_error("read view state", e))?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        view,
        cues: state.timer.notifier().stats(),
        ticking: state.timer.is_ticking(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

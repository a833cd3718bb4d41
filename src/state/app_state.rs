//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{ViewState, WorkoutTimer};

/// Main application state shared by every HTTP handler
#[derive(Debug)]
pub struct AppState {
    /// The workout timer, single owner of the timer state
    pub timer: Arc<WorkoutTimer>,
    /// Presentation state of the host page
    pub view_state: Arc<Mutex<ViewState>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create a new AppState around an existing timer
    pub fn new(port: u16, host: String, timer: Arc<WorkoutTimer>) -> Self {
        Self {
            timer,
            view_state: Arc::new(Mutex::new(ViewState::new())),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Remember the last control action for the status endpoint
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Update the view state. The timer is never touched.
    pub fn update_view<F>(&self, action: &str, updater: F) -> Result<ViewState, String>
    where
        F: FnOnce(&mut ViewState),
    {
        let mut view = self.view_state.lock()
            .map_err(|e| format!("Failed to lock view state: {}", e))?;

        updater(&mut *view);
        let new_view = *view;
        drop(view);

        info!("View updated by {}: minimized={}", action, new_view.minimized);
        self.record_action(action);
        Ok(new_view)
    }

    /// Get current view state
    pub fn get_view_state(&self) -> Result<ViewState, String> {
        self.view_state.lock()
            .map(|view| *view)
            .map_err(|e| format!("Failed to lock view state: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        services::{cues::testing::RecordingPlayer, CueNotifier},
        state::{TimerMode, TimerState},
    };

    fn app_state() -> AppState {
        let timer = WorkoutTimer::new(
            TimerState::with_mode(TimerMode::Free),
            CueNotifier::new(Box::new(RecordingPlayer::default())),
        );
        AppState::new(0, "127.0.0.1".to_string(), Arc::new(timer))
    }

    #[tokio::test(start_paused = true)]
    async fn minimizing_keeps_timer_running() {
        let state = app_state();
        state.timer.start().expect("start");
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let view = state.update_view("minimize", ViewState::minimize).expect("minimize");
        assert!(view.minimized);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let view = state.update_view("maximize", ViewState::maximize).expect("maximize");
        assert!(!view.minimized);

        let snap = state.timer.snapshot().expect("snapshot");
        assert!(snap.running);
        assert_eq!(snap.elapsed, 5);
    }

    #[test]
    fn toggling_view_records_last_action() {
        let state = app_state();

        let view = state.update_view("toggle", |view| {
            view.toggle();
        }).expect("toggle");

        assert!(view.minimized);
        assert_eq!(state.get_last_action().0.as_deref(), Some("toggle"));
        assert_eq!(state.timer.snapshot().expect("snapshot").elapsed, 0);
    }
}

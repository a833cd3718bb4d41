//! Single owner of the timer state and its tick loop

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    services::CueNotifier,
    tasks::spawn_tick_loop,
};
use super::timer_state::{
    ConfigField, ConfigOutcome, ConfigRejection, TickOutcome, TimerMode, TimerSnapshot, TimerState,
};

/// Workout timer controller.
///
/// All mutations of the [`TimerState`] go through here. At most one tick loop
/// exists at a time: every acquisition cancels the previous handle first, and
/// `pause`, `reset`, `set_mode`, `shutdown` and `Drop` release it.
#[derive(Debug)]
pub struct WorkoutTimer {
    state: Mutex<TimerState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    notifier: CueNotifier,
    /// Channel for snapshot updates
    update_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _update_rx: watch::Receiver<TimerSnapshot>,
}

impl WorkoutTimer {
    pub fn new(state: TimerState, notifier: CueNotifier) -> Self {
        let (update_tx, update_rx) = watch::channel(state.snapshot());
        Self {
            state: Mutex::new(state),
            ticker: Mutex::new(None),
            notifier,
            update_tx,
            _update_rx: update_rx,
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, TimerState>, String> {
        self.state
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Publish while the state lock is still held so watchers see updates in order
    fn publish(&self, state: &TimerState) -> TimerSnapshot {
        let snapshot = state.snapshot();
        if let Err(e) = self.update_tx.send(snapshot.clone()) {
            warn!("Failed to send timer update: {}", e);
        }
        snapshot
    }

    /// Get the current timer snapshot
    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        self.lock_state().map(|state| state.snapshot())
    }

    /// Subscribe to snapshots published after every change
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.update_tx.subscribe()
    }

    pub fn notifier(&self) -> &CueNotifier {
        &self.notifier
    }

    /// Whether a tick loop is currently alive
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .map(|ticker| ticker.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn acquire_loop(self: &Arc<Self>) -> Result<(), String> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err("No async runtime available for the tick loop".to_string());
        }

        let mut ticker = self.ticker
            .lock()
            .map_err(|e| format!("Failed to lock tick loop handle: {}", e))?;

        if let Some(previous) = ticker.take() {
            previous.abort();
            debug!("Cancelled previous tick loop");
        }
        *ticker = Some(spawn_tick_loop(Arc::downgrade(self)));
        Ok(())
    }

    fn release_loop(&self) -> Result<(), String> {
        let mut ticker = self.ticker
            .lock()
            .map_err(|e| format!("Failed to lock tick loop handle: {}", e))?;

        if let Some(handle) = ticker.take() {
            handle.abort();
            debug!("Tick loop cancelled");
        }
        Ok(())
    }

    /// Start or resume counting. Idempotent while running.
    pub fn start(self: &Arc<Self>) -> Result<TimerSnapshot, String> {
        let mut state = self.lock_state()?;

        if state.is_running() && self.is_ticking() {
            debug!("Start requested while already running");
            return Ok(state.snapshot());
        }

        // Acquire first so a failure never leaves the timer running without a loop
        if let Err(e) = self.acquire_loop() {
            state.pause();
            self.publish(&state);
            return Err(e);
        }
        state.start();
        info!("Timer started: mode={}, elapsed={}s, round={}",
              state.mode().as_str(), state.elapsed(), state.current_round());
        Ok(self.publish(&state))
    }

    /// Stop counting and keep elapsed time and phase markers
    pub fn pause(&self) -> Result<TimerSnapshot, String> {
        let mut state = self.lock_state()?;
        let was_running = state.pause();
        self.release_loop()?;

        if was_running {
            info!("Timer paused at {}s", state.elapsed());
        }
        Ok(self.publish(&state))
    }

    /// Stop counting and clear progress, keeping mode and Tabata settings
    pub fn reset(&self) -> Result<TimerSnapshot, String> {
        let mut state = self.lock_state()?;
        state.reset();
        self.release_loop()?;

        info!("Timer reset");
        Ok(self.publish(&state))
    }

    /// Switch discipline. Always resets.
    pub fn set_mode(&self, mode: TimerMode) -> Result<TimerSnapshot, String> {
        let mut state = self.lock_state()?;
        let previous = state.mode();
        state.set_mode(mode);
        self.release_loop()?;

        info!("Timer mode changed: {} -> {}", previous.as_str(), mode.as_str());
        Ok(self.publish(&state))
    }

    /// Edit one Tabata setting. Rejected edits keep the previous value.
    pub fn set_config(&self, field: ConfigField, value: i64) -> Result<(ConfigOutcome, TimerSnapshot), String> {
        let mut state = self.lock_state()?;
        let outcome = state.set_config(field, value);
        log_config_outcome(field, value, &outcome);
        Ok((outcome, self.publish(&state)))
    }

    /// Record an edit that was rejected before it reached the state machine,
    /// for example a non-integer value
    pub fn reject_config(&self, field: ConfigField, reason: ConfigRejection) -> Result<(ConfigOutcome, TimerSnapshot), String> {
        let state = self.lock_state()?;
        let outcome = state.reject_config(field, reason);
        warn!("Rejected {:?} edit: {:?}", field, reason);
        Ok((outcome, state.snapshot()))
    }

    /// Advance by one second and hand any boundary cue to the notifier.
    /// The cue is played after the state lock has been released.
    pub fn tick(&self) -> Result<TickOutcome, String> {
        let outcome = {
            let mut state = self.lock_state()?;
            let outcome = state.tick();
            if outcome != TickOutcome::Idle {
                self.publish(&state);
            }
            outcome
        };

        if let TickOutcome::Boundary(cue) = outcome {
            info!("Timer boundary reached: {}", cue.as_str());
            self.notifier.notify(cue);
        }
        Ok(outcome)
    }

    /// Teardown: stop counting and release the tick loop
    pub fn shutdown(&self) -> Result<(), String> {
        self.pause()?;
        info!("Workout timer shut down");
        Ok(())
    }
}

impl Drop for WorkoutTimer {
    fn drop(&mut self) {
        if let Ok(ticker) = self.ticker.get_mut() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }
}

fn log_config_outcome(field: ConfigField, requested: i64, outcome: &ConfigOutcome) {
    match outcome {
        ConfigOutcome::Applied { value } => info!("Timer config {:?} set to {}", field, value),
        ConfigOutcome::Kept { value, reason } => {
            warn!("Rejected {:?}={} ({:?}), keeping {}", field, requested, reason, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::sleep;

    use super::*;
    use crate::services::cues::testing::{FailingPlayer, RecordingPlayer};
    use crate::state::Cue;

    fn timer_with(mode: TimerMode, recorder: &RecordingPlayer) -> Arc<WorkoutTimer> {
        Arc::new(WorkoutTimer::new(
            TimerState::with_mode(mode),
            CueNotifier::new(Box::new(recorder.clone())),
        ))
    }

    async fn sleep_secs(secs: f64) {
        sleep(Duration::from_secs_f64(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ticks_once_per_second() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());

        timer.start().expect("start");
        sleep_secs(5.5).await;

        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 5);
        assert!(timer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_runs_a_single_loop() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());

        timer.start().expect("first start");
        timer.start().expect("second start");
        sleep_secs(7.5).await;

        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_loop_and_resume_continues() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());

        timer.start().expect("start");
        sleep_secs(3.5).await;
        let paused = timer.pause().expect("pause");
        assert_eq!(paused.elapsed, 3);
        assert!(!timer.is_ticking());

        sleep_secs(10.0).await;
        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 3);

        timer.start().expect("resume");
        sleep_secs(2.5).await;
        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_and_mode_switch_cancel_loop() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());

        timer.start().expect("start");
        sleep_secs(2.5).await;
        timer.reset().expect("reset");
        sleep_secs(4.0).await;
        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 0);

        timer.start().expect("start");
        sleep_secs(2.5).await;
        let switched = timer.set_mode(TimerMode::Emom).expect("set mode");
        assert!(!switched.running);
        assert!(!timer.is_ticking());
        sleep_secs(4.0).await;
        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tabata_session_auto_stops_loop() {
        let recorder = RecordingPlayer::default();
        let timer = timer_with(TimerMode::Tabata, &recorder);
        timer.set_config(ConfigField::WorkDuration, 2).expect("work");
        timer.set_config(ConfigField::RestDuration, 1).expect("rest");
        timer.set_config(ConfigField::Rounds, 2).expect("rounds");

        timer.start().expect("start");
        sleep_secs(8.5).await;

        let snap = timer.snapshot().expect("snapshot");
        assert!(!snap.running);
        assert_eq!(snap.current_round, 1);
        assert!(snap.is_work_phase);
        assert_eq!(snap.elapsed, 0);
        assert!(!timer.is_ticking());
        assert_eq!(
            recorder.recorded(),
            vec![Cue::WorkEnded, Cue::RestEnded, Cue::WorkEnded, Cue::SessionComplete]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failing_cues_never_stall_the_loop() {
        let timer = Arc::new(WorkoutTimer::new(
            TimerState::with_mode(TimerMode::Emom),
            CueNotifier::new(Box::new(FailingPlayer)),
        ));

        timer.start().expect("start");
        sleep_secs(125.5).await;

        let snap = timer.snapshot().expect("snapshot");
        assert!(snap.running);
        assert_eq!(snap.elapsed, 5);
        assert_eq!(snap.minute, 3);
        assert_eq!(timer.notifier().stats().failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn config_edits_rejected_while_running() {
        let timer = timer_with(TimerMode::Tabata, &RecordingPlayer::default());
        timer.start().expect("start");

        let (outcome, snap) = timer.set_config(ConfigField::Rounds, 3).expect("set config");

        assert_eq!(outcome.value(), snap.rounds);
        assert!(!outcome.is_applied());
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_observe_ticks() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());
        let mut updates = timer.subscribe();

        timer.start().expect("start");
        updates.borrow_and_update();
        updates.changed().await.expect("tick update");

        let seen = updates.borrow_and_update().clone();
        assert!(seen.running);
        assert_eq!(seen.elapsed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_does_not_keep_timer_alive() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());

        timer.start().expect("start");
        sleep_secs(1.5).await;

        assert_eq!(Arc::strong_count(&timer), 1);
        timer.shutdown().expect("shutdown");
        assert!(!timer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_timer_ends_tick_loop() {
        let timer = timer_with(TimerMode::Free, &RecordingPlayer::default());
        let mut updates = timer.subscribe();
        let runtime = tokio::runtime::Handle::current();

        timer.start().expect("start");
        sleep_secs(1.5).await;
        assert_eq!(runtime.metrics().num_alive_tasks(), 1);

        drop(timer);
        sleep_secs(2.0).await;

        assert_eq!(runtime.metrics().num_alive_tasks(), 0);
        assert!(updates.changed().await.is_err());
    }

    #[test]
    fn start_without_runtime_leaves_timer_usable() {
        let timer = Arc::new(WorkoutTimer::new(
            TimerState::new(),
            CueNotifier::new(Box::new(RecordingPlayer::default())),
        ));

        assert!(timer.start().is_err());

        let snap = timer.snapshot().expect("snapshot after failed start");
        assert!(!snap.running);
        assert!(!timer.is_ticking());
        assert_eq!(timer.tick().expect("tick"), TickOutcome::Idle);
        assert!(!timer.reset().expect("reset").running);
    }

    #[test]
    fn tick_while_stopped_is_a_no_op() {
        let timer = WorkoutTimer::new(
            TimerState::new(),
            CueNotifier::new(Box::new(RecordingPlayer::default())),
        );

        assert_eq!(timer.tick().expect("tick"), TickOutcome::Idle);
        assert_eq!(timer.snapshot().expect("snapshot").elapsed, 0);
    }
}

//! One-second tick loop driving the workout timer

use std::{sync::Weak, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tracing::{debug, error};

use crate::state::{Cue, TickOutcome, WorkoutTimer};

/// Period of the tick loop
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Spawn a tick loop for the given timer. The caller owns the handle and is
/// responsible for aborting it.
pub fn spawn_tick_loop(timer: Weak<WorkoutTimer>) -> JoinHandle<()> {
    tokio::spawn(tick_loop_task(timer))
}

/// Background task that ticks the timer once per second until it stops
/// running or is dropped.
///
/// The first tick fires one full period after the loop starts. Ticks missed
/// while the runtime was stalled are delivered in a burst so elapsed time
/// keeps up with the wall clock.
pub async fn tick_loop_task(timer: Weak<WorkoutTimer>) {
    debug!("Starting tick loop");

    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);

    loop {
        interval.tick().await;

        let Some(owner) = timer.upgrade() else {
            debug!("Workout timer dropped, stopping tick loop");
            break;
        };

        match owner.tick() {
            Ok(TickOutcome::Boundary(Cue::SessionComplete)) => {
                debug!("Session complete, stopping tick loop");
                break;
            }
            Ok(TickOutcome::Idle) => {
                debug!("Timer no longer running, stopping tick loop");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Tick failed, stopping tick loop: {}", e);
                break;
            }
        }
    }
}

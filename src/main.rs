//! Workout Timer - A headless interval workout timer
//! 
//! This is the main entry point for the workout-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use workout_timer::{
    config::Config,
    state::{AppState, WorkoutTimer},
    api::create_router,
    services::{CommandPlayer, CueNotifier, CuePlayer, TerminalBell},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, mode={}, work={}s, rest={}s, rounds={}",
          config.host, config.port, config.mode.as_str(), config.work, config.rest, config.rounds);

    // Pick the cue player
    let player: Box<dyn CuePlayer> = match &config.cue_command {
        Some(program) => {
            info!("Audio cues via command: {}", program);
            Box::new(CommandPlayer::new(program.clone()))
        }
        None => Box::new(TerminalBell),
    };
    let notifier = if config.mute {
        CueNotifier::muted(player)
    } else {
        CueNotifier::new(player)
    };

    // Create the timer and application state
    let timer = Arc::new(WorkoutTimer::new(config.initial_timer_state(), notifier));
    let state = Arc::new(AppState::new(config.port, config.host.clone(), Arc::clone(&timer)));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer          - Current timer snapshot");
    info!("  POST /timer/start    - Start or resume");
    info!("  POST /timer/pause    - Pause, keeping progress");
    info!("  POST /timer/reset    - Stop and clear progress");
    info!("  PUT  /timer/mode     - Switch mode (free, tabata, emom)");
    info!("  PUT  /timer/config   - Edit rounds, work_duration, rest_duration");
    info!("  POST /view/minimize  - Show floating badge");
    info!("  POST /view/maximize  - Show control panel");
    info!("  POST /view/toggle    - Toggle badge/panel");
    info!("  PUT  /cues           - Mute or unmute cues");
    info!("  GET  /status         - Timer, view and server status");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = timer.shutdown() {
        tracing::error!("Failed to stop workout timer: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

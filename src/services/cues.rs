//! Best-effort audio cues at phase and minute boundaries

use std::{
    io::Write,
    process::Stdio,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use anyhow::{bail, Context};
use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

use crate::state::Cue;

/// Something that can make a noise for a cue.
///
/// Implementations must return promptly: they are called right after a tick
/// and must never wait for playback to finish.
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue) -> anyhow::Result<()>;
}

/// Rings the terminal bell on stderr
#[derive(Debug, Default)]
pub struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&self, _cue: Cue) -> anyhow::Result<()> {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07").context("Failed to write bell")?;
        stderr.flush().context("Failed to flush bell")?;
        Ok(())
    }
}

/// Spawns an external program per cue, passing the cue name as its only argument
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl CuePlayer for CommandPlayer {
    fn play(&self, cue: Cue) -> anyhow::Result<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            bail!("No async runtime available to spawn {}", self.program);
        }

        // The child is reaped by the runtime once dropped
        Command::new(&self.program)
            .arg(cue.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn cue command {}", self.program))?;
        Ok(())
    }
}

/// Cue playback counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CueStats {
    pub muted: bool,
    pub played: u64,
    pub failed: u64,
}

/// Consumes boundary signals from the timer and swallows every playback failure
pub struct CueNotifier {
    player: Box<dyn CuePlayer>,
    muted: AtomicBool,
    played: AtomicU64,
    failed: AtomicU64,
}

impl CueNotifier {
    pub fn new(player: Box<dyn CuePlayer>) -> Self {
        Self {
            player,
            muted: AtomicBool::new(false),
            played: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Notifier with the given player that starts out muted
    pub fn muted(player: Box<dyn CuePlayer>) -> Self {
        let notifier = Self::new(player);
        notifier.set_muted(true);
        notifier
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Try to play a cue. Never fails.
    pub fn notify(&self, cue: Cue) {
        if self.is_muted() {
            debug!("Cue {} skipped, muted", cue.as_str());
            return;
        }

        match self.player.play(cue) {
            Ok(()) => {
                self.played.fetch_add(1, Ordering::Relaxed);
                debug!("Cue {} played", cue.as_str());
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                debug!("Cue {} playback failed: {:#}", cue.as_str(), e);
            }
        }
    }

    pub fn stats(&self) -> CueStats {
        CueStats {
            muted: self.is_muted(),
            played: self.played.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CueNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueNotifier")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records every cue it is asked to play
    #[derive(Debug, Clone, Default)]
    pub struct RecordingPlayer {
        pub cues: Arc<Mutex<Vec<Cue>>>,
    }

    impl RecordingPlayer {
        pub fn recorded(&self) -> Vec<Cue> {
            self.cues.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    impl CuePlayer for RecordingPlayer {
        fn play(&self, cue: Cue) -> anyhow::Result<()> {
            self.cues
                .lock()
                .map_err(|e| anyhow::anyhow!("recorder poisoned: {}", e))?
                .push(cue);
            Ok(())
        }
    }

    /// Fails every playback, like a runtime that has not granted audio yet
    #[derive(Debug, Default)]
    pub struct FailingPlayer;

    impl CuePlayer for FailingPlayer {
        fn play(&self, _cue: Cue) -> anyhow::Result<()> {
            bail!("playback not permitted")
        }
    }
}

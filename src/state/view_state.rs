//! Presentation state held by the host page

use serde::{Deserialize, Serialize};

/// Whether the timer is shown as the full control panel or the floating badge.
/// Changing it never touches the timer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub minimized: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimize(&mut self) {
        self.minimized = true;
    }

    pub fn maximize(&mut self) {
        self.minimized = false;
    }

    /// Flip the flag and return the new value
    pub fn toggle(&mut self) -> bool {
        self.minimized = !self.minimized;
        self.minimized
    }
}

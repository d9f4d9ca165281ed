//! Run state definitions for a single source run
//!
//! A run moves `Idle -> Running -> {Completed, Failed}` and never leaves a
//! terminal state.

use std::fmt;

/// Represents the lifecycle position of one source run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Run has been created but not started
    Idle,

    /// Locations are being crawled or records persisted
    Running,

    /// Run finished and its summary was marked successful
    Completed,

    /// Run aborted on an error outside the per-item catch scopes
    Failed,
}

impl RunState {
    /// Returns true if the transition `self -> next` is permitted
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

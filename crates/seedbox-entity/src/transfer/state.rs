//! Transfer session lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a transfer session.
///
/// `Initializing -> Active -> {Completed | Stopped}`. Terminal states are
/// never observed in the registry because reaching them removes the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Metadata not yet resolved by the engine.
    Initializing,
    /// Metadata known; bytes are flowing.
    Active,
    /// All bytes written; detached from the engine.
    Completed,
    /// Stopped by request or by the quota monitor.
    Stopped,
}

impl TransferState {
    /// Whether this state ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }

    /// Whether moving to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        match (self, next) {
            (Self::Initializing, Self::Active) => true,
            (Self::Initializing | Self::Active, Self::Completed | Self::Stopped) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

use std::fmt::Display;

use super::config::AppName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseName {
    Idle,
    Running,
    Blocked,
}

impl Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseName::Idle => write!(f, "idle"),
            PhaseName::Running => write!(f, "running"),
            PhaseName::Blocked => write!(f, "blocked"),
        }
    }
}

/// Rejected session operations. None of them change the session state, the dashboard shows them
/// as warnings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Select at least one app to monitor before starting a session")]
    EmptySelection,

    #[error("Unknown app {0:?}")]
    UnknownApp(String),

    #[error("Nudge interval must be 1, 2, 3, 4 or 5 minutes, got {0:?}")]
    InvalidInterval(String),

    #[error("{0} is not monitored in this session")]
    NotMonitored(AppName),

    #[error("No app is in use right now")]
    NoActiveApp,

    #[error("Can't {action} while the session is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: PhaseName,
    },
}

use serde::Serialize;

use super::CheckResult;

/// Messages sent from a running check to whoever renders its progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckEvent {
    /// Run started; every step waiting
    Started { state: CheckResult },
    /// A step changed status or a finding was recorded
    Updated { progress: u8, state: CheckResult },
    /// Run finished
    Completed { result: CheckResult },
    /// Run stopped before finishing
    Cancelled { progress: u8 },
}

impl CheckEvent {
    pub fn progress(&self) -> u8 {
        match self {
            Self::Started { .. } => 0,
            Self::Updated { progress, .. } | Self::Cancelled { progress } => *progress,
            Self::Completed { .. } => 100,
        }
    }

    pub fn state(&self) -> Option<&CheckResult> {
        match self {
            Self::Started { state } | Self::Updated { state, .. } => Some(state),
            Self::Completed { result } => Some(result),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled { .. })
    }
}

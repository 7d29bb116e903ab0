// Instance Phase Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Lifecycle phase of a Data Manager job instance.
///
/// The wire form is the upper-case phase name. Phases the client does not
/// know about are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstancePhase {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl InstancePhase {
    /// A phase is terminal once the instance is neither pending nor running.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InstancePhase::Pending | InstancePhase::Running)
    }

    /// Only `COMPLETED` counts as a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, InstancePhase::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstancePhase::Pending => "PENDING",
            InstancePhase::Running => "RUNNING",
            InstancePhase::Completed => "COMPLETED",
            InstancePhase::Failed => "FAILED",
            InstancePhase::Other(s) => s,
        }
    }

    // Ordering used for the monotonic check. All terminal phases share a rank.
    fn rank(&self) -> u8 {
        match self {
            InstancePhase::Pending => 0,
            InstancePhase::Running => 1,
            _ => 2,
        }
    }
}

impl From<String> for InstancePhase {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => InstancePhase::Pending,
            "RUNNING" => InstancePhase::Running,
            "COMPLETED" => InstancePhase::Completed,
            "FAILED" => InstancePhase::Failed,
            _ => InstancePhase::Other(s),
        }
    }
}

impl From<&str> for InstancePhase {
    fn from(s: &str) -> Self {
        InstancePhase::from(s.to_string())
    }
}

impl From<InstancePhase> for String {
    fn from(phase: InstancePhase) -> Self {
        match phase {
            InstancePhase::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for InstancePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the phases observed for a single instance.
///
/// Phases only move forward (PENDING -> RUNNING -> terminal) and a terminal
/// phase never changes.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    last: Option<InstancePhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&InstancePhase> {
        self.last.as_ref()
    }

    /// Record a newly observed phase.
    ///
    /// The phase is recorded even when the transition is invalid so that
    /// subsequent observations are compared against the latest one.
    pub fn observe(&mut self, phase: &InstancePhase) -> Result<()> {
        let previous = self.last.replace(phase.clone());
        match previous {
            Some(prev) if prev.is_terminal() && prev != *phase => {
                Err(DomainError::PhaseRegression {
                    from: prev.to_string(),
                    to: phase.to_string(),
                })
            }
            Some(prev) if phase.rank() < prev.rank() => Err(DomainError::PhaseRegression {
                from: prev.to_string(),
                to: phase.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

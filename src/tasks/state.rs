//! Task state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a relay task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, worker not yet through its first iteration.
    Queued,
    /// Worker is sending on its cadence.
    Running,
    /// Worker is alive but holds off sending.
    Paused,
    /// Worker has exited. Terminal.
    Stopped,
}

impl TaskStatus {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        use TaskStatus::*;

        matches!(
            (self, target),
            (Queued, Running) | (Queued, Paused) | (Queued, Stopped) |
            (Running, Paused) | (Running, Stopped) |
            (Paused, Running) | (Paused, Stopped)
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions_valid() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Paused));
        assert!(TaskStatus::Paused.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Stopped));
        assert!(TaskStatus::Paused.can_transition_to(TaskStatus::Stopped));
    }

    #[test]
    fn stopped_is_terminal() {
        assert!(TaskStatus::Stopped.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        for target in [
            TaskStatus::Queued,
            TaskStatus::Running,
            TaskStatus::Paused,
            TaskStatus::Stopped,
        ] {
            assert!(!TaskStatus::Stopped.can_transition_to(target));
        }
    }

    #[test]
    fn nothing_returns_to_queued() {
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Queued));
        assert!(!TaskStatus::Paused.can_transition_to(TaskStatus::Queued));
    }

    #[test]
    fn status_display_and_serde() {
        assert_eq!(TaskStatus::Paused.to_string(), "paused");
        let json = serde_json::to_string(&TaskStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let parsed: TaskStatus = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(parsed, TaskStatus::Stopped);
    }
}

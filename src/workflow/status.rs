//! Step and workflow status vocabulary
//!
//! A step starts `pending`. A satisfied (or absent) condition moves it to
//! `running`, after which the agent call decides between `completed` and
//! `failed`. An unsatisfied condition short-circuits straight to `skipped` or
//! `stopped`, and a registry miss fails the step without ever running it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single step within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Skipped,
    Stopped,
    Failed,
}

impl StepStatus {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        use StepStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Skipped)
                | (Pending, Stopped)
                | (Pending, Failed)
                | (Running, Completed)
                | (Running, Failed)
        )
    }

    /// Terminal statuses never change again within the run
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Skipped | StepStatus::Stopped | StepStatus::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
            StepStatus::Stopped => "stopped",
            StepStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the run as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Running,
    Done,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Done => "done",
        };
        f.write_str(s)
    }
}

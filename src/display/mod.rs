//! Presentation of workflow runs
//!
//! Projects an [`ExecutionState`] onto per-step views for the terminal: status
//! labels and symbols, a live progress view and the final report.

pub mod progress;
pub mod report;

pub use progress::TerminalProgressObserver;
pub use report::{render_report, ReportFormat};

use crate::abstractions::AgentResult;
use crate::registry::AgentRegistry;
use crate::workflow::{ExecutionState, StepStatus, WorkflowDefinition, WorkflowStatus};

const UNKNOWN_AGENT_TITLE: &str = "Unknown Agent";

pub fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "Pending",
        StepStatus::Running => "Running",
        StepStatus::Completed => "Completed",
        StepStatus::Skipped => "Skipped",
        StepStatus::Stopped => "Stopped",
        StepStatus::Failed => "Failed",
    }
}

pub fn status_symbol(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "○",
        StepStatus::Running => "▶",
        StepStatus::Completed => "✓",
        StepStatus::Skipped => "→",
        StepStatus::Stopped => "■",
        StepStatus::Failed => "✗",
    }
}

/// What a user can do next with a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Start,
    Wait,
    /// The run failed; the only way forward is a fresh run from the first step
    StartOver,
    Finish,
}

pub fn next_action(state: &ExecutionState) -> NextAction {
    match state.workflow_status {
        WorkflowStatus::Idle => NextAction::Start,
        WorkflowStatus::Running => NextAction::Wait,
        WorkflowStatus::Done if state.error.is_some() => NextAction::StartOver,
        WorkflowStatus::Done => NextAction::Finish,
    }
}

/// One step as presented to the user
#[derive(Debug, Clone)]
pub struct StepView<'a> {
    pub index: usize,
    pub agent_id: &'a str,
    pub title: &'a str,
    pub status: StepStatus,
    /// Only populated once the step has completed
    pub result: Option<&'a AgentResult>,
}

pub fn project_steps<'a>(
    workflow: &'a WorkflowDefinition,
    state: &'a ExecutionState,
    registry: &'a dyn AgentRegistry,
) -> Vec<StepView<'a>> {
    workflow
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let status = state.status(index).unwrap_or(StepStatus::Pending);
            StepView {
                index,
                agent_id: &step.agent_id,
                title: agent_title(registry, &step.agent_id),
                status,
                result: if status == StepStatus::Completed {
                    state.result(index)
                } else {
                    None
                },
            }
        })
        .collect()
}

pub(crate) fn agent_title<'a>(registry: &'a dyn AgentRegistry, agent_id: &str) -> &'a str {
    registry
        .find_agent_by_id(agent_id)
        .map(|agent| agent.title.as_str())
        .unwrap_or(UNKNOWN_AGENT_TITLE)
}

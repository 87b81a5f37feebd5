//! Execution of a single workflow step

use super::condition;
use super::definition::{OnFailure, WorkflowDefinition};
use super::state::StateTracker;
use super::status::StepStatus;
use crate::abstractions::AgentInvoker;
use crate::deal::DealContext;
use crate::error::{Error, Result};
use crate::registry::AgentRegistry;
use tracing::{debug, error, warn};

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// How a step ended, and therefore what the executor does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped,
    /// Condition unsatisfied under the `stop` policy; later steps must be stopped too
    Stopped,
    Failed,
    /// The step's agent id is not registered
    Misconfigured,
}

impl StepOutcome {
    pub fn continues_run(self) -> bool {
        matches!(self, StepOutcome::Completed | StepOutcome::Skipped)
    }
}

/// Input handed to an agent given the text of the last executed step
pub fn build_agent_input(previous_result_text: &str) -> String {
    if previous_result_text.is_empty() {
        String::new()
    } else {
        format!(
            "Based on the previous analysis provided below, please perform your core task.\n\n\
             ---\nPREVIOUS ANALYSIS:\n{previous_result_text}"
        )
    }
}

pub(crate) struct StepRunner<'a> {
    registry: &'a dyn AgentRegistry,
    invoker: &'a dyn AgentInvoker,
    context: &'a DealContext,
}

impl<'a> StepRunner<'a> {
    pub(crate) fn new(
        registry: &'a dyn AgentRegistry,
        invoker: &'a dyn AgentInvoker,
        context: &'a DealContext,
    ) -> Self {
        Self {
            registry,
            invoker,
            context,
        }
    }

    pub(crate) async fn run(
        &self,
        workflow: &WorkflowDefinition,
        tracker: &mut StateTracker<'_>,
        index: usize,
    ) -> Result<StepOutcome> {
        let step = &workflow.steps[index];

        let Some(agent) = self.registry.find_agent_by_id(&step.agent_id) else {
            let err = Error::AgentNotFound(step.agent_id.clone());
            error!("Step {}: {}", index + 1, err);
            tracker.set_error(err.to_string());
            tracker.transition(index, StepStatus::Failed)?;
            return Ok(StepOutcome::Misconfigured);
        };

        if let Some(cond) = &step.condition {
            let satisfied = condition::evaluate(
                cond,
                &tracker.state().step_results,
                &workflow.agent_ids(),
            );
            if !satisfied {
                warn!(
                    "Step {} ({}): output of '{}' does not contain \"{}\" (on_failure: {})",
                    index + 1,
                    step.agent_id,
                    cond.source_agent_id,
                    cond.output_contains,
                    cond.on_failure
                );
                return match cond.on_failure {
                    OnFailure::Skip => {
                        tracker.transition(index, StepStatus::Skipped)?;
                        Ok(StepOutcome::Skipped)
                    }
                    OnFailure::Stop => {
                        tracker.transition(index, StepStatus::Stopped)?;
                        Ok(StepOutcome::Stopped)
                    }
                };
            }
        }

        tracker.transition(index, StepStatus::Running)?;
        let input = build_agent_input(&tracker.state().previous_result_text);
        debug!(
            "Invoking '{}' with {} bytes of input",
            agent.id,
            input.len()
        );

        match self.invoker.invoke(agent, self.context, &input).await {
            Ok(result) => {
                tracker.record_result(index, result);
                tracker.transition(index, StepStatus::Completed)?;
                Ok(StepOutcome::Completed)
            }
            Err(err) => {
                let mut message = format!("{err:#}");
                if message.trim().is_empty() {
                    message = UNKNOWN_ERROR_MESSAGE.to_string();
                }
                error!("Step {} ({}) failed: {}", index + 1, agent.id, message);
                tracker.set_error(message);
                tracker.transition(index, StepStatus::Failed)?;
                Ok(StepOutcome::Failed)
            }
        }
    }
}

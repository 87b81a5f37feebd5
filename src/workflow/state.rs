//! Per-run execution state
//!
//! An [`ExecutionState`] is created fresh for every run and owned by that run
//! alone. All mutation during a run goes through [`StateTracker`], which checks
//! each step transition against the status state machine and publishes a
//! [`RunUpdate`] after every change.

use super::definition::WorkflowDefinition;
use super::event::{RunObserver, RunUpdate, WorkflowEvent};
use super::status::{StepStatus, WorkflowStatus};
use crate::abstractions::AgentResult;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub run_id: Uuid,
    pub step_statuses: Vec<StepStatus>,
    pub step_results: Vec<Option<AgentResult>>,
    pub workflow_status: WorkflowStatus,
    /// Text of the most recently completed step; only this feeds forward
    #[serde(default)]
    pub previous_result_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionState {
    /// All steps pending, no results, workflow idle
    pub fn new(step_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            step_statuses: vec![StepStatus::Pending; step_count],
            step_results: vec![None; step_count],
            workflow_status: WorkflowStatus::Idle,
            previous_result_text: String::new(),
            error: None,
        }
    }

    pub fn for_workflow(workflow: &WorkflowDefinition) -> Self {
        Self::new(workflow.len())
    }

    /// Whether the state is still in its initial, never-run shape
    pub fn is_fresh(&self) -> bool {
        self.workflow_status == WorkflowStatus::Idle
            && self.error.is_none()
            && self.previous_result_text.is_empty()
            && self.step_statuses.iter().all(|s| *s == StepStatus::Pending)
            && self.step_results.iter().all(Option::is_none)
    }

    pub fn is_done(&self) -> bool {
        self.workflow_status == WorkflowStatus::Done
    }

    pub fn status(&self, index: usize) -> Option<StepStatus> {
        self.step_statuses.get(index).copied()
    }

    pub fn result(&self, index: usize) -> Option<&AgentResult> {
        self.step_results.get(index).and_then(Option::as_ref)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.step_statuses.iter().filter(|s| **s == status).count()
    }

    /// Index of the first failed step, if any
    pub fn failed_step(&self) -> Option<usize> {
        self.step_statuses
            .iter()
            .position(|s| *s == StepStatus::Failed)
    }

    pub(crate) fn ensure_fresh_for(&self, workflow: &WorkflowDefinition) -> Result<()> {
        if self.step_statuses.len() != workflow.len() || self.step_results.len() != workflow.len()
        {
            return Err(Error::StateNotFresh(format!(
                "state tracks {} steps but workflow '{}' has {}",
                self.step_statuses.len(),
                workflow.id,
                workflow.len()
            )));
        }
        if !self.is_fresh() {
            return Err(Error::StateNotFresh(format!(
                "run {} has already started; create a new state to start over",
                self.run_id
            )));
        }
        Ok(())
    }
}

/// Applies checked mutations to a run's state and publishes each one
pub(crate) struct StateTracker<'a> {
    workflow: &'a WorkflowDefinition,
    state: &'a mut ExecutionState,
    observer: &'a dyn RunObserver,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(
        workflow: &'a WorkflowDefinition,
        state: &'a mut ExecutionState,
        observer: &'a dyn RunObserver,
    ) -> Self {
        Self {
            workflow,
            state,
            observer,
        }
    }

    pub(crate) fn state(&self) -> &ExecutionState {
        self.state
    }

    pub(crate) fn start(&mut self) {
        self.state.workflow_status = WorkflowStatus::Running;
        self.publish(WorkflowEvent::RunStarted {
            workflow_id: self.workflow.id.clone(),
            step_count: self.workflow.len(),
        });
    }

    /// Move step `index` to `to`, enforcing the transition table
    pub(crate) fn transition(&mut self, index: usize, to: StepStatus) -> Result<()> {
        let from = self.state.status(index).ok_or_else(|| {
            Error::Workflow(format!("step index {index} is out of range"))
        })?;
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { index, from, to });
        }

        self.state.step_statuses[index] = to;
        debug!(
            "Step {} ({}) {} -> {}",
            index + 1,
            self.workflow.steps[index].agent_id,
            from,
            to
        );
        self.publish(WorkflowEvent::StepStatusChanged {
            step_index: index,
            agent_id: self.workflow.steps[index].agent_id.clone(),
            from,
            to,
        });
        Ok(())
    }

    /// Capture a step's output and make it the text threaded into the next step
    pub(crate) fn record_result(&mut self, index: usize, result: AgentResult) {
        self.state.previous_result_text = result.text.clone();
        self.state.step_results[index] = Some(result);
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.state.error = Some(message);
    }

    pub(crate) fn finish(&mut self) {
        self.state.workflow_status = WorkflowStatus::Done;
        self.publish(WorkflowEvent::RunFinished {
            workflow_id: self.workflow.id.clone(),
            error: self.state.error.clone(),
        });
    }

    fn publish(&self, event: WorkflowEvent) {
        let update = RunUpdate::new(event, self.state.clone());
        self.observer.on_update(&update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::event::NoopObserver;
    use crate::workflow::WorkflowStep;
    use std::sync::Mutex;

    fn workflow() -> WorkflowDefinition {
        WorkflowDefinition::new(
            "wf",
            "Workflow",
            vec![WorkflowStep::new("a"), WorkflowStep::new("b")],
        )
    }

    #[test]
    fn test_new_state_is_fresh() {
        let state = ExecutionState::for_workflow(&workflow());
        assert!(state.is_fresh());
        assert_eq!(state.step_statuses, vec![StepStatus::Pending; 2]);
        assert_eq!(state.step_results, vec![None, None]);
        assert_eq!(state.workflow_status, WorkflowStatus::Idle);
        assert!(state.ensure_fresh_for(&workflow()).is_ok());
    }

    #[test]
    fn test_fresh_states_get_distinct_run_ids() {
        let a = ExecutionState::new(1);
        let b = ExecutionState::new(1);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_size_mismatch_is_not_fresh_for_workflow() {
        let state = ExecutionState::new(3);
        assert!(matches!(
            state.ensure_fresh_for(&workflow()),
            Err(Error::StateNotFresh(_))
        ));
    }

    #[test]
    fn test_tracker_rejects_illegal_transition() {
        let wf = workflow();
        let mut state = ExecutionState::for_workflow(&wf);
        let observer = NoopObserver;
        let mut tracker = StateTracker::new(&wf, &mut state, &observer);

        let err = tracker.transition(0, StepStatus::Completed).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { index: 0, .. }));
        assert!(tracker.transition(5, StepStatus::Running).is_err());
    }

    #[test]
    fn test_tracker_publishes_every_change() {
        let wf = workflow();
        let mut state = ExecutionState::for_workflow(&wf);
        let seen: Mutex<Vec<WorkflowEvent>> = Mutex::new(Vec::new());
        let observer = |update: &RunUpdate| seen.lock().unwrap().push(update.event.clone());

        {
            let mut tracker = StateTracker::new(&wf, &mut state, &observer);
            tracker.start();
            tracker.transition(0, StepStatus::Running).unwrap();
            tracker.record_result(0, AgentResult::new("out"));
            tracker.transition(0, StepStatus::Completed).unwrap();
            tracker.finish();
        }

        let events = seen.into_inner().unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], WorkflowEvent::RunStarted { step_count: 2, .. }));
        assert!(matches!(
            events[2],
            WorkflowEvent::StepStatusChanged {
                to: StepStatus::Completed,
                ..
            }
        ));
        assert_eq!(state.previous_result_text, "out");
        assert!(state.is_done());
        assert!(!state.is_fresh());
    }
}

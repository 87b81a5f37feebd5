//! Sequential workflow executor
//!
//! Runs every step of a workflow in declaration order, one agent call in flight
//! at a time, until the list is exhausted or a step halts the run. There is no
//! retry and no resume: a new run always starts from a fresh
//! [`ExecutionState`].

use super::definition::WorkflowDefinition;
use super::event::{ChannelObserver, NoopObserver, RunObserver, RunUpdate};
use super::state::{ExecutionState, StateTracker};
use super::status::StepStatus;
use super::step_runner::{StepOutcome, StepRunner};
use crate::abstractions::AgentInvoker;
use crate::deal::DealContext;
use crate::error::{Error, Result};
use crate::registry::AgentRegistry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct WorkflowExecutor {
    registry: Arc<dyn AgentRegistry>,
    invoker: Arc<dyn AgentInvoker>,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<dyn AgentRegistry>, invoker: Arc<dyn AgentInvoker>) -> Self {
        Self { registry, invoker }
    }

    pub fn registry(&self) -> &dyn AgentRegistry {
        self.registry.as_ref()
    }

    /// Run `workflow` against `context`, mutating `state` and publishing
    /// every change to `observer`
    ///
    /// `state` must be fresh and sized for `workflow`. Step failures are not
    /// errors of this function; they are recorded in `state.error`.
    pub async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        context: &DealContext,
        state: &mut ExecutionState,
        observer: &dyn RunObserver,
    ) -> Result<()> {
        state.ensure_fresh_for(workflow)?;

        let span = info_span!("workflow_run", run_id = %state.run_id, workflow = %workflow.id);
        self.execute_steps(workflow, context, state, observer)
            .instrument(span)
            .await
    }

    async fn execute_steps(
        &self,
        workflow: &WorkflowDefinition,
        context: &DealContext,
        state: &mut ExecutionState,
        observer: &dyn RunObserver,
    ) -> Result<()> {
        info!("Running workflow '{}' ({} steps)", workflow.title, workflow.len());

        let mut tracker = StateTracker::new(workflow, state, observer);
        let runner = StepRunner::new(self.registry.as_ref(), self.invoker.as_ref(), context);
        tracker.start();

        for index in 0..workflow.len() {
            let outcome = runner.run(workflow, &mut tracker, index).await?;
            if outcome.continues_run() {
                continue;
            }
            if outcome == StepOutcome::Stopped {
                for later in index + 1..workflow.len() {
                    tracker.transition(later, StepStatus::Stopped)?;
                }
            }
            break;
        }

        tracker.finish();

        let state = tracker.state();
        info!(
            "Workflow '{}' done: {} completed, {} skipped, {} stopped, {} failed",
            workflow.id,
            state.count(StepStatus::Completed),
            state.count(StepStatus::Skipped),
            state.count(StepStatus::Stopped),
            state.count(StepStatus::Failed)
        );
        Ok(())
    }

    /// Run to completion on a fresh state and return it
    pub async fn run(
        &self,
        workflow: &WorkflowDefinition,
        context: &DealContext,
    ) -> Result<ExecutionState> {
        let mut state = ExecutionState::for_workflow(workflow);
        self.execute(workflow, context, &mut state, &NoopObserver)
            .await?;
        Ok(state)
    }

    /// Start a run in the background and return a handle for observing it
    ///
    /// Dropping the handle abandons the run: it keeps going, unobserved, and an
    /// in-flight agent call is not aborted.
    pub fn start_run(
        &self,
        workflow: Arc<WorkflowDefinition>,
        context: Arc<DealContext>,
    ) -> RunHandle {
        let mut state = ExecutionState::for_workflow(&workflow);
        let run_id = state.run_id;
        let (observer, updates) = ChannelObserver::channel();
        let executor = self.clone();

        let task = tokio::spawn(async move {
            executor
                .execute(&workflow, &context, &mut state, &observer)
                .await?;
            Ok::<_, Error>(state)
        });

        RunHandle {
            run_id,
            updates,
            task,
        }
    }
}

/// Handle to a run started with [`WorkflowExecutor::start_run`]
pub struct RunHandle {
    run_id: Uuid,
    updates: mpsc::UnboundedReceiver<RunUpdate>,
    task: JoinHandle<Result<ExecutionState>>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next update in mutation order; `None` once the run has finished and
    /// every update has been received
    pub async fn next_update(&mut self) -> Option<RunUpdate> {
        self.updates.recv().await
    }

    /// Wait for the run to finish and take its final state
    pub async fn wait(self) -> Result<ExecutionState> {
        self.task
            .await
            .map_err(|e| Error::Workflow(format!("run task did not complete: {e}")))?
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

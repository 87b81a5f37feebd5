//! Run updates published while a workflow executes
//!
//! Every state mutation produces a [`RunUpdate`] carrying the event and a full
//! snapshot of the run state. Observers are called synchronously from the
//! executor, so the order they see is the order the mutations happened.

use super::state::ExecutionState;
use super::status::StepStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    RunStarted {
        workflow_id: String,
        step_count: usize,
    },
    StepStatusChanged {
        step_index: usize,
        agent_id: String,
        from: StepStatus,
        to: StepStatus,
    },
    RunFinished {
        workflow_id: String,
        error: Option<String>,
    },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::RunStarted { .. } => "run_started",
            WorkflowEvent::StepStatusChanged { .. } => "step_status_changed",
            WorkflowEvent::RunFinished { .. } => "run_finished",
        }
    }
}

/// One observable change, with the state as it stood right after it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunUpdate {
    pub timestamp: DateTime<Utc>,
    pub event: WorkflowEvent,
    pub state: ExecutionState,
}

impl RunUpdate {
    pub fn new(event: WorkflowEvent, state: ExecutionState) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            state,
        }
    }
}

/// Receives run updates in mutation order
pub trait RunObserver: Send + Sync {
    fn on_update(&self, update: &RunUpdate);
}

impl<F> RunObserver for F
where
    F: Fn(&RunUpdate) + Send + Sync,
{
    fn on_update(&self, update: &RunUpdate) {
        self(update)
    }
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_update(&self, _update: &RunUpdate) {}
}

/// Forwards updates onto an unbounded channel
///
/// A dropped receiver is not an error for the run; updates are discarded.
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<RunUpdate>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::UnboundedSender<RunUpdate>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl RunObserver for ChannelObserver {
    fn on_update(&self, update: &RunUpdate) {
        if self.sender.send(update.clone()).is_err() {
            debug!("Run update receiver dropped; discarding {}", update.event.name());
        }
    }
}

/// Writes each update to the tracing log
pub struct LoggingObserver;

impl RunObserver for LoggingObserver {
    fn on_update(&self, update: &RunUpdate) {
        match &update.event {
            WorkflowEvent::RunStarted {
                workflow_id,
                step_count,
            } => info!("Starting workflow '{}' ({} steps)", workflow_id, step_count),
            WorkflowEvent::StepStatusChanged {
                step_index,
                agent_id,
                to,
                ..
            } => match to {
                StepStatus::Failed => warn!("Step {} ({}) failed", step_index + 1, agent_id),
                _ => info!("Step {} ({}) {}", step_index + 1, agent_id, to),
            },
            WorkflowEvent::RunFinished {
                workflow_id,
                error: Some(error),
            } => warn!("Workflow '{}' finished with error: {}", workflow_id, error),
            WorkflowEvent::RunFinished { workflow_id, .. } => {
                info!("Workflow '{}' finished", workflow_id)
            }
        }
    }
}

/// Fans one update out to several observers, in registration order
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RunObserver for CompositeObserver {
    fn on_update(&self, update: &RunUpdate) {
        for observer in &self.observers {
            observer.on_update(update);
        }
    }
}

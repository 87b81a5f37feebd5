//! Workflow orchestration
//!
//! A workflow chains agent invocations in a fixed order. Each step may be gated
//! on an earlier step's output; an unsatisfied gate either skips the step or
//! stops the rest of the run. The executor owns one [`ExecutionState`] per run
//! and publishes a [`RunUpdate`] after every change to it.

pub mod condition;
pub mod definition;
pub mod event;
pub mod executor;
pub mod state;
pub mod status;
pub mod step_runner;
pub mod validation;

pub use definition::{OnFailure, StepCondition, WorkflowDefinition, WorkflowStep};
pub use event::{
    ChannelObserver, CompositeObserver, LoggingObserver, NoopObserver, RunObserver, RunUpdate,
    WorkflowEvent,
};
pub use executor::{RunHandle, WorkflowExecutor};
pub use state::ExecutionState;
pub use status::{StepStatus, WorkflowStatus};
pub use step_runner::{build_agent_input, StepOutcome};
pub use validation::{has_errors, validate_workflow, Severity, ValidationIssue};

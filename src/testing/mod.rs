//! Testing utilities and fixtures
//!
//! Provides a scriptable agent invoker and fixture builders for exercising the
//! workflow engine without network access.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{gated_three_step, registry_with, sample_deal, WorkflowBuilder};
pub use mocks::{MockAgentInvoker, MockAgentInvokerBuilder, RecordedCall};

use crate::registry::StaticAgentRegistry;
use crate::workflow::WorkflowExecutor;
use std::sync::Arc;

/// Executor wired to `registry` and a shared mock invoker
pub fn mock_executor(
    registry: StaticAgentRegistry,
    invoker: MockAgentInvoker,
) -> (WorkflowExecutor, Arc<MockAgentInvoker>) {
    let invoker = Arc::new(invoker);
    let executor = WorkflowExecutor::new(Arc::new(registry), invoker.clone());
    (executor, invoker)
}

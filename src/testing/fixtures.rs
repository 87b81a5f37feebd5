//! Fixture builders shared by unit and integration tests

use crate::abstractions::AgentDescriptor;
use crate::deal::DealContext;
use crate::registry::StaticAgentRegistry;
use crate::workflow::{OnFailure, StepCondition, WorkflowDefinition, WorkflowStep};
use serde_json::json;

/// Deal with a single purchase price field
pub fn sample_deal() -> DealContext {
    DealContext::from_value(json!({ "purchase_price": 500000 })).unwrap_or_default()
}

/// Registry holding one plain agent per id
pub fn registry_with(agent_ids: &[&str]) -> StaticAgentRegistry {
    let agents = agent_ids
        .iter()
        .map(|id| AgentDescriptor::new(*id, format!("Agent {id}"), format!("Run_{id}")))
        .collect();
    StaticAgentRegistry::from_agents(agents).unwrap_or_default()
}

/// Builder for workflow definitions
pub struct WorkflowBuilder {
    workflow: WorkflowDefinition,
}

impl WorkflowBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            workflow: WorkflowDefinition::new(id, format!("Workflow {id}"), Vec::new()),
        }
    }

    pub fn step(mut self, agent_id: &str) -> Self {
        self.workflow.steps.push(WorkflowStep::new(agent_id));
        self
    }

    /// Append a step gated on `source`'s output containing `needle`
    pub fn conditional_step(
        mut self,
        agent_id: &str,
        source: &str,
        needle: &str,
        on_failure: OnFailure,
    ) -> Self {
        self.workflow.steps.push(
            WorkflowStep::new(agent_id)
                .with_condition(StepCondition::new(source, needle, on_failure)),
        );
        self
    }

    pub fn build(self) -> WorkflowDefinition {
        self.workflow
    }
}

/// `[a, b (if a contains needle), c]`
pub fn gated_three_step(needle: &str, on_failure: OnFailure) -> WorkflowDefinition {
    WorkflowBuilder::new("gated")
        .step("a")
        .conditional_step("b", "a", needle, on_failure)
        .step("c")
        .build()
}

//! Workflow definitions
//!
//! A workflow is an ordered list of steps. Order is the execution order and the
//! only valid direction for condition references: a condition may only look at
//! a step that appears earlier in the same list.

use serde::{Deserialize, Serialize};

/// What to do when a step's condition is not satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    /// Bypass this step and continue with the next one
    Skip,
    /// Halt the run, marking this and every later step as stopped
    Stop,
}

impl std::fmt::Display for OnFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnFailure::Skip => write!(f, "skip"),
            OnFailure::Stop => write!(f, "stop"),
        }
    }
}

/// Data-dependent gate evaluated before a step runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCondition {
    /// Agent id of the earlier step whose output is inspected
    #[serde(alias = "sourceAgentId")]
    pub source_agent_id: String,
    /// Case-insensitive substring that must appear in that output
    #[serde(alias = "outputContains")]
    pub output_contains: String,
    #[serde(alias = "onFailure")]
    pub on_failure: OnFailure,
}

impl StepCondition {
    pub fn new(
        source_agent_id: impl Into<String>,
        output_contains: impl Into<String>,
        on_failure: OnFailure,
    ) -> Self {
        Self {
            source_agent_id: source_agent_id.into(),
            output_contains: output_contains.into(),
            on_failure,
        }
    }
}

/// One position in a workflow
///
/// A step has no identity beyond its index; several steps may name the same agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Registry id of the agent to invoke
    #[serde(alias = "agentId")]
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,
}

impl WorkflowStep {
    /// Create an unconditional step
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            condition: None,
        }
    }

    /// Attach a condition to this step
    pub fn with_condition(mut self, condition: StepCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// A named, immutable chain of agent steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            steps,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Agent ids of every step, in order
    pub fn agent_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.agent_id.as_str()).collect()
    }

    /// Index of the first step running `agent_id`
    pub fn position_of(&self, agent_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.agent_id == agent_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

//! Static checks for workflow definitions
//!
//! Lint only. The executor never consults these findings: a broken condition
//! reference still just evaluates as unsatisfied at run time.

use super::definition::WorkflowDefinition;
use crate::registry::AgentRegistry;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Zero-based step index, `None` for workflow-level findings
    pub step_index: Option<usize>,
    pub message: String,
}

impl ValidationIssue {
    fn error(step_index: usize, message: String) -> Self {
        Self {
            severity: Severity::Error,
            step_index: Some(step_index),
            message,
        }
    }

    fn warning(step_index: Option<usize>, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            step_index,
            message,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step_index {
            Some(index) => write!(f, "{}: step {}: {}", self.severity, index + 1, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Check `workflow` against `registry`
pub fn validate_workflow(
    workflow: &WorkflowDefinition,
    registry: &dyn AgentRegistry,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if workflow.is_empty() {
        issues.push(ValidationIssue::warning(
            None,
            "workflow has no steps".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (index, step) in workflow.steps.iter().enumerate() {
        if registry.find_agent_by_id(&step.agent_id).is_none() {
            issues.push(ValidationIssue::error(
                index,
                format!("unknown agent '{}'", step.agent_id),
            ));
        }

        if !seen.insert(step.agent_id.as_str()) {
            issues.push(ValidationIssue::warning(
                Some(index),
                format!(
                    "agent '{}' already appears earlier; conditions naming it read the first occurrence",
                    step.agent_id
                ),
            ));
        }

        let Some(condition) = &step.condition else {
            continue;
        };

        match workflow.position_of(&condition.source_agent_id) {
            None => issues.push(ValidationIssue::error(
                index,
                format!(
                    "condition references '{}', which is not a step of this workflow",
                    condition.source_agent_id
                ),
            )),
            Some(source) if source == index => issues.push(ValidationIssue::error(
                index,
                "condition references its own step and can never be satisfied".to_string(),
            )),
            Some(source) if source > index => issues.push(ValidationIssue::error(
                index,
                format!(
                    "condition references '{}' at step {}, which runs later",
                    condition.source_agent_id,
                    source + 1
                ),
            )),
            Some(_) => {}
        }

        if condition.output_contains.is_empty() {
            issues.push(ValidationIssue::warning(
                Some(index),
                "empty output_contains matches any completed source output".to_string(),
            ));
        }
    }

    issues
}

/// Whether any finding is an error
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|issue| issue.severity == Severity::Error)
}

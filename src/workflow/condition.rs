//! Branch condition evaluation
//!
//! Pure functions with no side effects. Missing data is "not satisfied", never an error.

use super::definition::StepCondition;
use crate::abstractions::AgentResult;

/// Evaluate `condition` against the results captured so far
///
/// The source step is the first step whose agent id equals
/// `condition.source_agent_id`. The condition holds iff that step has a result
/// and its text contains `output_contains`, both sides lowercased.
pub fn evaluate<S: AsRef<str>>(
    condition: &StepCondition,
    step_results: &[Option<AgentResult>],
    step_agent_ids: &[S],
) -> bool {
    source_result(condition, step_results, step_agent_ids)
        .map(|result| text_contains(&result.text, &condition.output_contains))
        .unwrap_or(false)
}

fn source_result<'a, S: AsRef<str>>(
    condition: &StepCondition,
    step_results: &'a [Option<AgentResult>],
    step_agent_ids: &[S],
) -> Option<&'a AgentResult> {
    let index = step_agent_ids
        .iter()
        .position(|id| id.as_ref() == condition.source_agent_id)?;
    step_results.get(index)?.as_ref()
}

/// Case-folded substring test
pub fn text_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

//! Final run report

use super::{next_action, project_steps, status_label, status_symbol, NextAction};
use crate::abstractions::AgentResult;
use crate::error::Result;
use crate::registry::AgentRegistry;
use crate::workflow::{ExecutionState, StepStatus, WorkflowDefinition, WorkflowStatus};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct RunReport<'a> {
    run_id: Uuid,
    workflow_id: &'a str,
    workflow_title: &'a str,
    workflow_status: WorkflowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    steps: Vec<StepReport<'a>>,
}

#[derive(Serialize)]
struct StepReport<'a> {
    index: usize,
    agent_id: &'a str,
    title: &'a str,
    status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a AgentResult>,
}

pub fn render_report(
    workflow: &WorkflowDefinition,
    state: &ExecutionState,
    registry: &dyn AgentRegistry,
    format: ReportFormat,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(workflow, state, registry)),
        ReportFormat::Json => render_json(workflow, state, registry),
    }
}

fn render_json(
    workflow: &WorkflowDefinition,
    state: &ExecutionState,
    registry: &dyn AgentRegistry,
) -> Result<String> {
    let report = RunReport {
        run_id: state.run_id,
        workflow_id: &workflow.id,
        workflow_title: &workflow.title,
        workflow_status: state.workflow_status,
        error: state.error.as_deref(),
        steps: project_steps(workflow, state, registry)
            .into_iter()
            .map(|view| StepReport {
                index: view.index,
                agent_id: view.agent_id,
                title: view.title,
                status: view.status,
                result: view.result,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_text(
    workflow: &WorkflowDefinition,
    state: &ExecutionState,
    registry: &dyn AgentRegistry,
) -> String {
    let views = project_steps(workflow, state, registry);
    let mut out = String::new();

    let _ = writeln!(out, "{}", workflow.title);
    let _ = writeln!(out, "{}", "=".repeat(workflow.title.chars().count()));
    let _ = writeln!(out, "Run {} ({})", state.run_id, state.workflow_status);
    let _ = writeln!(out);

    for view in &views {
        let _ = writeln!(
            out,
            "{} {}. {} [{}]",
            status_symbol(view.status),
            view.index + 1,
            view.title,
            status_label(view.status)
        );
    }

    if let Some(error) = &state.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "Workflow Error: {error}");
    }

    for view in &views {
        let Some(result) = view.result else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}. {}", view.index + 1, view.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", result.text.trim_end());

        if let Some(metrics) = result.structured_metrics.filter(|m| !m.is_empty()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "Key metrics:");
            if let Some(value) = metrics.total_equity_needed {
                let _ = writeln!(out, "  Total Equity Needed: ${value:.0}");
            }
            if let Some(value) = metrics.dscr_estimate {
                let _ = writeln!(out, "  DSCR Estimate: {value:.2}x");
            }
            if let Some(value) = metrics.post_close_liquidity {
                let _ = writeln!(out, "  Post-Close Liquidity: ${value:.0}");
            }
        }

        if !result.sources.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Sources:");
            for source in &result.sources {
                let _ = writeln!(out, "  - {} <{}>", source.title(), source.uri());
            }
        }
    }

    if next_action(state) == NextAction::StartOver {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "The run cannot be resumed. Fix the problem and start over from the first step."
        );
    }

    out
}

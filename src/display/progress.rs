//! Live terminal progress using indicatif

use super::{agent_title, status_label, status_symbol};
use crate::registry::AgentRegistry;
use crate::workflow::{RunObserver, RunUpdate, StepStatus, WorkflowDefinition, WorkflowEvent};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// One spinner line per step, updated from run updates
pub struct TerminalProgressObserver {
    multi: MultiProgress,
    header: ProgressBar,
    steps: Vec<(String, ProgressBar)>,
}

impl TerminalProgressObserver {
    /// Progress drawn to stderr
    pub fn new(workflow: &WorkflowDefinition, registry: &dyn AgentRegistry) -> Self {
        Self::with_draw_target(workflow, registry, ProgressDrawTarget::stderr())
    }

    /// Progress that is tracked but never drawn
    pub fn hidden(workflow: &WorkflowDefinition, registry: &dyn AgentRegistry) -> Self {
        Self::with_draw_target(workflow, registry, ProgressDrawTarget::hidden())
    }

    fn with_draw_target(
        workflow: &WorkflowDefinition,
        registry: &dyn AgentRegistry,
        target: ProgressDrawTarget,
    ) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let header = multi.add(ProgressBar::new(workflow.len() as u64));
        header.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_msg} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        header.set_message(workflow.title.clone());

        let steps = workflow
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let title = format!("{}. {}", index + 1, agent_title(registry, &step.agent_id));
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(
                    ProgressStyle::with_template("  {prefix} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.set_prefix(status_symbol(StepStatus::Pending));
                bar.set_message(format!("{title} [{}]", status_label(StepStatus::Pending)));
                (title, bar)
            })
            .collect();

        Self {
            multi,
            header,
            steps,
        }
    }

    fn show_step(&self, index: usize, status: StepStatus) {
        let Some((title, bar)) = self.steps.get(index) else {
            return;
        };
        bar.set_prefix(status_symbol(status));
        let message = format!("{title} [{}]", status_label(status));
        if status == StepStatus::Running {
            bar.set_style(
                ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_message(message);
        } else if status.is_terminal() {
            bar.set_style(
                ProgressStyle::with_template("  {prefix} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.finish_with_message(message);
            self.header.inc(1);
        } else {
            bar.set_message(message);
        }
    }

    /// Current message of the step line, for tests and diagnostics
    pub fn step_message(&self, index: usize) -> Option<String> {
        self.steps.get(index).map(|(_, bar)| bar.message())
    }

    /// Remove every line from the terminal
    pub fn clear(&self) {
        let _ = self.multi.clear();
    }
}

impl RunObserver for TerminalProgressObserver {
    fn on_update(&self, update: &RunUpdate) {
        match &update.event {
            WorkflowEvent::RunStarted { .. } => {
                self.header.enable_steady_tick(Duration::from_millis(100));
            }
            WorkflowEvent::StepStatusChanged { step_index, to, .. } => {
                self.show_step(*step_index, *to);
            }
            WorkflowEvent::RunFinished { error, .. } => {
                let message = match error {
                    Some(_) => "failed",
                    None => "done",
                };
                self.header.finish_with_message(message);
            }
        }
    }
}

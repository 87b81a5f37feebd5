//! Subcommand handlers

use super::args::{Commands, ListTarget};
use crate::abstractions::GeminiAgentInvoker;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::deal::DealContext;
use crate::display::{render_report, ReportFormat, TerminalProgressObserver};
use crate::registry::{AgentRegistry, StaticAgentRegistry};
use crate::workflow::{
    has_errors, validate_workflow, LoggingObserver, RunObserver, Severity, WorkflowExecutor,
};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(command: Commands, config: Config) -> Result<()> {
    let catalog = Catalog::load(&config.catalog)
        .await
        .context("Failed to load catalogs")?;

    match command {
        Commands::Run {
            workflow,
            deal,
            format,
            output,
            no_progress,
        } => {
            let options = RunOptions {
                workflow_id: workflow,
                deal_path: deal,
                format,
                output,
                show_progress: !no_progress,
            };
            run_workflow(&config, catalog, options).await
        }
        Commands::List { what } => {
            print!("{}", list_catalog(&catalog, what));
            Ok(())
        }
        Commands::Validate { workflow } => validate_catalog(&catalog, workflow.as_deref()),
    }
}

pub struct RunOptions {
    pub workflow_id: String,
    pub deal_path: PathBuf,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub show_progress: bool,
}

async fn run_workflow(config: &Config, catalog: Catalog, options: RunOptions) -> Result<()> {
    let workflow = Arc::new(catalog.find_workflow(&options.workflow_id)?.clone());
    let deal = DealContext::load(&options.deal_path)
        .await
        .with_context(|| format!("Failed to read deal file {}", options.deal_path.display()))?;
    info!(
        "Loaded deal '{}' ({} fields)",
        deal.deal_name().unwrap_or("unnamed"),
        deal.fields().len()
    );
    let registry: Arc<StaticAgentRegistry> = Arc::new(catalog.agents);

    for issue in validate_workflow(&workflow, registry.as_ref()) {
        warn!("{}: {}", workflow.id, issue);
    }

    let invoker = GeminiAgentInvoker::new(config.gemini.clone())?;
    let executor = WorkflowExecutor::new(registry.clone(), Arc::new(invoker));

    // Live progress only makes sense when the report itself isn't machine-read
    let progress = (options.show_progress && options.format == ReportFormat::Text)
        .then(|| TerminalProgressObserver::new(&workflow, registry.as_ref()));
    let observer: &dyn RunObserver = match &progress {
        Some(progress) => progress,
        None => &LoggingObserver,
    };

    let mut handle = executor.start_run(workflow.clone(), Arc::new(deal));
    info!("Started run {} of '{}'", handle.run_id(), workflow.id);
    while let Some(update) = handle.next_update().await {
        observer.on_update(&update);
    }
    let state = handle.wait().await?;
    if let Some(progress) = &progress {
        progress.clear();
    }

    let report = render_report(&workflow, &state, registry.as_ref(), options.format)?;
    write_report(&report, options.output.as_deref()).await?;

    match &state.error {
        Some(error) => Err(anyhow!("Workflow '{}' failed: {}", workflow.id, error)),
        None => Ok(()),
    }
}

async fn write_report(report: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, report)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

fn list_catalog(catalog: &Catalog, what: Option<ListTarget>) -> String {
    let mut out = String::new();

    if what != Some(ListTarget::Workflows) {
        out.push_str("Agents:\n");
        for agent in catalog.agents.agents() {
            out.push_str(&format!("  {:<32} {} ({})\n", agent.id, agent.title, agent.mode));
        }
    }

    if what.is_none() {
        out.push('\n');
    }

    if what != Some(ListTarget::Agents) {
        out.push_str("Workflows:\n");
        for workflow in &catalog.workflows {
            out.push_str(&format!(
                "  {:<32} {} ({} steps)\n",
                workflow.id,
                workflow.title,
                workflow.len()
            ));
        }
    }

    out
}

fn validate_catalog(catalog: &Catalog, only: Option<&str>) -> Result<()> {
    let workflows = match only {
        Some(id) => vec![catalog.find_workflow(id)?],
        None => catalog.workflows.iter().collect(),
    };

    let mut failed = 0;
    for workflow in workflows {
        let issues = validate_workflow(workflow, &catalog.agents);
        if issues.is_empty() {
            println!("✓ {}", workflow.id);
            continue;
        }

        let symbol = if has_errors(&issues) { "✗" } else { "!" };
        println!("{} {}", symbol, workflow.id);
        for issue in &issues {
            println!("    {issue}");
        }
        if issues.iter().any(|i| i.severity == Severity::Error) {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(anyhow!("{failed} workflow(s) failed validation"));
    }
    Ok(())
}

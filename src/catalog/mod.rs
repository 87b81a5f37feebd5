//! Built-in agent and workflow catalogs
//!
//! Both lists are compiled into the binary and may be replaced wholesale by
//! files named in the `[catalog]` config section.

use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::registry::StaticAgentRegistry;
use crate::workflow::WorkflowDefinition;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const BUILTIN_AGENTS: &str = include_str!("agents.yaml");
const BUILTIN_WORKFLOWS: &str = include_str!("workflows.yaml");

#[derive(Debug, Clone)]
pub struct Catalog {
    pub agents: StaticAgentRegistry,
    pub workflows: Vec<WorkflowDefinition>,
}

impl Catalog {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            agents: StaticAgentRegistry::from_yaml_str(BUILTIN_AGENTS)?,
            workflows: parse_workflows(BUILTIN_WORKFLOWS)?,
        })
    }

    /// Built-in catalogs with any configured file overrides applied
    pub async fn load(config: &CatalogConfig) -> Result<Self> {
        let mut catalog = Self::builtin()?;

        if let Some(path) = &config.agents {
            debug!("Loading agent catalog from {}", path.display());
            catalog.agents = StaticAgentRegistry::load(path)
                .await
                .map_err(|e| catalog_error(path, e))?;
        }

        if let Some(path) = &config.workflows {
            debug!("Loading workflow catalog from {}", path.display());
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| catalog_error(path, e.into()))?;
            catalog.workflows = parse_workflows(&content).map_err(|e| catalog_error(path, e))?;
        }

        Ok(catalog)
    }

    pub fn find_workflow(&self, id: &str) -> Result<&WorkflowDefinition> {
        self.workflows
            .iter()
            .find(|workflow| workflow.id == id)
            .ok_or_else(|| Error::WorkflowNotFound(id.to_string()))
    }
}

/// Parse a workflow list, rejecting duplicate workflow ids
pub fn parse_workflows(yaml: &str) -> Result<Vec<WorkflowDefinition>> {
    let workflows: Vec<WorkflowDefinition> = serde_yaml::from_str(yaml)?;
    let mut seen = HashSet::new();
    for workflow in &workflows {
        if !seen.insert(workflow.id.as_str()) {
            return Err(Error::Validation(format!(
                "duplicate workflow id '{}'",
                workflow.id
            )));
        }
    }
    Ok(workflows)
}

fn catalog_error(path: &Path, err: Error) -> Error {
    Error::Config(format!("failed to load catalog {}: {}", path.display(), err))
}

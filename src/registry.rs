//! Process-wide agent registry
//!
//! Workflow steps reference agents by id. The registry is loaded once and is
//! read-only afterwards; a lookup miss is a configuration error for the run.

use crate::abstractions::AgentDescriptor;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Lookup of agent descriptors by id
pub trait AgentRegistry: Send + Sync {
    fn find_agent_by_id(&self, id: &str) -> Option<&AgentDescriptor>;

    /// All registered agents, in registration order
    fn agents(&self) -> &[AgentDescriptor];
}

/// Registry backed by an in-memory list
#[derive(Debug, Clone, Default)]
pub struct StaticAgentRegistry {
    agents: Vec<AgentDescriptor>,
}

impl StaticAgentRegistry {
    /// Build a registry, rejecting duplicate ids
    pub fn from_agents(agents: Vec<AgentDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for agent in &agents {
            if agent.id.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "agent '{}' has an empty id",
                    agent.title
                )));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate agent id '{}'",
                    agent.id
                )));
            }
        }
        Ok(Self { agents })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let agents: Vec<AgentDescriptor> = serde_yaml::from_str(yaml)?;
        Self::from_agents(agents)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentRegistry for StaticAgentRegistry {
    fn find_agent_by_id(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let registry = StaticAgentRegistry::from_agents(vec![
            AgentDescriptor::new("a", "Agent A", "Do_A"),
            AgentDescriptor::new("b", "Agent B", "Do_B"),
        ])
        .unwrap();
        assert_eq!(registry.find_agent_by_id("b").unwrap().title, "Agent B");
        assert!(registry.find_agent_by_id("nonexistent").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = StaticAgentRegistry::from_agents(vec![
            AgentDescriptor::new("a", "First", "Do"),
            AgentDescriptor::new("a", "Second", "Do"),
        ]);
        assert!(matches!(result, Err(Error::Validation(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = StaticAgentRegistry::from_agents(vec![AgentDescriptor::new(" ", "Blank", "Do")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
- id: deal_health_scorer
  title: Deal Health Scorer
  command: Score_Deal_Health
  mode: thinking
"#;
        let registry = StaticAgentRegistry::from_yaml_str(yaml).unwrap();
        let agent = registry.find_agent_by_id("deal_health_scorer").unwrap();
        assert_eq!(agent.mode, crate::abstractions::AgentMode::Thinking);
    }
}

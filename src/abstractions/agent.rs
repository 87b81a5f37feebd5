//! Agent invocation abstraction
//!
//! The workflow engine never talks to a model directly. It resolves an
//! [`AgentDescriptor`] from the registry and hands it, together with the deal
//! and a textual instruction, to an [`AgentInvoker`]. Any error returned by the
//! invoker is treated as a single undifferentiated failure of that step.

use crate::deal::DealContext;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How an agent should be executed by a model-backed invoker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    #[default]
    Default,
    /// Use the slower reasoning model with an extended thinking budget
    Thinking,
    /// Ground the answer with web search
    Search,
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentMode::Default => "default",
            AgentMode::Thinking => "thinking",
            AgentMode::Search => "search",
        };
        f.write_str(s)
    }
}

/// Static description of an analysis agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Core command the agent performs when given no specific request
    pub command: String,
    /// Components the generated report must contain
    #[serde(default)]
    pub output_requirements: String,
    #[serde(default)]
    pub mode: AgentMode,
}

impl AgentDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            command: command.into(),
            output_requirements: String::new(),
            mode: AgentMode::Default,
        }
    }

    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_output_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.output_requirements = requirements.into();
        self
    }
}

/// A citation returned by a grounded agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundingSource {
    Web { uri: String, title: String },
    Maps { uri: String, title: String },
}

impl GroundingSource {
    pub fn uri(&self) -> &str {
        match self {
            GroundingSource::Web { uri, .. } | GroundingSource::Maps { uri, .. } => uri,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            GroundingSource::Web { title, .. } | GroundingSource::Maps { title, .. } => title,
        }
    }
}

/// Key figures lifted out of a capital stack report
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub total_equity_needed: Option<f64>,
    pub dscr_estimate: Option<f64>,
    pub post_close_liquidity: Option<f64>,
}

impl ScenarioMetrics {
    pub fn is_empty(&self) -> bool {
        self.total_equity_needed.is_none()
            && self.dscr_estimate.is_none()
            && self.post_close_liquidity.is_none()
    }
}

/// Output of one agent invocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentResult {
    /// Report text; matched by conditions and threaded into the next step
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_metrics: Option<ScenarioMetrics>,
}

impl AgentResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
            structured_metrics: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_metrics(mut self, metrics: ScenarioMetrics) -> Self {
        self.structured_metrics = Some(metrics);
        self
    }
}

/// Trait for running a single agent against a deal
///
/// Implementations must not retry on behalf of the engine; a returned error
/// fails the step and ends the run.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        agent: &AgentDescriptor,
        context: &DealContext,
        input: &str,
    ) -> Result<AgentResult>;
}

//! Abstraction layers for external dependencies
//!
//! This module provides the trait seam the workflow engine uses to reach the
//! generative-AI service, plus the HTTP implementation used by the CLI.

pub mod agent;
pub mod gemini;
pub mod metrics;

pub use agent::{
    AgentDescriptor, AgentInvoker, AgentMode, AgentResult, GroundingSource, ScenarioMetrics,
};
pub use gemini::GeminiAgentInvoker;
pub use metrics::parse_metrics_from_text;

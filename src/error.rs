use crate::workflow::StepStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: Agent with ID \"{0}\" not found.")]
    AgentNotFound(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Invalid transition for step {index}: {from} -> {to}")]
    InvalidTransition {
        index: usize,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("Execution state is not fresh: {0}")]
    StateNotFresh(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

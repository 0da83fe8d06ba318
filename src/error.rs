//! Error types for the supervisor orchestration core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Invalid execution context: {0}")]
    InvalidContext(String),
    #[error("Database session is required before orchestration (user_id: {user_id})")]
    MissingDbSession { user_id: String },
    #[error("Agent execution failed for {agent_name}: {reason}")]
    AgentExecution { agent_name: String, reason: String },
    #[error("Cyclic agent dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
    #[error("Agent registration error: {0}")]
    Registration(String),
    #[error("Managed session error: {0}")]
    Session(String),
    #[error("Tool dispatch failed for {tool_name}: {reason}")]
    ToolDispatch { tool_name: String, reason: String },
    #[error("LLM error: {0}")]
    Llm(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Notification error: {0}")]
    Notification(String),
    #[error("Supervisor execution failed: {message}")]
    ExecutionFailed {
        message: String,
        #[source]
        source: Box<SupervisorError>,
    },
}

impl SupervisorError {
    /// Wrap an orchestration failure, keeping the root cause reachable via `source()`
    pub fn execution_failed(source: SupervisorError) -> Self {
        Self::ExecutionFailed {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    /// Precondition failures are raised before any agent runs and are never wrapped
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidContext(_) | Self::MissingDbSession { .. })
    }
}

impl From<serde_json::Error> for SupervisorError {
    fn from(error: serde_json::Error) -> Self {
        SupervisorError::InvalidContext(format!("JSON serialization error: {error}"))
    }
}

impl From<config::ConfigError> for SupervisorError {
    fn from(error: config::ConfigError) -> Self {
        SupervisorError::Configuration(error.to_string())
    }
}

impl From<crate::events::PublishError> for SupervisorError {
    fn from(error: crate::events::PublishError) -> Self {
        SupervisorError::Notification(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;

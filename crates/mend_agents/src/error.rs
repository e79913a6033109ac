//! Error types for agents module.

use thiserror::Error;

use mend_core::ConfigError;
use mend_tools::AdapterError;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while assembling or using agents.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("Tool not bound to agent {agent}: {tool}")]
    ToolNotFound { agent: String, tool: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a tool not found error.
    pub fn tool_not_found(agent: impl Into<String>, tool: impl Into<String>) -> Self {
        Self::ToolNotFound {
            agent: agent.into(),
            tool: tool.into(),
        }
    }
}

//! Error types for tool invocation.

use std::time::Duration;

use thiserror::Error;

use mend_core::SanitizeError;

/// Result type alias for raw tool calls.
pub type InvokeResult<T> = Result<T, ToolError>;

/// Result type alias for adapted tool calls.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Failure reported by an underlying tool.
///
/// The adapter hands these back to the caller exactly as the tool produced
/// them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Invalid arguments for {operation}: {message}")]
    InvalidArguments { operation: String, message: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Tool call failed: {0}")]
    Failed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Tool unavailable: {0}")]
    Unavailable(String),
}

impl ToolError {
    /// Create an invalid arguments error.
    pub fn invalid_arguments(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Unavailable(_))
    }

    /// The request never reached the tool.
    pub fn is_unreached(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Failure of an adapted tool call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("{tool}.{operation} timed out after {timeout:?}")]
    Timeout {
        tool: String,
        operation: String,
        timeout: Duration,
    },

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

impl AdapterError {
    /// Whether the adapter's retry policy applies.
    ///
    /// A call that never reached the tool can always be repeated. Transport
    /// errors and timeouts only when the operation is `repeatable`.
    pub fn is_retryable(&self, repeatable: bool) -> bool {
        match self {
            Self::Tool(e) if e.is_unreached() => true,
            Self::Tool(e) => repeatable && e.is_transient(),
            Self::Timeout { .. } => repeatable,
            Self::Sanitize(_) => false,
        }
    }

    /// The underlying tool error, if this is one.
    pub fn tool_error(&self) -> Option<&ToolError> {
        match self {
            Self::Tool(e) => Some(e),
            _ => None,
        }
    }
}

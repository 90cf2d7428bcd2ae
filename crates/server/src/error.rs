//! Error types for the MCP server.

use thiserror::Error;

/// Failures raised while mapping a tool call onto a Kinsta API request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The requested tool is not part of the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument was absent or null
    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    /// An argument was present but unusable
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

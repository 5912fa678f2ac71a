//! Error types for protocol server operations.

use thiserror::Error;

/// Protocol-level failures, reported as JSON-RPC errors.
///
/// Failures of the tool itself are not errors at this level; they are
/// returned as tool results with `isError` set.
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// JSON-RPC error code.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Parse(_) | McpError::Json(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => -32601,
            McpError::InvalidParams(_) => -32602,
            McpError::Io(_) => -32000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::Parse("x".into()).error_code(), -32700);
        assert_eq!(McpError::InvalidRequest("x".into()).error_code(), -32600);
        assert_eq!(McpError::ToolNotFound("x".into()).error_code(), -32601);
        assert_eq!(McpError::InvalidParams("x".into()).error_code(), -32602);
    }
}

// error.rs
use thiserror::Error;

/// Errors surfaced by the agent, router and configuration layers.
///
/// Routing failures are deliberately absent: an unroutable message is kept in
/// the history and dropped, it never comes back to the sender as an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("tool '{tool}' not found in {agent}'s toolkit")]
    ToolNotFound { agent: String, tool: String },

    #[error("an agent named '{0}' is already registered")]
    DuplicateAgent(String),

    #[error("agent '{agent}' already has a handler for '{kind}' messages")]
    DuplicateHandler { agent: String, kind: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failure raised by a tool while it runs.
///
/// Never escapes `Agent::use_tool`: it is folded into an error outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed(message.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidArguments(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

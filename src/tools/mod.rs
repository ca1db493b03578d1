//! Boundary wrappers around external capabilities: the data-scraping actor
//! plus the small file and text helpers the pipeline leans on.

pub mod apify;
pub mod file;
pub mod parse;

pub use apify::ApifyActorTool;
pub use file::{read_file, write_file};
pub use parse::strip_code_fences;

use std::fmt;

/// Boundary seam for an external data-retrieval capability.
///
/// Given a structured query, returns result records. Record fields are
/// opaque to the pipeline; agents pass them through as text. Retry policy
/// belongs to the caller, never to this layer.
pub trait Tool: Send + Sync {
    /// Name of the external capability, used in prompts and logs.
    fn name(&self) -> &str;

    /// Invoke the capability with a structured query.
    fn invoke(&self, query: &serde_json::Value) -> Result<Vec<serde_json::Value>, ToolError>;
}

/// Error type for tool invocations.
#[derive(Debug)]
pub enum ToolError {
    /// The external service was unreachable, timed out, or answered with an
    /// error status.
    Transport(String),
    /// The service answered, but the payload was not a record set.
    Malformed(String),
}

impl ToolError {
    pub fn transport(msg: impl Into<String>) -> Self {
        ToolError::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        ToolError::Malformed(msg.into())
    }
}

impl From<ureq::Error> for ToolError {
    fn from(e: ureq::Error) -> Self {
        ToolError::Transport(e.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Transport(e.to_string())
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

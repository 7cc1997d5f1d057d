use std::time::Duration;
use thiserror::Error;

/// Failures raised by a renderer handle or its factory
#[derive(Debug, Clone, Error)]
pub enum RendererError {
    /// The rendering engine could not be started
    #[error("Failed to launch renderer: {0}")]
    Launch(String),

    /// Navigation to a page failed
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// An operation exceeded its time budget
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// A page script failed to evaluate
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// Any other engine communication failure
    #[error("Renderer protocol error: {0}")]
    Protocol(String),
}

impl RendererError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<anyhow::Error> for RendererError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Protocol(format!("{err:#}"))
    }
}

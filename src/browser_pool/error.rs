use thiserror::Error;

use crate::renderer::RendererError;

#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// The factory failed to build a handle; pool accounting is already rolled back
    #[error("Failed to create renderer instance: {0}")]
    Construction(#[from] RendererError),

    #[error("Instance pool is closed")]
    Closed,

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
}

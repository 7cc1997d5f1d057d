use thiserror::Error;

use crate::browser_pool::PoolError;
use crate::providers::ConfigError;
use crate::renderer::RendererError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Fetch from provider '{provider}' failed for {url}: {source}")]
    Fetch {
        provider: String,
        url: String,
        #[source]
        source: RendererError,
    },
}

impl SearchError {
    /// HTTP-style status code for the response envelope
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(ConfigError::UnknownProvider(_)) => 404,
            Self::Configuration(_) => 500,
            Self::InvalidRequest(_) => 400,
            Self::Pool(_) => 503,
            Self::Fetch { source, .. } if source.is_timeout() => 504,
            Self::Fetch { .. } => 502,
        }
    }
}

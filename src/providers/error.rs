use std::path::PathBuf;
use thiserror::Error;

/// A provider could not be resolved into a usable configuration.
///
/// Always scoped to one provider: the process keeps serving the others.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Failed to read configuration for provider '{provider}' at {}: {source}", path.display())]
    Io {
        provider: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file for provider '{provider}': {source}")]
    InvalidJson {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid extraction schema for provider '{provider}': {message}")]
    InvalidSchema { provider: String, message: String },

    #[error("Invalid template for provider '{provider}': {message}")]
    InvalidTemplate { provider: String, message: String },

    #[error("No base URL for provider '{provider}' (region '{region}' and fallback missing)")]
    MissingBaseUrl { provider: String, region: String },
}

use std::future::Future;
use std::time::Duration;

use crate::renderer::RendererError;

/// Run `operation` with a deadline, mapping expiry to `RendererError::Timeout`
pub async fn with_timeout<F, T>(
    operation: F,
    after: Duration,
    operation_name: &str,
) -> Result<T, RendererError>
where
    F: Future<Output = Result<T, RendererError>>,
{
    match tokio::time::timeout(after, operation).await {
        Ok(result) => result,
        Err(_) => Err(RendererError::Timeout {
            operation: operation_name.to_string(),
            after,
        }),
    }
}

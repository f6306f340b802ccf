use std::future::Future;
use std::time::Duration;

use crate::config::Settings;
use crate::error::ApiError;

/// The four outbound call deadlines. Exceeding one surfaces as the
/// corresponding *_UNAVAILABLE error class at the call site.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub embedding: Duration,
    pub generation: Duration,
    pub vector_ops: Duration,
    pub memory_store: Duration,
}

impl Timeouts {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            embedding: Duration::from_secs(10),
            generation: Duration::from_secs(60),
            vector_ops: Duration::from_secs(settings.qdrant_timeout),
            memory_store: Duration::from_secs(5),
        }
    }
}

/// Runs `fut` under `deadline`; maps an elapsed timeout to
/// `ApiError::StoreUnavailable` labeled with `op`. Callers whose
/// timeout should surface as EMBED_FAILED/GEN_FAILED instead wrap the
/// result themselves.
pub async fn with_timeout<T, F>(deadline: Duration, op: &'static str, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::store_unavailable(format!(
            "{op} timed out after {deadline:?}"
        ))),
    }
}

//! Cancellation helpers
//!
//! Every external call made during a run is raced against the run's
//! [`CancellationToken`]. Losing the race drops the in-flight future.

use crate::types::{AppError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Await `fut` unless `token` is cancelled first.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if token.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AppError::Cancelled),
        result = fut => result,
    }
}

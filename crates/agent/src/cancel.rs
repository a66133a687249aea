//! Cancellation helpers shared by the loop and the retry policy.

use tokio_util::sync::CancellationToken;

/// Outcome of racing a future against an optional cancellation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelAware<T> {
    Cancelled,
    Value(T),
}

/// Await `fut`, giving up as soon as `token` fires.
pub async fn await_or_cancel<T, F>(token: Option<&CancellationToken>, fut: F) -> CancelAware<T>
where
    F: std::future::Future<Output = T>,
{
    if let Some(token) = token {
        tokio::select! {
            biased;
            _ = token.cancelled() => CancelAware::Cancelled,
            value = fut => CancelAware::Value(value),
        }
    } else {
        CancelAware::Value(fut.await)
    }
}

pub fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}

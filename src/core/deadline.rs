use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation timed out")
    }
}

/// Races `future` against a timer. The operation runs on its own task, so a
/// loser is detached rather than cancelled: a write that misses its deadline
/// may still complete in the background while the caller proceeds.
pub async fn with_deadline<F>(future: F, limit: Duration) -> Result<F::Output, TimedOut>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(future);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_err)) => {
            if join_err.is_panic() {
                std::panic::resume_unwind(join_err.into_panic());
            }
            // The handle is owned here, so the task cannot have been aborted.
            Err(TimedOut)
        }
        Err(_) => Err(TimedOut),
    }
}

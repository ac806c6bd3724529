//! Races an async I/O operation against a deadline.
//!
//! Every `recv`/`send` call in [`crate::server::connection`] goes through
//! [`with_deadline`] rather than calling `tokio::time::sleep` directly —
//! one place decides how cancellation works, so the I/O operations only
//! need to say what to do with the timestamps and the caller-supplied
//! timeout error.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Runs `op`, racing it against `timeout`. On success, returns the
/// instant `op` started, the instant it finished, and whatever `op`
/// returned. On timeout, `op` is dropped (tokio tasks cancel at their
/// next await point, so this is safe even mid-read/mid-write — the
/// socket itself is untouched) and `on_timeout` is used to build the
/// error.
///
/// `biased` selection always polls `op` first: if both the operation and
/// the deadline are ready in the same poll (the read completed in the
/// same instant the timer fired), the real result wins over a spurious
/// timeout.
pub(crate) async fn with_deadline<T, F, E>(
    timeout: Duration,
    op: F,
    on_timeout: impl FnOnce() -> E,
) -> Result<(Instant, Instant, T), E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    tokio::select! {
        biased;
        result = op => {
            let value = result?;
            Ok((start, Instant::now(), value))
        }
        _ = sleep(timeout) => Err(on_timeout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_value_and_timestamps_on_success() {
        let (start, stop, value) = with_deadline(
            Duration::from_secs(5),
            async { Ok::<_, &'static str>(42) },
            || "timed out",
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert!(stop >= start);
    }

    #[tokio::test]
    async fn propagates_inner_error_without_timeout() {
        let result = with_deadline(
            Duration::from_secs(5),
            async { Err::<i32, _>("boom") },
            || "timed out",
        )
        .await;

        assert_eq!(result, Err("boom"));
    }

    #[tokio::test]
    async fn fires_timeout_before_op_completes() {
        let result = with_deadline(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<i32, &'static str>(1)
            },
            || "timed out",
        )
        .await;

        assert_eq!(result, Err("timed out"));
    }
}

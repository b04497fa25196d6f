//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap lifecycle stages with an optional deadline
//! - Cancel the stage future cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from the stage's own errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {}s exceeded", .0.as_secs_f64())]
pub struct DeadlineExceeded(pub Duration);

/// Await `fut`, giving up after `deadline` if one is set.
pub async fn with_deadline<F>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DeadlineExceeded(limit)),
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_deadline_waits() {
        let value = with_deadline(None, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            7
        })
        .await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let limit = Duration::from_millis(10);
        let result = with_deadline(Some(limit), std::future::pending::<()>()).await;
        assert_eq!(result, Err(DeadlineExceeded(limit)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DeadlineExceeded(Duration::from_secs(5)).to_string(),
            "deadline of 5s exceeded"
        );
    }
}

//! # Timeout Combinator
//!
//! Races an async operation against a fixed deadline. Used wherever the
//! client talks to the identity provider, since that endpoint may hang
//! indefinitely on filtered networks.

use std::future::Future;
use std::time::Duration;

/// The operation did not settle before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Run `operation`, giving up after `duration`.
///
/// Whichever settles first wins. If the deadline fires first the operation is
/// dropped and anything it would have produced is discarded.
pub async fn with_timeout<F, T>(operation: F, duration: Duration) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, operation)
        .await
        .map_err(|_| TimedOut(duration))
}

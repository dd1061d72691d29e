//! Error taxonomy and polling primitives
//!
//! Every orchestrator returns an [`IntentsResult`]. Polling loops are written
//! over [`Attempt`] so that "keep waiting", "done" and "give up" are explicit
//! values instead of sentinel returns.

use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Failure categories reported to callers.
#[derive(Debug, Error)]
pub enum IntentsError {
    /// Unknown token, address, account or route.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-policy request (below minimum, unroutable address...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/RPC failure, missing quote, unsettled intent or polling timeout.
    /// Already retried per the fixed policies; the caller may re-invoke.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Explicit rejection (FAILED / NOT_FOUND settlement, failed transaction status).
    #[error("Terminal failure: {0}")]
    Terminal(String),

    /// Fatal configuration problem, e.g. a private key that is not 64 bytes.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for IntentsError {
    fn from(err: anyhow::Error) -> Self {
        IntentsError::Transient(format!("{:#}", err))
    }
}

pub type IntentsResult<T> = std::result::Result<T, IntentsError>;

// ============================================================================
// POLLING
// ============================================================================

/// Result of one polling step.
#[derive(Debug)]
pub enum Attempt<T> {
    /// Terminal value reached.
    Done(T),
    /// Not there yet; the reason is logged at debug level.
    Retry(String),
    /// Stop polling and propagate.
    Fatal(IntentsError),
}

/// Fixed-interval polling with a wall-clock ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Runs `step` every `policy.interval` until it yields `Done` or `Fatal`.
///
/// # Returns
///
/// * `Ok(Some(value))` - `step` returned `Done(value)`
/// * `Ok(None)` - `policy.timeout` elapsed without a terminal value
/// * `Err(IntentsError)` - `step` returned `Fatal`
pub async fn poll_until<T, F, Fut>(label: &str, policy: PollPolicy, mut step: F) -> IntentsResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let start = Instant::now();
    loop {
        match step().await {
            Attempt::Done(value) => return Ok(Some(value)),
            Attempt::Fatal(err) => return Err(err),
            Attempt::Retry(reason) => debug!("{}: {}", label, reason),
        }

        if start.elapsed() >= policy.timeout {
            debug!("{}: gave up after {:?}", label, policy.timeout);
            return Ok(None);
        }
        tokio::time::sleep(policy.interval).await;
    }
}

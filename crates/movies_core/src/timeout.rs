//! Time limits for stage bootstrap, single queries and whole tests.
//!
//! # Responsibility
//! - Provide duration helpers used by stage suites.
//! - Run a closure on a worker thread and give up waiting after a limit.
//!
//! # Invariants
//! - `run_with_timeout` never blocks the caller longer than `limit`.
//! - A timed-out worker is detached, not killed; per-query interruption is
//!   handled by [`crate::Database::set_query_timeout`].

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Default budget for one stage test, bootstrap included.
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(3 * 60);

pub fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}

pub fn seconds(count: u64) -> Duration {
    Duration::from_secs(count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError {
    /// Worker did not finish within the limit.
    Elapsed { limit: Duration },
    /// Worker panicked before producing a value.
    Panicked,
    /// Worker thread could not be started.
    SpawnFailed(String),
}

impl Display for TimeoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elapsed { limit } => {
                write!(f, "timed out after {} ms", limit.as_millis())
            }
            Self::Panicked => write!(f, "worker panicked before completing"),
            Self::SpawnFailed(message) => write!(f, "failed to spawn worker: {message}"),
        }
    }
}

impl Error for TimeoutError {}

/// Runs `task` on a worker thread and waits at most `limit` for its value.
///
/// # Errors
/// - `Elapsed` when the worker is still running at the deadline.
/// - `Panicked` when the worker unwound without sending a value.
/// - `SpawnFailed` when the OS refuses a new thread.
pub fn run_with_timeout<T, F>(limit: Duration, task: F) -> Result<T, TimeoutError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(1);
    let spawned = thread::Builder::new()
        .name("movies-timeout-worker".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout.
            let _ = sender.send(task());
        });
    if let Err(err) = spawned {
        return Err(TimeoutError::SpawnFailed(err.to_string()));
    }

    match receiver.recv_timeout(limit) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                "event=test_timeout module=timeout status=elapsed limit_ms={}",
                limit.as_millis()
            );
            Err(TimeoutError::Elapsed { limit })
        }
        Err(RecvTimeoutError::Disconnected) => Err(TimeoutError::Panicked),
    }
}

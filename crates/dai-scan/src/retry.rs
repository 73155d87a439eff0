//! Bounded retry for transient source errors.

use std::time::Duration;

use tracing::warn;

use crate::error::{ScanError, ScanResult, SourceError};

/// How many times, and how patiently, to retry a failing source read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that never retries and never sleeps.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op`, retrying transient failures.
    ///
    /// Permanent failures and exhausted retries both come back as
    /// [`ScanError::Fatal`].
    pub fn run<T, F>(&self, source_name: &str, mut op: F) -> ScanResult<T>
    where
        F: FnMut() -> Result<T, SourceError>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_transient() {
                return Err(ScanError::Fatal(format!("{source_name}: {err}")));
            }
            let transient = ScanError::TransientSource {
                source_name: source_name.to_string(),
                attempt,
                message: err.to_string(),
            };
            if attempt > self.max_retries {
                return Err(ScanError::Fatal(format!(
                    "retries exhausted: {transient}"
                )));
            }
            warn!(error = %transient, "retrying source read");
            if !self.backoff.is_zero() {
                std::thread::sleep(self.backoff * attempt);
            }
        }
    }
}

//! Retry policy derived from the connector configuration.

use crate::{ConnectorConfiguration, ErrorCodeSet};
use std::time::Duration;

/// Retry decision for failed invocations
///
/// The delay between attempts is fixed: no exponential growth, no jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry attempts after the initial invocation
    max_retries: u32,
    /// Delay before every retry
    backoff: Duration,
    retriable_error_codes: ErrorCodeSet,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration, retriable_error_codes: ErrorCodeSet) -> Self {
        Self {
            max_retries,
            backoff,
            retriable_error_codes,
        }
    }

    pub fn from_config(config: &ConnectorConfiguration) -> Self {
        Self::new(
            config.max_retries(),
            config.retry_backoff(),
            config.retriable_error_codes().clone(),
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the next attempt, the same for every attempt
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn is_retriable(&self, status_code: i32) -> bool {
        self.retriable_error_codes.is_retriable(status_code)
    }

    /// Whether retries remain after `attempt` retries have already been made
    pub fn has_retries_left(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Retry iff attempts remain and `status_code` is transient
    pub fn should_retry(&self, attempt: u32, status_code: i32) -> bool {
        self.has_retries_left(attempt) && self.is_retriable(status_code)
    }
}

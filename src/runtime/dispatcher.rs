//! Dispatcher: records → invocations
//!
//! Formats records with the configured payload formatter, invokes the target
//! through an [`InvocationTransport`], and retries transient failures with the
//! configured fixed backoff.

use crate::invocation::{FailureMode, InvocationClient, InvocationResponse, InvocationTransport};
use crate::retry::RetryPolicy;
use crate::{
    ConnectorConfiguration, ConnectorError, ConnectorMetrics, ConnectorResult, PayloadFormatter,
    SinkRecord,
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Counts for one [`Dispatcher::put`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Invocations that reached a final outcome
    pub invocations: usize,
    pub delivered_records: usize,
    /// Records skipped after a terminal failure in DROP mode
    pub dropped_records: usize,
}

enum Outcome {
    Delivered,
    Dropped,
}

/// Dispatches records to the invocation target
///
/// Holds only read-only state, so a single instance can serve concurrent
/// `put` calls.
pub struct Dispatcher<T: InvocationTransport> {
    transport: T,
    connector_name: String,
    client: InvocationClient,
    formatter: Arc<dyn PayloadFormatter>,
    retry_policy: RetryPolicy,
    batching: bool,
    failure_mode: FailureMode,
    metrics: ConnectorMetrics,
}

impl<T: InvocationTransport> Dispatcher<T> {
    pub fn new(config: &ConnectorConfiguration, transport: T) -> Self {
        let client = config.invocation_client();

        info!("Initializing dispatcher");
        info!("Connector: {}", config.connector_name());
        info!("Invocation URL: {}", client.invocation_url());

        let metrics = ConnectorMetrics::new(config.connector_name(), client.function_arn());

        Self {
            transport,
            connector_name: config.connector_name().to_string(),
            client,
            formatter: config.payload_formatter(),
            retry_policy: RetryPolicy::from_config(config),
            batching: config.is_batching_enabled(),
            failure_mode: config.invocation_client_config().failure_mode(),
            metrics,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Deliver `records` in order.
    ///
    /// With batching on all records travel in one invocation, otherwise one
    /// invocation per record. In STOP mode the first terminal failure aborts
    /// the call and later records are not sent.
    pub async fn put(&self, records: &[SinkRecord]) -> ConnectorResult<DispatchSummary> {
        let mut summary = DispatchSummary::default();
        if records.is_empty() {
            return Ok(summary);
        }

        self.metrics.record_received(records.len());
        debug!(
            "{}: dispatching {} record(s), batching={}",
            self.connector_name,
            records.len(),
            self.batching
        );

        if self.batching {
            let payload = self.formatter.format_batch(records)?;
            self.metrics.record_batch_size(records.len());
            let outcome = self.invoke_with_retry(payload, records.len()).await?;
            summary.tally(outcome, records.len());
        } else {
            for record in records {
                let payload = self.formatter.format(record)?;
                let outcome = self.invoke_with_retry(payload, 1).await?;
                summary.tally(outcome, 1);
            }
        }

        Ok(summary)
    }

    /// Invoke once, then retry transient failures after a fixed delay
    async fn invoke_with_retry(
        &self,
        payload: Vec<u8>,
        record_count: usize,
    ) -> ConnectorResult<Outcome> {
        let start = Instant::now();
        let mut attempt = 0;

        let result = loop {
            let result = self.send(payload.clone()).await;

            if matches!(&result, Ok(response) if response.is_success()) {
                self.metrics.record_invocation_time(start.elapsed());
                self.metrics.record_success();
                return Ok(Outcome::Delivered);
            }

            let Some(reason) = self.retry_reason(attempt, &result) else {
                break result;
            };

            attempt += 1;
            self.metrics.record_retry();
            let backoff = self.retry_policy.backoff();
            warn!(
                "Retry attempt {} of {} after {:?} - {}",
                attempt,
                self.retry_policy.max_retries(),
                backoff,
                reason
            );
            tokio::time::sleep(backoff).await;
        };

        self.metrics.record_invocation_time(start.elapsed());
        self.handle_failure(result, attempt + 1, record_count)
    }

    /// Why a failed attempt should be retried, or `None` when it is terminal
    fn retry_reason(
        &self,
        attempt: u32,
        result: &ConnectorResult<InvocationResponse>,
    ) -> Option<String> {
        match result {
            // A function error is the function's own failure, never transient
            Ok(response) if response.function_error.is_some() => None,
            Ok(response) if self.retry_policy.should_retry(attempt, response.status_code) => {
                Some(format!("status {}", response.status_code))
            }
            Err(e) if e.is_retryable() && self.retry_policy.has_retries_left(attempt) => {
                Some(e.to_string())
            }
            _ => None,
        }
    }

    fn handle_failure(
        &self,
        result: ConnectorResult<InvocationResponse>,
        attempts: u32,
        record_count: usize,
    ) -> ConnectorResult<Outcome> {
        let (error_type, detail) = match &result {
            Ok(response) => match &response.function_error {
                Some(function_error) => (
                    "function_error".to_string(),
                    format!(
                        "function error '{}' (status {})",
                        function_error, response.status_code
                    ),
                ),
                None => (
                    format!("status_{}", response.status_code),
                    format!("status {}", response.status_code),
                ),
            },
            Err(e) => ("transport".to_string(), e.to_string()),
        };
        self.metrics.record_error(&error_type);

        let message = format!(
            "Invocation of {} failed after {} attempt(s): {}",
            self.client.function_arn(),
            attempts,
            detail
        );

        match self.failure_mode {
            FailureMode::Stop => {
                error!("{}", message);
                match result {
                    Err(e) => Err(ConnectorError::fatal_with_source(message, e)),
                    Ok(_) => Err(ConnectorError::fatal(message)),
                }
            }
            FailureMode::Drop => {
                warn!("{} - dropping {} record(s)", message, record_count);
                self.metrics.record_dropped(record_count);
                Ok(Outcome::Dropped)
            }
        }
    }

    /// One attempt, bounded by the invocation timeout (zero disables it)
    async fn send(&self, payload: Vec<u8>) -> ConnectorResult<InvocationResponse> {
        let request = self.client.request(payload);
        let timeout = request.timeout;
        if timeout.is_zero() {
            return self.transport.send(request).await;
        }

        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::retryable(format!(
                "Invocation timed out after {:?}",
                timeout
            ))),
        }
    }
}

impl DispatchSummary {
    fn tally(&mut self, outcome: Outcome, records: usize) {
        self.invocations += 1;
        match outcome {
            Outcome::Delivered => self.delivered_records += records,
            Outcome::Dropped => self.dropped_records += records,
        }
    }
}

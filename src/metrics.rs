//! Metrics for the dispatcher.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metrics collector labelled with connector and function
#[derive(Debug, Clone)]
pub struct ConnectorMetrics {
    /// Connector name for labeling
    connector_name: String,
    /// Invoked function for labeling
    function: String,
}

impl ConnectorMetrics {
    /// Create a new metrics collector
    pub fn new(connector_name: impl Into<String>, function: impl Into<String>) -> Self {
        Self::register_metrics();

        Self {
            connector_name: connector_name.into(),
            function: function.into(),
        }
    }

    fn register_metrics() {
        describe_counter!(
            "lambda_sink_records_received_total",
            "Total number of records handed to the dispatcher"
        );
        describe_counter!(
            "lambda_sink_invocations_total",
            "Total number of successful invocations"
        );
        describe_counter!(
            "lambda_sink_invocations_failed_total",
            "Total number of invocations that failed for good"
        );
        describe_counter!(
            "lambda_sink_invocation_retries_total",
            "Total number of invocation retries"
        );
        describe_counter!(
            "lambda_sink_records_dropped_total",
            "Total number of records dropped after a terminal failure"
        );

        describe_histogram!(
            "lambda_sink_invocation_duration_seconds",
            "Time spent on one invocation, retries included"
        );
        describe_histogram!(
            "lambda_sink_batch_size",
            "Number of records in each batched invocation"
        );
    }

    pub fn record_received(&self, count: usize) {
        counter!(
            "lambda_sink_records_received_total",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
        )
        .increment(count as u64);
    }

    pub fn record_success(&self) {
        counter!(
            "lambda_sink_invocations_total",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
        )
        .increment(1);
    }

    /// Record a terminal invocation failure
    pub fn record_error(&self, error_type: &str) {
        counter!(
            "lambda_sink_invocations_failed_total",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
            "error_type" => error_type.to_string(),
        )
        .increment(1);
    }

    pub fn record_retry(&self) {
        counter!(
            "lambda_sink_invocation_retries_total",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
        )
        .increment(1);
    }

    pub fn record_dropped(&self, count: usize) {
        counter!(
            "lambda_sink_records_dropped_total",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
        )
        .increment(count as u64);
    }

    pub fn record_invocation_time(&self, duration: Duration) {
        histogram!(
            "lambda_sink_invocation_duration_seconds",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
        )
        .record(duration.as_secs_f64());
    }

    pub fn record_batch_size(&self, size: usize) {
        histogram!(
            "lambda_sink_batch_size",
            "connector" => self.connector_name.clone(),
            "function" => self.function.clone(),
        )
        .record(size as f64);
    }
}

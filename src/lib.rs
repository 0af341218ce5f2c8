//! # Lambda Sink Connect
//!
//! Configuration resolution and retry policy for a sink connector that
//! forwards each consumed record, or each batch of records, to a remote
//! function.
//!
//! The host hands over its raw string settings once, at task start:
//!
//! ```rust,no_run
//! use lambda_sink_connect::ConnectorConfiguration;
//! use std::collections::HashMap;
//!
//! let mut props = HashMap::new();
//! props.insert(
//!     "aws.lambda.function.arn".to_string(),
//!     "arn:aws:lambda:us-east-1:123456789012:function:sink".to_string(),
//! );
//! props.insert("retries.max".to_string(), "3".to_string());
//!
//! let config = ConnectorConfiguration::from_props(&props)?;
//! assert!(config.is_retriable(503));
//! assert!(!config.is_retriable(502));
//! # Ok::<(), lambda_sink_connect::ConfigError>(())
//! ```
//!
//! ## Features
//!
//! - **Fail-fast validation**: malformed values abort construction with a
//!   [`ConfigError`] naming the key and value; only missing keys get defaults
//! - **Retry policy**: retry count, fixed backoff and the retriable status codes
//! - **Local development**: route every invocation to a Localstack endpoint
//! - **Payload formatting**: plain or JSON payloads, single or batched
//! - **Reference dispatcher**: [`Dispatcher`] drives an [`InvocationTransport`]
//!   with the resolved policy

pub mod config;
mod error;
pub mod formatter;
pub mod invocation;
mod message;
mod metrics;
mod retry;
mod runtime;

// Re-export public API
pub use config::{ConnectorConfiguration, EntropySource, ErrorCodeSet, ThreadRngEntropy};
pub use error::{ConfigError, ConfigResult, ConnectorError, ConnectorResult};
pub use formatter::{PayloadFormatter, PayloadFormatterConfig};
pub use invocation::{
    FailureMode, InvocationClient, InvocationClientConfig, InvocationMode, InvocationRequest,
    InvocationResponse, InvocationTransport, LocalstackOverride,
};
pub use message::SinkRecord;
pub use self::metrics::ConnectorMetrics;
pub use retry::RetryPolicy;
pub use runtime::{init_tracing, DispatchSummary, Dispatcher};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Reference dispatch pipeline.
//!
//! The [`Dispatcher`] shows how the resolved configuration is consumed:
//! - batched or per-record invocations
//! - fixed-delay retries gated by the retriable status codes
//! - STOP / DROP handling of terminal failures
//!
//! The wire itself is behind [`InvocationTransport`](crate::InvocationTransport).

mod dispatcher;

pub use dispatcher::{DispatchSummary, Dispatcher};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used. Calling it
/// more than once is harmless.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok(); // Ignore if already initialized
}

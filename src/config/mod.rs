//! Connector configuration resolution.
//!
//! [`ConnectorConfiguration`] turns the raw string map supplied by the host
//! into an immutable, validated value. Construction is all-or-nothing: any
//! malformed value fails with a [`ConfigError`] naming the key and value, and
//! only *missing* keys fall back to defaults.

pub mod def;
mod error_codes;
mod file;
mod naming;

pub use error_codes::ErrorCodeSet;
pub use naming::{generate_connector_name, EntropySource, ThreadRngEntropy, NAME_SUFFIX_DIGITS};

use crate::formatter::PayloadFormatterConfig;
use crate::invocation::{InvocationClient, InvocationClientConfig, LocalstackOverride};
use crate::{ConfigError, ConfigResult, PayloadFormatter};
use def::{ConfigDef, ConfigType, DefaultValue, Importance, Range};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Prefix of generated connector names
pub const CONNECTOR_NAME_PREFIX: &str = "LambdaSinkConnector";

pub const CONNECTOR_NAME_KEY: &str = "name";
const CONNECTOR_NAME_DOC: &str = "DEPRECATED Connector name used in logs";

pub const BATCH_RECORDS_ENABLED_KEY: &str = "aws.lambda.batch.enabled";
const BATCH_RECORDS_ENABLED_DOC: &str =
    "Determines whether to send individual records, or an array of records, when invoking the function";
const BATCH_RECORDS_ENABLED_DEFAULT: &str = "true";

pub const RETRIES_MAX_KEY: &str = "retries.max";
const RETRIES_MAX_DOC: &str = "Max number of times to retry the invocation";
const RETRIES_MAX_DEFAULT: &str = "5";

pub const RETRY_BACKOFF_MILLIS_KEY: &str = "retry.backoff.millis";
const RETRY_BACKOFF_MILLIS_DOC: &str = "The amount of time to wait between invocation retry attempts";
const RETRY_BACKOFF_MILLIS_DEFAULT: &str = "500";

pub const RETRIABLE_ERROR_CODES_KEY: &str = "retriable.error.codes";
const RETRIABLE_ERROR_CODES_DOC: &str =
    "A comma-separated list with the status codes which cause an invocation retry";
const RETRIABLE_ERROR_CODES_DEFAULT: &str = "500,503,504";

pub const LOCALSTACK_ENABLED_KEY: &str = "localstack.enabled";
const LOCALSTACK_ENABLED_DOC: &str = "Determines whether to use Localstack for development on localhost";
const LOCALSTACK_ENABLED_DEFAULT: &str = "false";

pub const ENDPOINT_URL_LOCALSTACK_KEY: &str = "endpoint.url.localstack";
const ENDPOINT_URL_LOCALSTACK_DOC: &str = "Determines the endpoint URL for Localstack";
const ENDPOINT_URL_LOCALSTACK_DEFAULT: &str = "http://localhost:4566";

/// Validated connector configuration
///
/// Built once when the task starts and shared read-only by every dispatch
/// worker. No accessor can fail.
#[derive(Debug, Clone)]
pub struct ConnectorConfiguration {
    connector_name: String,
    batching_enabled: bool,
    max_retries: u32,
    retry_backoff_millis: u64,
    retriable_error_codes: ErrorCodeSet,
    localstack_enabled: bool,
    localstack_endpoint_url: String,
    invocation_client_config: InvocationClientConfig,
    payload_formatter_config: PayloadFormatterConfig,
}

impl ConnectorConfiguration {
    /// Full option schema, including the sub-configurations' keys
    pub fn config_def() -> ConfigDef {
        let def = ConfigDef::new()
            .define(
                CONNECTOR_NAME_KEY,
                ConfigType::String,
                DefaultValue::Null,
                Importance::Low,
                CONNECTOR_NAME_DOC,
            )
            .define(
                BATCH_RECORDS_ENABLED_KEY,
                ConfigType::Boolean,
                DefaultValue::Value(BATCH_RECORDS_ENABLED_DEFAULT),
                Importance::Medium,
                BATCH_RECORDS_ENABLED_DOC,
            )
            .define_with_range(
                RETRIES_MAX_KEY,
                ConfigType::Int,
                DefaultValue::Value(RETRIES_MAX_DEFAULT),
                Range::at_least(0),
                Importance::Low,
                RETRIES_MAX_DOC,
            )
            .define_with_range(
                RETRY_BACKOFF_MILLIS_KEY,
                ConfigType::Int,
                DefaultValue::Value(RETRY_BACKOFF_MILLIS_DEFAULT),
                Range::at_least(0),
                Importance::Low,
                RETRY_BACKOFF_MILLIS_DOC,
            )
            .define(
                RETRIABLE_ERROR_CODES_KEY,
                ConfigType::List,
                DefaultValue::Value(RETRIABLE_ERROR_CODES_DEFAULT),
                Importance::Low,
                RETRIABLE_ERROR_CODES_DOC,
            )
            .define(
                ENDPOINT_URL_LOCALSTACK_KEY,
                ConfigType::String,
                DefaultValue::Value(ENDPOINT_URL_LOCALSTACK_DEFAULT),
                Importance::Low,
                ENDPOINT_URL_LOCALSTACK_DOC,
            )
            .define(
                LOCALSTACK_ENABLED_KEY,
                ConfigType::Boolean,
                DefaultValue::Value(LOCALSTACK_ENABLED_DEFAULT),
                Importance::Low,
                LOCALSTACK_ENABLED_DOC,
            );

        let def = InvocationClientConfig::config_def(def);
        PayloadFormatterConfig::config_def(def)
    }

    /// Resolve from the raw map, generating a name from the thread RNG if needed
    pub fn from_props(props: &HashMap<String, String>) -> ConfigResult<Self> {
        Self::from_props_with_entropy(props, &ThreadRngEntropy)
    }

    /// Resolve from the raw map with an explicit entropy source for the
    /// generated connector name
    pub fn from_props_with_entropy(
        props: &HashMap<String, String>,
        entropy: &dyn EntropySource,
    ) -> ConfigResult<Self> {
        let parsed = Self::config_def().parse(props)?;

        let connector_name = match parsed.get_optional_string(CONNECTOR_NAME_KEY)? {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                let generated = generate_connector_name(CONNECTOR_NAME_PREFIX, entropy);
                debug!("No connector name supplied, using {}", generated);
                generated
            }
        };

        let raw_codes = parsed.get_list(RETRIABLE_ERROR_CODES_KEY)?;
        let retriable_error_codes =
            ErrorCodeSet::parse(RETRIABLE_ERROR_CODES_KEY, raw_codes.as_slice())?;

        let localstack_enabled = parsed.get_bool(LOCALSTACK_ENABLED_KEY)?;
        let localstack_endpoint_url = parsed.get_string(ENDPOINT_URL_LOCALSTACK_KEY)?;

        let localstack = localstack_enabled
            .then(|| LocalstackOverride::new(localstack_endpoint_url.clone()));
        let invocation_client_config = InvocationClientConfig::from_parsed(&parsed, localstack)?;
        let payload_formatter_config = PayloadFormatterConfig::from_parsed(&parsed)?;

        // Range checks in the schema guarantee both are non-negative
        let max_retries = non_negative(RETRIES_MAX_KEY, parsed.get_int(RETRIES_MAX_KEY)?)?;
        let retry_backoff_millis = u64::from(non_negative(
            RETRY_BACKOFF_MILLIS_KEY,
            parsed.get_int(RETRY_BACKOFF_MILLIS_KEY)?,
        )?);

        let config = Self {
            connector_name,
            batching_enabled: parsed.get_bool(BATCH_RECORDS_ENABLED_KEY)?,
            max_retries,
            retry_backoff_millis,
            retriable_error_codes,
            localstack_enabled,
            localstack_endpoint_url,
            invocation_client_config,
            payload_formatter_config,
        };

        info!(
            connector = %config.connector_name,
            batching = config.batching_enabled,
            max_retries = config.max_retries,
            retry_backoff_ms = config.retry_backoff_millis,
            retriable_error_codes = %config.retriable_error_codes,
            endpoint = %config.invocation_client_config.endpoint_url(),
            "Connector configuration resolved"
        );

        Ok(config)
    }

    /// Load the raw map from a TOML file and resolve it
    ///
    /// Nested tables flatten into dotted keys, so `[retries] max = 3` and
    /// `"retries.max" = 3` are equivalent.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let props = file::load_props(path.as_ref())?;
        Self::from_props(&props)
    }

    pub fn connector_name(&self) -> &str {
        &self.connector_name
    }

    /// True when records are delivered as one array payload per invocation
    pub fn is_batching_enabled(&self) -> bool {
        self.batching_enabled
    }

    /// Retry attempts after the initial invocation
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_backoff_millis(&self) -> u64 {
        self.retry_backoff_millis
    }

    /// Fixed delay between retry attempts
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_millis)
    }

    pub fn retriable_error_codes(&self) -> &ErrorCodeSet {
        &self.retriable_error_codes
    }

    pub fn is_retriable(&self, status_code: i32) -> bool {
        self.retriable_error_codes.is_retriable(status_code)
    }

    pub fn is_localstack_enabled(&self) -> bool {
        self.localstack_enabled
    }

    pub fn localstack_endpoint_url(&self) -> &str {
        &self.localstack_endpoint_url
    }

    pub fn invocation_client_config(&self) -> &InvocationClientConfig {
        &self.invocation_client_config
    }

    pub fn invocation_client(&self) -> InvocationClient {
        self.invocation_client_config.invocation_client()
    }

    pub fn payload_formatter_config(&self) -> &PayloadFormatterConfig {
        &self.payload_formatter_config
    }

    pub fn payload_formatter(&self) -> Arc<dyn PayloadFormatter> {
        self.payload_formatter_config.payload_formatter()
    }
}

fn non_negative(key: &str, value: i32) -> ConfigResult<u32> {
    u32::try_from(value)
        .map_err(|_| ConfigError::invalid(key, value.to_string(), "Value must be at least 0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::FailureMode;
    use std::sync::atomic::{AtomicU8, Ordering};

    const ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:sink";

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry("aws.lambda.function.arn".to_string())
            .or_insert_with(|| ARN.to_string());
        map
    }

    struct Counting(AtomicU8);

    impl EntropySource for Counting {
        fn next_digit(&self) -> u8 {
            self.0.fetch_add(1, Ordering::Relaxed) % 10
        }
    }

    #[test]
    fn test_config_default() {
        let config = ConnectorConfiguration::from_props(&props(&[])).unwrap();
        assert!(config.is_batching_enabled());
        assert_eq!(config.max_retries(), 5);
        assert_eq!(config.retry_backoff_millis(), 500);
        assert_eq!(config.retry_backoff(), Duration::from_millis(500));
        assert_eq!(config.retriable_error_codes().to_string(), "500,503,504");
        assert!(!config.is_localstack_enabled());
        assert_eq!(config.localstack_endpoint_url(), "http://localhost:4566");
        assert_eq!(
            config.invocation_client_config().endpoint_url(),
            "https://lambda.us-east-1.amazonaws.com"
        );
        assert_eq!(config.payload_formatter().name(), "plain");
        assert_eq!(
            config.invocation_client_config().failure_mode(),
            FailureMode::Stop
        );
    }

    #[test]
    fn test_generated_name_with_injected_entropy() {
        let config = ConnectorConfiguration::from_props_with_entropy(
            &props(&[]),
            &Counting(AtomicU8::new(1)),
        )
        .unwrap();
        assert_eq!(config.connector_name(), "LambdaSinkConnector-Unnamed-1234");
    }

    #[test]
    fn test_blank_name_is_generated() {
        let config = ConnectorConfiguration::from_props_with_entropy(
            &props(&[("name", "  ")]),
            &Counting(AtomicU8::new(0)),
        )
        .unwrap();
        assert_eq!(config.connector_name(), "LambdaSinkConnector-Unnamed-0123");
    }

    #[test]
    fn test_explicit_name_kept() {
        let config =
            ConnectorConfiguration::from_props(&props(&[("name", "orders-sink")])).unwrap();
        assert_eq!(config.connector_name(), "orders-sink");
    }

    #[test]
    fn test_localstack_overrides_endpoint() {
        let config = ConnectorConfiguration::from_props(&props(&[
            ("localstack.enabled", "true"),
            ("endpoint.url.localstack", "http://host:1234"),
            ("aws.lambda.endpoint.url", "https://lambda.internal"),
        ]))
        .unwrap();
        assert!(config.is_localstack_enabled());
        assert_eq!(
            config.invocation_client_config().endpoint_url(),
            "http://host:1234"
        );
        assert!(config.invocation_client_config().is_localstack());
        assert_eq!(config.invocation_client().endpoint_url(), "http://host:1234");
    }

    #[test]
    fn test_padded_localstack_values_trimmed() {
        let config = ConnectorConfiguration::from_props(&props(&[
            ("localstack.enabled", "true"),
            ("endpoint.url.localstack", " http://host:1234 "),
            ("aws.lambda.function.arn", " arn:aws:lambda:us-east-1:1:function:f "),
            ("name", " orders-sink "),
        ]))
        .unwrap();

        assert_eq!(config.connector_name(), "orders-sink");
        assert_eq!(config.localstack_endpoint_url(), "http://host:1234");
        assert_eq!(
            config.invocation_client().invocation_url(),
            "http://host:1234/2015-03-31/functions/arn:aws:lambda:us-east-1:1:function:f/invocations"
        );
    }

    #[test]
    fn test_full_map_has_no_unknown_keys() {
        let raw = props(&[
            ("name", "orders-sink"),
            ("retries.max", "3"),
            ("localstack.enabled", "false"),
            ("aws.region", "eu-west-1"),
            ("aws.lambda.invocation.mode", "ASYNC"),
            ("payload.formatter", "json"),
        ]);
        assert!(ConnectorConfiguration::config_def()
            .unknown_keys(&raw)
            .is_empty());
    }

    #[test]
    fn test_localstack_url_ignored_when_disabled() {
        let config = ConnectorConfiguration::from_props(&props(&[(
            "endpoint.url.localstack",
            "http://host:1234",
        )]))
        .unwrap();
        assert_eq!(config.localstack_endpoint_url(), "http://host:1234");
        assert_eq!(
            config.invocation_client_config().endpoint_url(),
            "https://lambda.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_bad_error_codes_fail() {
        let err =
            ConnectorConfiguration::from_props(&props(&[("retriable.error.codes", "500,oops")]))
                .unwrap_err();
        assert_eq!(err.key(), Some(RETRIABLE_ERROR_CODES_KEY));
        assert!(err.to_string().contains("500,oops"));
    }

    #[test]
    fn test_sub_config_error_propagates_unchanged() {
        let err = ConnectorConfiguration::from_props(&props(&[("payload.formatter", "xml")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::invalid("payload.formatter", "xml", "Expected one of: plain, json")
        );
    }

    #[test]
    fn test_config_def_covers_all_keys() {
        let def = ConnectorConfiguration::config_def();
        for key in [
            CONNECTOR_NAME_KEY,
            BATCH_RECORDS_ENABLED_KEY,
            RETRIES_MAX_KEY,
            RETRY_BACKOFF_MILLIS_KEY,
            RETRIABLE_ERROR_CODES_KEY,
            LOCALSTACK_ENABLED_KEY,
            ENDPOINT_URL_LOCALSTACK_KEY,
            "aws.lambda.function.arn",
            "payload.formatter",
        ] {
            assert!(def.key(key).is_some(), "missing definition for {}", key);
        }
    }
}

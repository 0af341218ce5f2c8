//! Invocation target addressing.
//!
//! [`InvocationClientConfig`] resolves where and how the remote function is
//! invoked. The resulting [`InvocationClient`] builds [`InvocationRequest`]s;
//! putting them on the wire is the job of an [`InvocationTransport`]
//! implemented by the embedding host.

use crate::config::def::{ConfigDef, ConfigType, DefaultValue, Importance, ParsedConfig, Range};
use crate::{ConfigError, ConfigResult, ConnectorResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub(crate) const FUNCTION_ARN_KEY: &str = "aws.lambda.function.arn";
const FUNCTION_ARN_DOC: &str = "Full ARN of the function to invoke";

pub(crate) const REGION_KEY: &str = "aws.region";
const REGION_DOC: &str = "Region used to derive the production invocation endpoint";
const REGION_DEFAULT: &str = "us-east-1";

pub(crate) const ENDPOINT_URL_KEY: &str = "aws.lambda.endpoint.url";
const ENDPOINT_URL_DOC: &str = "Explicit production invocation endpoint; derived from the region when unset";

pub(crate) const INVOCATION_MODE_KEY: &str = "aws.lambda.invocation.mode";
const INVOCATION_MODE_DOC: &str =
    "SYNC waits for the function result (RequestResponse), ASYNC queues the event (Event)";
const INVOCATION_MODE_DEFAULT: &str = "SYNC";

pub(crate) const INVOCATION_TIMEOUT_KEY: &str = "aws.lambda.invocation.timeout.ms";
const INVOCATION_TIMEOUT_DOC: &str = "Time to wait for a single invocation to complete";
const INVOCATION_TIMEOUT_DEFAULT: &str = "300000";

pub(crate) const FAILURE_MODE_KEY: &str = "aws.lambda.invocation.failure.mode";
const FAILURE_MODE_DOC: &str =
    "STOP aborts the task on a terminal invocation failure, DROP logs the failure and continues";
const FAILURE_MODE_DEFAULT: &str = "STOP";

pub(crate) const CREDENTIALS_PROFILE_KEY: &str = "aws.credentials.profile";
const CREDENTIALS_PROFILE_DOC: &str = "Named credentials profile used by the transport";

/// Header carrying the invocation type
pub const INVOCATION_TYPE_HEADER: &str = "X-Amz-Invocation-Type";

/// Whether the caller waits for the function result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Sync,
    Async,
}

impl InvocationMode {
    /// Value of the invocation-type header
    pub fn invocation_type(&self) -> &'static str {
        match self {
            InvocationMode::Sync => "RequestResponse",
            InvocationMode::Async => "Event",
        }
    }
}

impl FromStr for InvocationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SYNC" => Ok(InvocationMode::Sync),
            "ASYNC" => Ok(InvocationMode::Async),
            _ => Err(()),
        }
    }
}

/// What the dispatcher does once an invocation has failed for good
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Stop,
    Drop,
}

impl FromStr for FailureMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STOP" => Ok(FailureMode::Stop),
            "DROP" => Ok(FailureMode::Drop),
            _ => Err(()),
        }
    }
}

/// Local development endpoint that replaces the production one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalstackOverride {
    pub endpoint_url: String,
}

impl LocalstackOverride {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
        }
    }
}

/// Resolved settings for contacting the invocation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationClientConfig {
    function_arn: String,
    region: String,
    endpoint_url: String,
    localstack: bool,
    invocation_mode: InvocationMode,
    invocation_timeout: Duration,
    failure_mode: FailureMode,
    credentials_profile: Option<String>,
}

impl InvocationClientConfig {
    /// Append this component's options to `def`
    pub fn config_def(def: ConfigDef) -> ConfigDef {
        def.define(
            FUNCTION_ARN_KEY,
            ConfigType::String,
            DefaultValue::Required,
            Importance::High,
            FUNCTION_ARN_DOC,
        )
        .define(
            REGION_KEY,
            ConfigType::String,
            DefaultValue::Value(REGION_DEFAULT),
            Importance::Medium,
            REGION_DOC,
        )
        .define(
            ENDPOINT_URL_KEY,
            ConfigType::String,
            DefaultValue::Null,
            Importance::Low,
            ENDPOINT_URL_DOC,
        )
        .define(
            INVOCATION_MODE_KEY,
            ConfigType::String,
            DefaultValue::Value(INVOCATION_MODE_DEFAULT),
            Importance::Medium,
            INVOCATION_MODE_DOC,
        )
        .define_with_range(
            INVOCATION_TIMEOUT_KEY,
            ConfigType::Long,
            DefaultValue::Value(INVOCATION_TIMEOUT_DEFAULT),
            Range::at_least(0),
            Importance::Low,
            INVOCATION_TIMEOUT_DOC,
        )
        .define(
            FAILURE_MODE_KEY,
            ConfigType::String,
            DefaultValue::Value(FAILURE_MODE_DEFAULT),
            Importance::Medium,
            FAILURE_MODE_DOC,
        )
        .define(
            CREDENTIALS_PROFILE_KEY,
            ConfigType::String,
            DefaultValue::Null,
            Importance::Low,
            CREDENTIALS_PROFILE_DOC,
        )
    }

    /// Resolve from the raw map.
    ///
    /// When `localstack` is present its endpoint replaces whatever production
    /// endpoint the map would otherwise yield.
    pub fn from_props(
        props: &HashMap<String, String>,
        localstack: Option<LocalstackOverride>,
    ) -> ConfigResult<Self> {
        let parsed = Self::config_def(ConfigDef::new()).parse(props)?;
        Self::from_parsed(&parsed, localstack)
    }

    /// Resolve from values already checked against a schema that includes
    /// [`InvocationClientConfig::config_def`]
    pub fn from_parsed(
        parsed: &ParsedConfig,
        localstack: Option<LocalstackOverride>,
    ) -> ConfigResult<Self> {
        let function_arn = parsed.get_string(FUNCTION_ARN_KEY)?;
        if function_arn.trim().is_empty() {
            return Err(ConfigError::invalid(
                FUNCTION_ARN_KEY,
                function_arn,
                "Function ARN cannot be empty",
            ));
        }

        let region = parsed.get_string(REGION_KEY)?;

        let mode_raw = parsed.get_string(INVOCATION_MODE_KEY)?;
        let invocation_mode = mode_raw.parse::<InvocationMode>().map_err(|_| {
            ConfigError::invalid(INVOCATION_MODE_KEY, mode_raw.as_str(), "Expected SYNC or ASYNC")
        })?;

        let failure_raw = parsed.get_string(FAILURE_MODE_KEY)?;
        let failure_mode = failure_raw.parse::<FailureMode>().map_err(|_| {
            ConfigError::invalid(FAILURE_MODE_KEY, failure_raw.as_str(), "Expected STOP or DROP")
        })?;

        // Range check above guarantees non-negative
        let timeout_ms = parsed.get_long(INVOCATION_TIMEOUT_KEY)?;
        let invocation_timeout = Duration::from_millis(timeout_ms.unsigned_abs());

        let (endpoint_url, localstack) = match localstack {
            Some(local) => (local.endpoint_url, true),
            None => match parsed.get_optional_string(ENDPOINT_URL_KEY)? {
                Some(url) => (url, false),
                None => (format!("https://lambda.{}.amazonaws.com", region), false),
            },
        };

        Ok(Self {
            function_arn,
            region,
            endpoint_url,
            localstack,
            invocation_mode,
            invocation_timeout,
            failure_mode,
            credentials_profile: parsed.get_optional_string(CREDENTIALS_PROFILE_KEY)?,
        })
    }

    pub fn function_arn(&self) -> &str {
        &self.function_arn
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Endpoint every invocation is sent to
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// True when the endpoint is a local development override
    pub fn is_localstack(&self) -> bool {
        self.localstack
    }

    pub fn invocation_mode(&self) -> InvocationMode {
        self.invocation_mode
    }

    pub fn invocation_timeout(&self) -> Duration {
        self.invocation_timeout
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    pub fn credentials_profile(&self) -> Option<&str> {
        self.credentials_profile.as_deref()
    }

    /// A client handle bound to the resolved endpoint and function
    pub fn invocation_client(&self) -> InvocationClient {
        InvocationClient {
            endpoint_url: self.endpoint_url.trim_end_matches('/').to_string(),
            function_arn: self.function_arn.clone(),
            invocation_mode: self.invocation_mode,
            timeout: self.invocation_timeout,
        }
    }
}

/// Ready-to-use handle for invoking the configured function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationClient {
    endpoint_url: String,
    function_arn: String,
    invocation_mode: InvocationMode,
    timeout: Duration,
}

impl InvocationClient {
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn function_arn(&self) -> &str {
        &self.function_arn
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `<endpoint>/2015-03-31/functions/<arn>/invocations`
    pub fn invocation_url(&self) -> String {
        format!(
            "{}/2015-03-31/functions/{}/invocations",
            self.endpoint_url, self.function_arn
        )
    }

    /// Build the request for one invocation carrying `payload`
    pub fn request(&self, payload: Vec<u8>) -> InvocationRequest {
        InvocationRequest {
            url: self.invocation_url(),
            invocation_type: self.invocation_mode.invocation_type(),
            timeout: self.timeout,
            payload,
        }
    }
}

/// A single invocation, ready to be sent by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub url: String,
    /// Value for [`INVOCATION_TYPE_HEADER`]
    pub invocation_type: &'static str,
    pub timeout: Duration,
    pub payload: Vec<u8>,
}

/// Outcome reported by the invocation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status_code: i32,
    /// Set when the function itself raised an error
    pub function_error: Option<String>,
    pub payload: Vec<u8>,
}

impl InvocationResponse {
    pub fn new(status_code: i32) -> Self {
        Self {
            status_code,
            function_error: None,
            payload: Vec::new(),
        }
    }

    pub fn with_function_error(mut self, error: impl Into<String>) -> Self {
        self.function_error = Some(error.into());
        self
    }

    /// 2xx and no function error
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code) && self.function_error.is_none()
    }
}

/// Sends invocation requests over the wire
///
/// Implemented by the embedding host. Transient transport failures should be
/// reported as [`ConnectorError::Retryable`](crate::ConnectorError::Retryable).
#[async_trait]
pub trait InvocationTransport: Send + Sync {
    async fn send(&self, request: InvocationRequest) -> ConnectorResult<InvocationResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:lambda:us-west-2:123456789012:function:sink";

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry(FUNCTION_ARN_KEY.to_string())
            .or_insert_with(|| ARN.to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = InvocationClientConfig::from_props(&props(&[]), None).unwrap();
        assert_eq!(config.function_arn(), ARN);
        assert_eq!(config.region(), "us-east-1");
        assert_eq!(config.endpoint_url(), "https://lambda.us-east-1.amazonaws.com");
        assert!(!config.is_localstack());
        assert_eq!(config.invocation_mode(), InvocationMode::Sync);
        assert_eq!(config.invocation_timeout(), Duration::from_secs(300));
        assert_eq!(config.failure_mode(), FailureMode::Stop);
        assert_eq!(config.credentials_profile(), None);
    }

    #[test]
    fn test_missing_arn() {
        let err = InvocationClientConfig::from_props(&HashMap::new(), None).unwrap_err();
        assert_eq!(err, ConfigError::missing(FUNCTION_ARN_KEY));

        let err = InvocationClientConfig::from_props(&props(&[(FUNCTION_ARN_KEY, " ")]), None)
            .unwrap_err();
        assert_eq!(err.key(), Some(FUNCTION_ARN_KEY));
    }

    #[test]
    fn test_endpoint_precedence() {
        let regional =
            InvocationClientConfig::from_props(&props(&[(REGION_KEY, "eu-west-1")]), None).unwrap();
        assert_eq!(
            regional.endpoint_url(),
            "https://lambda.eu-west-1.amazonaws.com"
        );

        let explicit = props(&[(ENDPOINT_URL_KEY, "https://lambda.internal")]);
        let config = InvocationClientConfig::from_props(&explicit, None).unwrap();
        assert_eq!(config.endpoint_url(), "https://lambda.internal");

        let config = InvocationClientConfig::from_props(
            &explicit,
            Some(LocalstackOverride::new("http://host:1234")),
        )
        .unwrap();
        assert_eq!(config.endpoint_url(), "http://host:1234");
        assert!(config.is_localstack());
    }

    #[test]
    fn test_modes_parse() {
        let config = InvocationClientConfig::from_props(
            &props(&[(INVOCATION_MODE_KEY, "async"), (FAILURE_MODE_KEY, "Drop")]),
            None,
        )
        .unwrap();
        assert_eq!(config.invocation_mode(), InvocationMode::Async);
        assert_eq!(config.failure_mode(), FailureMode::Drop);

        let err =
            InvocationClientConfig::from_props(&props(&[(INVOCATION_MODE_KEY, "later")]), None)
                .unwrap_err();
        assert_eq!(err.key(), Some(INVOCATION_MODE_KEY));

        let err =
            InvocationClientConfig::from_props(&props(&[(FAILURE_MODE_KEY, "retry")]), None)
                .unwrap_err();
        assert_eq!(err.key(), Some(FAILURE_MODE_KEY));
    }

    #[test]
    fn test_padded_values_trimmed() {
        let config = InvocationClientConfig::from_props(
            &props(&[
                (FUNCTION_ARN_KEY, "  arn:aws:lambda:us-east-1:1:function:f "),
                (ENDPOINT_URL_KEY, " https://lambda.internal "),
                (REGION_KEY, " eu-west-1 "),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.function_arn(), "arn:aws:lambda:us-east-1:1:function:f");
        assert_eq!(config.region(), "eu-west-1");
        assert_eq!(
            config.invocation_client().invocation_url(),
            "https://lambda.internal/2015-03-31/functions/arn:aws:lambda:us-east-1:1:function:f/invocations"
        );
    }

    #[test]
    fn test_from_parsed_with_wider_schema() {
        let def = InvocationClientConfig::config_def(ConfigDef::new()).define(
            "name",
            ConfigType::String,
            DefaultValue::Null,
            Importance::High,
            "connector name",
        );
        let raw = props(&[("name", "orders-sink"), (REGION_KEY, "eu-west-1")]);
        assert!(def.unknown_keys(&raw).is_empty());

        let parsed = def.parse(&raw).unwrap();
        let config = InvocationClientConfig::from_parsed(&parsed, None).unwrap();
        assert_eq!(config, InvocationClientConfig::from_props(&raw, None).unwrap());
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let err =
            InvocationClientConfig::from_props(&props(&[(INVOCATION_TIMEOUT_KEY, "-5")]), None)
                .unwrap_err();
        assert_eq!(err.key(), Some(INVOCATION_TIMEOUT_KEY));
    }

    #[test]
    fn test_client_request() {
        let config = InvocationClientConfig::from_props(
            &props(&[(INVOCATION_MODE_KEY, "ASYNC"), (INVOCATION_TIMEOUT_KEY, "1500")]),
            Some(LocalstackOverride::new("http://localhost:4566/")),
        )
        .unwrap();
        let client = config.invocation_client();
        let request = client.request(b"[]".to_vec());

        assert_eq!(
            request.url,
            format!("http://localhost:4566/2015-03-31/functions/{}/invocations", ARN)
        );
        assert_eq!(request.invocation_type, "Event");
        assert_eq!(request.timeout, Duration::from_millis(1500));
        assert_eq!(request.payload, b"[]".to_vec());
    }

    #[test]
    fn test_response_success() {
        assert!(InvocationResponse::new(200).is_success());
        assert!(InvocationResponse::new(202).is_success());
        assert!(!InvocationResponse::new(500).is_success());
        assert!(!InvocationResponse::new(200)
            .with_function_error("Unhandled")
            .is_success());
    }
}

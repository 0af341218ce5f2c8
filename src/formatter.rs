//! Payload formatting for outgoing invocations.
//!
//! [`PayloadFormatterConfig`] resolves which [`PayloadFormatter`] encodes
//! records. With batching on the dispatcher calls
//! [`PayloadFormatter::format_batch`] (a JSON array), otherwise
//! [`PayloadFormatter::format`] once per record.

use crate::config::def::{ConfigDef, ConfigType, DefaultValue, Importance, ParsedConfig};
use crate::{ConfigError, ConfigResult, ConnectorResult, SinkRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub(crate) const PAYLOAD_FORMATTER_KEY: &str = "payload.formatter";
const PAYLOAD_FORMATTER_DOC: &str =
    "Encoding of the invocation payload: 'plain' renders key and value as strings, 'json' keeps them structured";
const PAYLOAD_FORMATTER_DEFAULT: &str = "plain";

/// Encodes records into an invocation payload
pub trait PayloadFormatter: Send + Sync + fmt::Debug {
    /// Short name, matching the `payload.formatter` value
    fn name(&self) -> &'static str;

    /// JSON document for a single record
    fn payload(&self, record: &SinkRecord) -> ConnectorResult<Value>;

    /// Bytes for a one-record invocation
    fn format(&self, record: &SinkRecord) -> ConnectorResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.payload(record)?)?)
    }

    /// Bytes for a batched invocation: a JSON array in record order
    fn format_batch(&self, records: &[SinkRecord]) -> ConnectorResult<Vec<u8>> {
        let items = records
            .iter()
            .map(|r| self.payload(r))
            .collect::<ConnectorResult<Vec<_>>>()?;
        Ok(serde_json::to_vec(&items)?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlainPayload<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
    timestamp: Option<i64>,
    key: Option<&'a str>,
    value: Option<String>,
}

/// Renders key and value as strings
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPayloadFormatter;

impl PayloadFormatter for PlainPayloadFormatter {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn payload(&self, record: &SinkRecord) -> ConnectorResult<Value> {
        let value = match record.value() {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        let payload = PlainPayload {
            topic: record.topic(),
            partition: record.partition(),
            offset: record.offset(),
            timestamp: record.timestamp(),
            key: record.key(),
            value,
        };
        Ok(serde_json::to_value(payload)?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonPayload<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
    timestamp: Option<i64>,
    key: Option<Value>,
    value: &'a Value,
    headers: &'a HashMap<String, String>,
}

/// Keeps key and value structured
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadFormatter;

impl PayloadFormatter for JsonPayloadFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn payload(&self, record: &SinkRecord) -> ConnectorResult<Value> {
        // Keys that are not JSON documents are carried as strings
        let key = record.key().map(|k| {
            serde_json::from_str::<Value>(k).unwrap_or_else(|_| Value::String(k.to_string()))
        });
        let payload = JsonPayload {
            topic: record.topic(),
            partition: record.partition(),
            offset: record.offset(),
            timestamp: record.timestamp(),
            key,
            value: record.value(),
            headers: record.attributes(),
        };
        Ok(serde_json::to_value(payload)?)
    }
}

/// Selectable payload encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    Plain,
    Json,
}

impl FromStr for FormatterKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(FormatterKind::Plain),
            "json" => Ok(FormatterKind::Json),
            _ => Err(()),
        }
    }
}

/// Resolved payload-encoding settings
#[derive(Debug, Clone)]
pub struct PayloadFormatterConfig {
    kind: FormatterKind,
    formatter: Arc<dyn PayloadFormatter>,
}

impl PayloadFormatterConfig {
    /// Append this component's options to `def`
    pub fn config_def(def: ConfigDef) -> ConfigDef {
        def.define(
            PAYLOAD_FORMATTER_KEY,
            ConfigType::String,
            DefaultValue::Value(PAYLOAD_FORMATTER_DEFAULT),
            Importance::Low,
            PAYLOAD_FORMATTER_DOC,
        )
    }

    pub fn from_props(props: &HashMap<String, String>) -> ConfigResult<Self> {
        let parsed = Self::config_def(ConfigDef::new()).parse(props)?;
        Self::from_parsed(&parsed)
    }

    /// Resolve from values already checked against a schema that includes
    /// [`PayloadFormatterConfig::config_def`]
    pub fn from_parsed(parsed: &ParsedConfig) -> ConfigResult<Self> {
        let raw = parsed.get_string(PAYLOAD_FORMATTER_KEY)?;
        let kind = raw.parse::<FormatterKind>().map_err(|_| {
            ConfigError::invalid(
                PAYLOAD_FORMATTER_KEY,
                raw.as_str(),
                "Expected one of: plain, json",
            )
        })?;

        let formatter: Arc<dyn PayloadFormatter> = match kind {
            FormatterKind::Plain => Arc::new(PlainPayloadFormatter),
            FormatterKind::Json => Arc::new(JsonPayloadFormatter),
        };

        Ok(Self { kind, formatter })
    }

    pub fn kind(&self) -> FormatterKind {
        self.kind
    }

    /// The selected formatter, shared by every dispatch worker
    pub fn payload_formatter(&self) -> Arc<dyn PayloadFormatter> {
        Arc::clone(&self.formatter)
    }
}

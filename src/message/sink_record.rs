//! SinkRecord - a consumed record on its way to the invocation target

use serde_json::Value;
use std::collections::HashMap;

/// Record consumed from the source log and forwarded to the invocation target
///
/// The host builds one per consumed message; payload formatters read it
/// through the accessors below.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    pub(crate) topic: String,
    pub(crate) partition: i32,
    pub(crate) offset: i64,
    /// Milliseconds since epoch, if the source log carries one
    pub(crate) timestamp: Option<i64>,
    pub(crate) key: Option<String>,
    pub(crate) value: Value,
    /// User-defined headers from the producer
    pub(crate) attributes: HashMap<String, String>,
}

impl SinkRecord {
    /// Create a record with no key, timestamp or attributes
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, value: Value) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            timestamp: None,
            key: None,
            value,
            attributes: HashMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Get the value as a reference
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Access record attributes (producer headers)
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Get a specific attribute value
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }
}

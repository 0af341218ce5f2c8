//! Declarative option schema.
//!
//! A [`ConfigDef`] lists every recognized key with its type, default and
//! optional range. [`ConfigDef::parse`] checks a raw string map against it and
//! yields a [`ParsedConfig`] from which typed values are extracted.

use crate::{ConfigError, ConfigResult};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Value type of a configuration option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    Boolean,
    Int,
    Long,
    String,
    /// Comma-separated list of strings
    List,
}

/// How prominent an option is in generated documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    High,
    Medium,
    Low,
}

/// Default applied when a key is absent from the raw map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// No default, the key must be supplied
    Required,
    /// Optional, resolves to no value
    Null,
    /// Raw textual default, parsed with the key's type
    Value(&'static str),
}

/// Inclusive lower bound for numeric options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    min: i64,
}

impl Range {
    pub fn at_least(min: i64) -> Self {
        Self { min }
    }

    fn check(&self, key: &str, raw: &str, value: i64) -> ConfigResult<()> {
        if value < self.min {
            return Err(ConfigError::invalid(
                key,
                raw,
                format!("Value must be at least {}", self.min),
            ));
        }
        Ok(())
    }
}

/// A single option definition
#[derive(Debug, Clone)]
pub struct ConfigKey {
    pub name: &'static str,
    pub config_type: ConfigType,
    pub default: DefaultValue,
    pub importance: Importance,
    pub documentation: &'static str,
    pub range: Option<Range>,
}

/// A parsed option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Boolean(bool),
    Int(i32),
    Long(i64),
    String(String),
    List(Vec<String>),
    /// Optional key that was not supplied
    Null,
}

/// Ordered set of option definitions
#[derive(Debug, Clone, Default)]
pub struct ConfigDef {
    keys: Vec<ConfigKey>,
}

impl ConfigDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an option. Redefining an existing key replaces it.
    pub fn define(
        self,
        name: &'static str,
        config_type: ConfigType,
        default: DefaultValue,
        importance: Importance,
        documentation: &'static str,
    ) -> Self {
        self.insert(ConfigKey {
            name,
            config_type,
            default,
            importance,
            documentation,
            range: None,
        })
    }

    /// Define a numeric option with a lower bound
    pub fn define_with_range(
        self,
        name: &'static str,
        config_type: ConfigType,
        default: DefaultValue,
        range: Range,
        importance: Importance,
        documentation: &'static str,
    ) -> Self {
        self.insert(ConfigKey {
            name,
            config_type,
            default,
            importance,
            documentation,
            range: Some(range),
        })
    }

    fn insert(mut self, key: ConfigKey) -> Self {
        match self.keys.iter_mut().find(|k| k.name == key.name) {
            Some(existing) => *existing = key,
            None => self.keys.push(key),
        }
        self
    }

    /// Option definitions in definition order
    pub fn keys(&self) -> impl Iterator<Item = &ConfigKey> {
        self.keys.iter()
    }

    /// Look up a single definition
    pub fn key(&self, name: &str) -> Option<&ConfigKey> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Validate `props` against every definition.
    ///
    /// Fails on the first value that does not parse or violates its range, and
    /// on the first required key that is absent. Unknown keys are ignored.
    pub fn parse(&self, props: &HashMap<String, String>) -> ConfigResult<ParsedConfig> {
        let mut values = BTreeMap::new();

        for key in &self.keys {
            let value = match props.get(key.name) {
                Some(raw) => parse_value(key, raw)?,
                None => match key.default {
                    DefaultValue::Required => return Err(ConfigError::missing(key.name)),
                    DefaultValue::Null => ConfigValue::Null,
                    DefaultValue::Value(raw) => parse_value(key, raw)?,
                },
            };
            values.insert(key.name.to_string(), value);
        }

        for unknown in self.unknown_keys(props) {
            debug!("Ignoring unrecognized configuration key: {}", unknown);
        }

        Ok(ParsedConfig { values })
    }

    /// Keys in `props` with no definition here, sorted
    pub fn unknown_keys<'a>(&self, props: &'a HashMap<String, String>) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = props
            .keys()
            .map(String::as_str)
            .filter(|k| self.key(k).is_none())
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

fn parse_value(key: &ConfigKey, raw: &str) -> ConfigResult<ConfigValue> {
    let trimmed = raw.trim();
    let value = match key.config_type {
        ConfigType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                ConfigValue::Boolean(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                ConfigValue::Boolean(false)
            } else {
                return Err(ConfigError::invalid(
                    key.name,
                    raw,
                    "Expected value to be either true or false",
                ));
            }
        }
        ConfigType::Int => {
            let parsed = trimmed.parse::<i32>().map_err(|_| {
                ConfigError::invalid(key.name, raw, "Not a number of type INT")
            })?;
            if let Some(range) = key.range {
                range.check(key.name, raw, i64::from(parsed))?;
            }
            ConfigValue::Int(parsed)
        }
        ConfigType::Long => {
            let parsed = trimmed.parse::<i64>().map_err(|_| {
                ConfigError::invalid(key.name, raw, "Not a number of type LONG")
            })?;
            if let Some(range) = key.range {
                range.check(key.name, raw, parsed)?;
            }
            ConfigValue::Long(parsed)
        }
        ConfigType::String => ConfigValue::String(trimmed.to_string()),
        ConfigType::List => {
            if trimmed.is_empty() {
                ConfigValue::List(Vec::new())
            } else {
                ConfigValue::List(trimmed.split(',').map(|s| s.trim().to_string()).collect())
            }
        }
    };
    Ok(value)
}

/// Values produced by [`ConfigDef::parse`], keyed by option name
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl ParsedConfig {
    fn get(&self, key: &str) -> ConfigResult<&ConfigValue> {
        self.values
            .get(key)
            .ok_or_else(|| ConfigError::invalid(key, "", "Unknown configuration key"))
    }

    fn mismatch(key: &str, value: &ConfigValue, expected: &str) -> ConfigError {
        ConfigError::invalid(key, format!("{:?}", value), format!("Expected {}", expected))
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        match self.get(key)? {
            ConfigValue::Boolean(v) => Ok(*v),
            other => Err(Self::mismatch(key, other, "BOOLEAN")),
        }
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<i32> {
        match self.get(key)? {
            ConfigValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(key, other, "INT")),
        }
    }

    pub fn get_long(&self, key: &str) -> ConfigResult<i64> {
        match self.get(key)? {
            ConfigValue::Long(v) => Ok(*v),
            ConfigValue::Int(v) => Ok(i64::from(*v)),
            other => Err(Self::mismatch(key, other, "LONG")),
        }
    }

    pub fn get_string(&self, key: &str) -> ConfigResult<String> {
        match self.get(key)? {
            ConfigValue::String(v) => Ok(v.clone()),
            other => Err(Self::mismatch(key, other, "STRING")),
        }
    }

    pub fn get_optional_string(&self, key: &str) -> ConfigResult<Option<String>> {
        match self.get(key)? {
            ConfigValue::String(v) => Ok(Some(v.clone())),
            ConfigValue::Null => Ok(None),
            other => Err(Self::mismatch(key, other, "STRING")),
        }
    }

    pub fn get_list(&self, key: &str) -> ConfigResult<Vec<String>> {
        match self.get(key)? {
            ConfigValue::List(v) => Ok(v.clone()),
            other => Err(Self::mismatch(key, other, "LIST")),
        }
    }
}

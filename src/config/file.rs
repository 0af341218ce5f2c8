//! TOML file loading into the raw key-value map.

use crate::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::path::Path;
use toml::{Table, Value};

/// Read `path` and flatten it into dotted string keys
pub(crate) fn load_props(path: &Path) -> ConfigResult<HashMap<String, String>> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    let table: Table = toml::from_str(&content).map_err(|e| ConfigError::File {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    let mut props = HashMap::new();
    flatten("", &table, &mut props)?;
    Ok(props)
}

fn flatten(prefix: &str, table: &Table, props: &mut HashMap<String, String>) -> ConfigResult<()> {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(nested) => flatten(&full_key, nested, props)?,
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| scalar(&full_key, item))
                    .collect::<ConfigResult<Vec<_>>>()?
                    .join(",");
                props.insert(full_key, joined);
            }
            other => {
                let raw = scalar(&full_key, other)?;
                props.insert(full_key, raw);
            }
        }
    }
    Ok(())
}

fn scalar(key: &str, value: &Value) -> ConfigResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(d) => Ok(d.to_string()),
        Value::Array(_) | Value::Table(_) => Err(ConfigError::invalid(
            key,
            value.to_string(),
            "Nested arrays and tables are not supported inside lists",
        )),
    }
}

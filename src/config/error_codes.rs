//! Retriable invocation status codes.

use crate::{ConfigError, ConfigResult};
use std::collections::BTreeSet;
use std::fmt;

/// Set of invocation status codes treated as transient.
///
/// Classification is exact membership: no ranges, no wildcards. Any code not
/// in the set is a terminal failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorCodeSet {
    codes: BTreeSet<i32>,
}

impl ErrorCodeSet {
    /// Parse the elements of a list option as base-10 integers.
    ///
    /// Duplicates collapse. The first element that is not an integer fails the
    /// whole list, naming `key` and the joined list.
    pub fn parse<S: AsRef<str>>(key: &str, raw: &[S]) -> ConfigResult<Self> {
        let mut codes = BTreeSet::new();
        for element in raw {
            let element = element.as_ref();
            let code = element.trim().parse::<i32>().map_err(|_| {
                let joined = raw.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(",");
                ConfigError::invalid(
                    key,
                    joined.clone(),
                    format!(
                        "The list {} was not able to parse to a list of integers (bad element '{}')",
                        joined, element
                    ),
                )
            })?;
            codes.insert(code);
        }
        Ok(Self { codes })
    }

    /// True iff `code` is a member of the set
    pub fn is_retriable(&self, code: i32) -> bool {
        self.codes.contains(&code)
    }

    /// Codes in ascending order
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.codes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl FromIterator<i32> for ErrorCodeSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ErrorCodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

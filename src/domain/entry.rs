//! Parsed config records

use serde::Serialize;
use std::fmt;

/// One parsed line of a config file
///
/// A category marker carries no key, and a pair carries no category. Which
/// category a pair belongs to is decided purely by its position after the
/// nearest preceding marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    /// A `[Name]` header line
    Category { name: String },
    /// A `key = value` line
    Pair { key: String, value: String },
}

impl Entry {
    pub fn category(name: impl Into<String>) -> Self {
        Entry::Category { name: name.into() }
    }

    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        Entry::Pair {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the category name if this is a header
    pub fn category_name(&self) -> Option<&str> {
        match self {
            Entry::Category { name } => Some(name),
            Entry::Pair { .. } => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Entry::Pair { key, .. } => Some(key),
            Entry::Category { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Entry::Pair { value, .. } => Some(value),
            Entry::Category { .. } => None,
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, Entry::Category { .. })
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Category { name } => write!(f, "[{}]", name),
            Entry::Pair { key, value } => write!(f, "{} = {}", key, value),
        }
    }
}

//! Key-value storage trait and stored value type.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A value held by a key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum StoredValue {
    /// UTF-8 string
    Str(String),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Double(f64),
    /// Boolean flag
    Bool(bool),
}

impl StoredValue {
    /// Tag used when a backend stores the kind separately from the value.
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Str(_) => "str",
            StoredValue::Int(_) => "int",
            StoredValue::Double(_) => "double",
            StoredValue::Bool(_) => "bool",
        }
    }

    /// Read as a string. Only string values qualify.
    pub fn as_string(&self) -> Option<String> {
        match self {
            StoredValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Read as an integer, coercing numeric and boolean values.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StoredValue::Int(i) => Some(*i),
            StoredValue::Double(d) if d.is_finite() => Some(*d as i64),
            StoredValue::Bool(b) => Some(i64::from(*b)),
            StoredValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read as a double, coercing numeric and boolean values.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            StoredValue::Double(d) => Some(*d),
            StoredValue::Int(i) => Some(*i as f64),
            StoredValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            StoredValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Read as a boolean. Non-zero numbers and "true"/"yes"/"1" are true.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(b) => Some(*b),
            StoredValue::Int(i) => Some(*i != 0),
            StoredValue::Double(d) => Some(*d != 0.0),
            StoredValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

/// Flat key-value persistence provider.
///
/// Absent keys read as the type's default through the typed helpers. Writers
/// are serialized by the implementation; callers may share a store across
/// threads.
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value for a key.
    fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Set the value for a key, replacing any previous value.
    fn set(&self, key: &str, value: StoredValue) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Make pending writes durable.
    fn flush(&self) -> Result<()>;

    /// Get a string, or `None` when absent or not a string.
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key)?.and_then(|v| v.as_string()))
    }

    /// Get an integer, defaulting to 0.
    fn get_int(&self, key: &str) -> Result<i64> {
        Ok(self.get(key)?.and_then(|v| v.as_int()).unwrap_or(0))
    }

    /// Get a double, defaulting to 0.0.
    fn get_double(&self, key: &str) -> Result<f64> {
        Ok(self.get(key)?.and_then(|v| v.as_double()).unwrap_or(0.0))
    }

    /// Get a boolean, defaulting to false.
    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Set a string value.
    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, StoredValue::Str(value.to_string()))
    }

    /// Set an integer value.
    fn set_int(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, StoredValue::Int(value))
    }

    /// Set a double value.
    fn set_double(&self, key: &str, value: f64) -> Result<()> {
        self.set(key, StoredValue::Double(value))
    }

    /// Set a boolean value.
    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, StoredValue::Bool(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_coercions() {
        assert_eq!(StoredValue::Int(7).as_int(), Some(7));
        assert_eq!(StoredValue::Double(3.9).as_int(), Some(3));
        assert_eq!(StoredValue::Bool(true).as_int(), Some(1));
        assert_eq!(StoredValue::Str(" 12 ".into()).as_int(), Some(12));
        assert_eq!(StoredValue::Str("twelve".into()).as_int(), None);
        assert_eq!(StoredValue::Double(f64::NAN).as_int(), None);
    }

    #[test]
    fn test_double_coercions() {
        assert_eq!(StoredValue::Int(2).as_double(), Some(2.0));
        assert_eq!(StoredValue::Double(1.5).as_double(), Some(1.5));
        assert_eq!(StoredValue::Str("1700000000.25".into()).as_double(), Some(1_700_000_000.25));
    }

    #[test]
    fn test_bool_coercions() {
        assert_eq!(StoredValue::Int(0).as_bool(), Some(false));
        assert_eq!(StoredValue::Int(5).as_bool(), Some(true));
        assert_eq!(StoredValue::Str("YES".into()).as_bool(), Some(true));
        assert_eq!(StoredValue::Str("maybe".into()).as_bool(), None);
    }

    #[test]
    fn test_string_is_not_coerced_from_numbers() {
        assert_eq!(StoredValue::Int(1).as_string(), None);
        assert_eq!(StoredValue::Str("1.0".into()).as_string(), Some("1.0".to_string()));
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(StoredValue::Str(String::new()).kind(), "str");
        assert_eq!(StoredValue::Int(0).kind(), "int");
        assert_eq!(StoredValue::Double(0.0).kind(), "double");
        assert_eq!(StoredValue::Bool(false).kind(), "bool");
    }
}

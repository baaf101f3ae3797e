//! Typed attribute values stored on scene nodes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of a node attribute (persisted state, transform channels, driver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
    List(Vec<MetaValue>),
}

impl MetaValue {
    /// Numeric view; integers widen and single-item lists unwrap.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::List(list) if list.len() == 1 => list[0].as_number(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(v) = self { Some(v) } else { None }
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        if let Self::Boolean(v) = self { Some(*v) } else { None }
    }

    /// Name of the variant, used in type errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Attribute map of one node.
pub type MetaMap = BTreeMap<String, MetaValue>;

/// Case-insensitive lookups on a [`MetaMap`].
pub trait MetaLookupExt {
    /// Look up `key` as given, then in lower case.
    fn get_normalized(&self, key: &str) -> Option<&MetaValue>;
}

impl MetaLookupExt for MetaMap {
    fn get_normalized(&self, key: &str) -> Option<&MetaValue> {
        if let Some(value) = self.get(key) {
            return Some(value);
        }

        let lower = key.to_ascii_lowercase();
        if lower != key {
            if let Some(value) = self.get(&lower) {
                return Some(value);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_widen_and_unwrap() {
        assert_eq!(MetaValue::Integer(24).as_number(), Some(24.0));
        assert_eq!(MetaValue::List(vec![MetaValue::Number(0.5)]).as_number(), Some(0.5));
        assert_eq!(MetaValue::from("L").as_number(), None);
        assert_eq!(MetaValue::from("L").as_text(), Some("L"));
    }

    #[test]
    fn normalized_lookup_falls_back_to_lower_case() {
        let mut meta = MetaMap::new();
        meta.insert("wrap_id".to_owned(), MetaValue::from("AB12C"));
        assert!(meta.get_normalized("WRAP_ID").is_some());
        assert!(meta.get_normalized("wrap_name").is_none());
    }

    #[test]
    fn display_lists() {
        let v = MetaValue::List(vec![MetaValue::Integer(1), MetaValue::from("x")]);
        assert_eq!(v.to_string(), "[1, x]");
    }
}

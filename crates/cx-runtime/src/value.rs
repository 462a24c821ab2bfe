//! The runtime value model.
//!
//! Every value a Cx program touches — locals, entity fields, event payloads —
//! is one of these recursively structured values: a scalar, an ordered list,
//! or an insertion-ordered map. Payloads carry copies, never references into
//! entity internals, which keeps handler inputs serializable and decoupled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured Cx value.
///
/// Maps preserve insertion order so object-literal property order survives
/// from source text through payload construction and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String
    Str(String),
    /// Ordered list
    List(Vec<Value>),
    /// Insertion-ordered map
    Map(IndexMap<String, Value>),
}

impl Value {
    /// An empty map value.
    pub fn empty_map() -> Value {
        Value::Map(IndexMap::new())
    }

    /// Truthiness: `null`, `false`, `0`, `0.0`, `""`, `[]`, and `{}` are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// The value's type name, as reported by `typeof`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Look up a key on a map value. Non-maps and missing keys yield `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Deep-merge `overlay` over `base`, producing a new value.
    ///
    /// Map keys present in both sides merge recursively; on any other
    /// conflict the overlay wins. Neither input is mutated — chain items must
    /// not be able to corrupt the base payload other continuations see.
    pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
        match (base, overlay) {
            (Value::Map(base_map), Value::Map(overlay_map)) => {
                let mut merged = base_map.clone();
                for (key, overlay_value) in overlay_map {
                    let entry = match merged.get(key) {
                        Some(base_value) => Value::deep_merge(base_value, overlay_value),
                        None => overlay_value.clone(),
                    };
                    merged.insert(key.clone(), entry);
                }
                Value::Map(merged)
            }
            _ => overlay.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Build a map value from key/value pairs, preserving order.
pub fn map_of<I, K>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Str("x".into()).is_truthy());
        assert!(!Value::empty_map().is_truthy());
    }

    #[test]
    fn deep_merge_overlay_wins() {
        let base = map_of([("n", Value::Int(1)), ("keep", Value::Bool(true))]);
        let overlay = map_of([("n", Value::Int(2))]);
        let merged = Value::deep_merge(&base, &overlay);

        assert_eq!(merged.get("n"), Some(&Value::Int(2)));
        assert_eq!(merged.get("keep"), Some(&Value::Bool(true)));
        // Non-destructive: the base is untouched.
        assert_eq!(base.get("n"), Some(&Value::Int(1)));
    }

    #[test]
    fn deep_merge_recurses_into_nested_maps() {
        let base = map_of([(
            "cfg",
            map_of([("a", Value::Int(1)), ("b", Value::Int(2))]),
        )]);
        let overlay = map_of([("cfg", map_of([("b", Value::Int(9))]))]);
        let merged = Value::deep_merge(&base, &overlay);

        let cfg = merged.get("cfg").unwrap();
        assert_eq!(cfg.get("a"), Some(&Value::Int(1)));
        assert_eq!(cfg.get("b"), Some(&Value::Int(9)));
    }

    #[test]
    fn deep_merge_replaces_non_map_values() {
        let base = map_of([("xs", Value::List(vec![Value::Int(1)]))]);
        let overlay = map_of([("xs", Value::List(vec![Value::Int(2), Value::Int(3)]))]);
        let merged = Value::deep_merge(&base, &overlay);
        assert_eq!(
            merged.get("xs"),
            Some(&Value::List(vec![Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn map_preserves_insertion_order() {
        let value = map_of([
            ("z", Value::Int(1)),
            ("a", Value::Int(2)),
            ("m", Value::Int(3)),
        ]);
        let Value::Map(map) = &value else {
            unreachable!();
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn display_is_readable() {
        let value = map_of([("n", Value::Int(1)), ("s", Value::from("hi"))]);
        assert_eq!(value.to_string(), "{n: 1, s: hi}");
        assert_eq!(Value::List(vec![Value::Int(1), Value::Null]).to_string(), "[1, null]");
    }
}

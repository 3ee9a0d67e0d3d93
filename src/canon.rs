//! Canonical serialization (a JCS/RFC 8785 subset).
//!
//! [`CanonValue`] is the value model every hashed object gets built into
//! before it is turned into bytes. There is deliberately no float variant:
//! a real number can never even be constructed here, so "the serializer
//! refuses real-valued input" is a property of the type, not a runtime
//! check. Maps sort their keys, use minimal separators, and reject duplicate
//! keys at construction time rather than silently overwriting.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::numeric::Q;

/// Faults raised while building or encoding a [`CanonValue`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonError {
    #[error("duplicate key in canonical map: {0}")]
    DuplicateKey(String),
}

/// A canonicalizable value. Integers are `i128` so both ATS-scale (`~1e22`)
/// and small GMI values fit without a second integer type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonValue {
    Null,
    Bool(bool),
    Int(i128),
    Str(String),
    Arr(Vec<CanonValue>),
    Map(BTreeMap<String, CanonValue>),
}

impl CanonValue {
    /// Build a map value from key/value pairs, rejecting duplicate keys.
    pub fn map(pairs: Vec<(String, CanonValue)>) -> Result<CanonValue, CanonError> {
        let mut out = BTreeMap::new();
        for (k, v) in pairs {
            if out.insert(k.clone(), v).is_some() {
                return Err(CanonError::DuplicateKey(k));
            }
        }
        Ok(CanonValue::Map(out))
    }

    /// A scaled [`Q`] rendered as the wire pair `{"value": <int>, "scale": <int>}`.
    pub fn from_q(q: &Q) -> CanonValue {
        CanonValue::map(vec![
            ("value".to_string(), CanonValue::Int(q.value() as i128)),
            ("scale".to_string(), CanonValue::Int(q.scale() as i128)),
        ])
        .expect("fixed two-key map cannot collide")
    }

    /// A 2D grid of `i64` cells.
    pub fn from_grid_i64(grid: &[Vec<i64>]) -> CanonValue {
        CanonValue::Arr(
            grid.iter()
                .map(|row| CanonValue::Arr(row.iter().map(|c| CanonValue::Int(*c as i128)).collect()))
                .collect(),
        )
    }

    /// A 2D grid of `u64` cells.
    pub fn from_grid_u64(grid: &[Vec<u64>]) -> CanonValue {
        CanonValue::Arr(
            grid.iter()
                .map(|row| CanonValue::Arr(row.iter().map(|c| CanonValue::Int(*c as i128)).collect()))
                .collect(),
        )
    }

    /// Encode to the canonical byte form: sorted keys, minimal separators,
    /// UTF-8 strings, no trailing whitespace.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out.into_bytes()
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            CanonValue::Null => out.push_str("null"),
            CanonValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            CanonValue::Int(n) => {
                let _ = write!(out, "{n}");
            }
            CanonValue::Str(s) => write_json_string(out, s),
            CanonValue::Arr(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            CanonValue::Map(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json_string(out, k);
                    out.push(':');
                    v.write_canonical(out);
                }
                out.push('}');
            }
        }
    }
}

fn write_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted_regardless_of_insertion_order() {
        let a = CanonValue::map(vec![
            ("b".to_string(), CanonValue::Int(1)),
            ("a".to_string(), CanonValue::Int(2)),
        ])
        .unwrap();
        assert_eq!(a.to_canonical_bytes(), br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = CanonValue::map(vec![
            ("a".to_string(), CanonValue::Int(1)),
            ("a".to_string(), CanonValue::Int(2)),
        ])
        .unwrap_err();
        assert_eq!(err, CanonError::DuplicateKey("a".to_string()));
    }

    #[test]
    fn separators_are_minimal() {
        let v = CanonValue::Arr(vec![CanonValue::Int(1), CanonValue::Int(2)]);
        assert_eq!(v.to_canonical_bytes(), b"[1,2]");
    }

    #[test]
    fn encoding_is_deterministic_across_calls() {
        let v = CanonValue::map(vec![
            ("z".to_string(), CanonValue::Bool(true)),
            ("m".to_string(), CanonValue::Null),
            ("a".to_string(), CanonValue::Str("hi".to_string())),
        ])
        .unwrap();
        let first = v.to_canonical_bytes();
        let second = v.to_canonical_bytes();
        assert_eq!(first, second);
        assert_eq!(first, br#"{"a":"hi","m":null,"z":true}"#);
    }
}

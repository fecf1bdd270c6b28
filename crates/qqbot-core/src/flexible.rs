//! Lenient list deserialization for deployment env vars.
//!
//! `SUPERUSERS=123,456`, `SUPERUSERS=123 456`, `SUPERUSERS=[123,456]` and
//! `SUPERUSERS=123` must all deserialize to the same `Vec<i64>` — operators
//! copy these values around by hand and the exact shape they paste in
//! shouldn't matter. Booleans are never coerced into this path; only the
//! list-shaped config keys in §6 of the spec use it.

use serde::de::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Deserialize a flexible scalar-or-list env value into `Vec<T>`.
///
/// Accepts, in order of how the raw JSON `Value` actually looks once
/// figment has parsed the environment variable:
/// - a JSON array — each element is parsed with `T::from_str` on its
///   string form (or taken directly if it's already a JSON integer);
/// - a bare string — split on commas and/or whitespace, each token parsed
///   with `T::from_str`, empty tokens dropped;
/// - a bare number — wrapped into a single-element vector.
pub fn flexible_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Value::deserialize(deserializer)?;
    parse_flexible_list(&value).map_err(serde::de::Error::custom)
}

fn parse_flexible_list<T: FromStr>(value: &Value) -> Result<Vec<T>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_to_string(item).and_then(|s| parse_token(&s)))
            .collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|tok| !tok.is_empty())
            .map(parse_token)
            .collect(),
        Value::Number(_) => {
            let s = scalar_to_string(value)?;
            Ok(vec![parse_token(&s)?])
        }
        Value::Null => Ok(Vec::new()),
        other => Err(format!("cannot parse {other} as a scalar-or-list value")),
    }
}

fn scalar_to_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("expected a scalar, got {other}")),
    }
}

fn parse_token<T: FromStr>(tok: &str) -> Result<T, String> {
    tok.parse::<T>()
        .map_err(|_| format!("could not parse '{tok}' as the expected scalar type"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let v: Vec<i64> = parse_flexible_list(&serde_json::json!([1, 2, 3])).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn parses_comma_separated_string() {
        let v: Vec<i64> = parse_flexible_list(&Value::String("1,2, 3".into())).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn parses_whitespace_separated_string() {
        let v: Vec<i64> = parse_flexible_list(&Value::String("1 2\t3".into())).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn parses_bare_integer() {
        let v: Vec<i64> = parse_flexible_list(&serde_json::json!(42)).unwrap();
        assert_eq!(v, vec![42]);
    }

    #[test]
    fn null_becomes_empty() {
        let v: Vec<i64> = parse_flexible_list(&Value::Null).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn parses_string_list() {
        let v: Vec<String> = parse_flexible_list(&Value::String("/,!".into())).unwrap();
        assert_eq!(v, vec!["/".to_string(), "!".to_string()]);
    }
}

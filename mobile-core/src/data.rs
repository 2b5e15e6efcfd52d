//! Lenient typed reads over event data and shared-state maps.
//!
//! Every accessor tolerates an absent map, an absent key and a value of the
//! wrong type, returning `None` or the supplied default instead of an error.

use std::collections::HashMap;

use serde_json::Value;

use crate::event::EventData;

#[inline]
pub fn opt_bool(map: Option<&EventData>, key: &str, default: bool) -> bool {
    map.and_then(|m| m.get(key)).and_then(Value::as_bool).unwrap_or(default)
}

#[inline]
pub fn opt_str<'a>(map: Option<&'a EventData>, key: &str) -> Option<&'a str> {
    map.and_then(|m| m.get(key)).and_then(Value::as_str)
}

/// Integer read that also accepts floating point numbers, truncating them.
#[inline]
pub fn opt_int(map: Option<&EventData>, key: &str, default: i64) -> i64 {
    match map.and_then(|m| m.get(key)) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(default),
        _ => default,
    }
}

#[inline]
pub fn opt_map<'a>(map: Option<&'a EventData>, key: &str) -> Option<&'a EventData> {
    map.and_then(|m| m.get(key)).and_then(Value::as_object)
}

/// Reads a nested map whose values must all be strings, `None` otherwise.
pub fn opt_string_map(map: Option<&EventData>, key: &str) -> Option<HashMap<String, String>> {
    let nested = opt_map(map, key)?;
    nested
        .iter()
        .map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_owned())))
        .collect::<Option<HashMap<String, String>>>()
}

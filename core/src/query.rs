//! Query-string encoding for request data.
//!
//! Produces the common `http_build_query` shape: insertion order,
//! `+` for spaces, booleans as `1`/`0`, nulls dropped, and nested values
//! flattened with bracket keys (`tags[0]=a`, `user[name]=b`).

use serde_json::Value;

use crate::error::KnockError;
use crate::types::Data;

/// Encode `data` as `application/x-www-form-urlencoded`.
pub fn build_query(data: &Data) -> Result<String, KnockError> {
    let mut pairs = Vec::new();
    for (key, value) in data {
        flatten(key.clone(), value, &mut pairs);
    }
    serde_urlencoded::to_string(&pairs).map_err(|e| KnockError::Serialization(e.to_string()))
}

fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(format!("{key}[{i}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}

//! Recursive object flattening.

use serde_json::{Map, Value};

/// Flatten a nested value into a single-level map from path strings to scalar leaves.
///
/// - `null` contributes nothing.
/// - A scalar is stored under the current path, or under `"value"` at the root.
/// - Array elements extend the path with `[i]`, or become `item_<i>` at the root.
/// - Object members extend the path with `.key`, or become `key` at the root.
///
/// Keys keep document order.
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(value, None, &mut out);
    out
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut Map<String, Value>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let key = match prefix {
                    Some(p) => format!("{p}[{i}]"),
                    None => format!("item_{i}"),
                };
                flatten_into(item, Some(&key), out);
            }
        }
        Value::Object(members) => {
            for (k, v) in members {
                let key = match prefix {
                    Some(p) => format!("{p}.{k}"),
                    None => k.clone(),
                };
                flatten_into(v, Some(&key), out);
            }
        }
        scalar => {
            out.insert(prefix.unwrap_or("value").to_string(), scalar.clone());
        }
    }
}

//! Canonical JSON serialization.
//!
//! One serializer is shared by the fingerprint and the `__schema` output so
//! both are byte-stable across runs: object keys sorted ascending, array
//! order preserved, dereference cycles already reduced to the
//! `{"__circular": true}` sentinel by the loader.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize a value canonically: compact, keys sorted ascending.
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Hex SHA-256 of the canonical serialization.
pub fn fingerprint(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(to_canonical_string(value).as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    // serde_json's string escaping is deterministic; reuse it.
    out.push_str(&serde_json::to_string(s).expect("string serialization is infallible"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let v = json!({"b": 1, "a": {"z": true, "m": null}});
        assert_eq!(to_canonical_string(&v), r#"{"a":{"m":null,"z":true},"b":1}"#);
    }

    #[test]
    fn array_order_is_preserved() {
        let v = json!(["c", "a", "b"]);
        assert_eq!(to_canonical_string(&v), r#"["c","a","b"]"#);
    }

    #[test]
    fn fingerprint_is_stable_across_key_order() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = fingerprint(&json!({}));
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

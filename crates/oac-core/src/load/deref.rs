//! Structural `$ref` dereferencing over `serde_json::Value`.
//!
//! References may appear anywhere in the document and may form cycles.
//! Resolution keeps a stack of in-flight reference targets; re-entering one
//! substitutes the `{"__circular": true}` sentinel, so the first
//! materialization stays intact and the result is a finite tree.

use serde_json::{Map, Value};

use crate::error::LoadError;

const CIRCULAR_KEY: &str = "__circular";

/// Resolve every `$ref` in `doc` against the document itself.
pub fn dereference(doc: &Value) -> Result<Value, LoadError> {
    let mut stack = Vec::new();
    resolve(doc, doc, &mut stack)
}

/// The sentinel object substituted at cycle re-entry points.
pub fn circular_sentinel() -> Value {
    let mut map = Map::new();
    map.insert(CIRCULAR_KEY.to_string(), Value::Bool(true));
    Value::Object(map)
}

fn resolve(root: &Value, node: &Value, stack: &mut Vec<String>) -> Result<Value, LoadError> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref") {
                if stack.iter().any(|seen| seen == ref_path) {
                    return Ok(circular_sentinel());
                }
                let target = lookup_pointer(root, ref_path)
                    .ok_or_else(|| LoadError::UnresolvedRef(ref_path.clone()))?;
                stack.push(ref_path.clone());
                let resolved = resolve(root, target, stack)?;
                stack.pop();
                return Ok(resolved);
            }
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), resolve(root, value, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve(root, item, stack)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

/// Look up a local `#/a/b` reference as a JSON pointer.
fn lookup_pointer<'a>(root: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    root.pointer(pointer)
}

//! Request body assembly from dot-notation flags or a raw payload.

use serde_json::{Map, Value};

use crate::error::RequestError;
use crate::model::CommandAction;
use crate::params::{BodyFlagDef, ParamType};
use crate::result::ValidationIssue;

use super::validate::validate_against;
use super::{BuildFailure, FlagValue, Invocation};

/// The body to send, if any.
pub struct AssembledBody {
    pub content_type: String,
    pub text: String,
}

/// Assemble and validate the request body for one invocation.
///
/// A raw `--body` payload wins over dot-notation flags. With neither, a
/// required body with required fields is a validation failure, a required
/// body without them sends `{}`, and an optional body is omitted.
pub fn assemble(
    action: &CommandAction,
    invocation: &Invocation,
) -> Result<Option<AssembledBody>, BuildFailure> {
    let Some(content_type) = action.body_content_type.clone() else {
        return Ok(None);
    };

    if let Some(raw) = invocation.raw_body.as_deref() {
        return assemble_raw(action, &content_type, raw).map(Some);
    }

    let provided = collect_flag_values(action, invocation)?;

    if provided.is_empty() {
        let required_flags: Vec<&BodyFlagDef> =
            action.body_flags.iter().filter(|d| d.required).collect();
        if !required_flags.is_empty() {
            let errors = required_flags
                .iter()
                .map(|def| ValidationIssue {
                    path: def.flag.clone(),
                    message: "missing required body field".to_string(),
                    value: None,
                })
                .collect();
            return Err(BuildFailure::Validation(errors));
        }
        let body_required = action.request_body.as_ref().is_some_and(|b| b.required);
        if body_required {
            return Ok(Some(AssembledBody {
                content_type,
                text: "{}".to_string(),
            }));
        }
        return Ok(None);
    }

    if !content_type.contains("json") {
        return Err(BuildFailure::Error(RequestError::NonJsonBody(content_type)));
    }

    let mut root = Value::Object(Map::new());
    for (def, value) in provided {
        insert_path(&mut root, &def.path, value);
    }

    validate_body(action, &root)?;

    Ok(Some(AssembledBody {
        content_type,
        text: serde_json::to_string(&root).expect("body serializes"),
    }))
}

fn assemble_raw(
    action: &CommandAction,
    content_type: &str,
    raw: &str,
) -> Result<AssembledBody, BuildFailure> {
    if !content_type.contains("json") {
        return Ok(AssembledBody {
            content_type: content_type.to_string(),
            text: raw.to_string(),
        });
    }
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|e| BuildFailure::Error(RequestError::InvalidBody(e)))?;
    validate_body(action, &parsed)?;
    Ok(AssembledBody {
        content_type: content_type.to_string(),
        text: serde_json::to_string(&parsed).expect("body serializes"),
    })
}

fn validate_body(action: &CommandAction, body: &Value) -> Result<(), BuildFailure> {
    let Some(schema) = action.request_body_schema.as_ref().filter(|s| !s.is_null()) else {
        return Ok(());
    };
    let errors = validate_against(schema, body);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BuildFailure::Validation(errors))
    }
}

/// Pull each declared body flag out of the invocation, coercing leaves by
/// their declared type. Keys keep their dots literally.
fn collect_flag_values<'a>(
    action: &'a CommandAction,
    invocation: &Invocation,
) -> Result<Vec<(&'a BodyFlagDef, Value)>, BuildFailure> {
    let mut provided = Vec::new();
    let mut issues = Vec::new();

    for def in &action.body_flags {
        let key = def.path.join(".");
        let Some(value) = invocation.flags.get(&key) else {
            continue;
        };
        match coerce_leaf(def, value) {
            Ok(coerced) => provided.push((def, coerced)),
            Err(issue) => issues.push(issue),
        }
    }

    if issues.is_empty() {
        Ok(provided)
    } else {
        Err(BuildFailure::Validation(issues))
    }
}

fn coerce_leaf(def: &BodyFlagDef, value: &FlagValue) -> Result<Value, ValidationIssue> {
    let key = def.path.join(".");
    let raw = match value {
        FlagValue::Bool(true) => return Ok(Value::Bool(true)),
        FlagValue::Bool(false) => return Ok(Value::Bool(false)),
        FlagValue::Str(s) => s.as_str(),
        FlagValue::Many(values) => values.last().map(String::as_str).unwrap_or(""),
    };
    match def.ty {
        ParamType::Integer => raw.parse::<i64>().map(Value::from).map_err(|_| issue(&key, raw, "integer")),
        ParamType::Number => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::from(n)),
            _ => Err(issue(&key, raw, "number")),
        },
        ParamType::Boolean => match raw {
            "true" | "" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(issue(&key, raw, "boolean")),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn issue(key: &str, raw: &str, expected: &str) -> ValidationIssue {
    ValidationIssue {
        path: key.to_string(),
        message: format!("expected {expected}, got '{raw}'"),
        value: Some(Value::String(raw.to_string())),
    }
}

/// Insert a value at a dotted path, creating intermediate objects lazily.
pub fn insert_path(root: &mut Value, path: &[String], value: Value) {
    let mut node = root;
    for segment in &path[..path.len() - 1] {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = node
            .as_object_mut()
            .expect("just ensured object")
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
        .expect("just ensured object")
        .insert(path[path.len() - 1].clone(), value);
}

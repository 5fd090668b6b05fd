//! Schema validation glue: compile a schema, run an instance through it,
//! and project the violations into renderer-friendly issues.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::result::ValidationIssue;

/// Validate `instance` against `schema`, returning one issue per
/// violation. A schema that fails to compile is itself one issue.
pub fn validate_against(schema: &Value, instance: &Value) -> Vec<ValidationIssue> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            return vec![ValidationIssue {
                path: String::new(),
                message: format!("schema failed to compile: {e}"),
                value: None,
            }];
        }
    };

    validator
        .iter_errors(instance)
        .map(|error| {
            let base = dotted(&error.instance_path.to_string());
            match &error.kind {
                ValidationErrorKind::Required { property } => {
                    let name = property.as_str().map(str::to_string).unwrap_or_else(|| {
                        property.to_string()
                    });
                    ValidationIssue {
                        path: join_path(&base, &name),
                        message: format!("missing required property '{name}'"),
                        value: None,
                    }
                }
                _ => ValidationIssue {
                    path: base,
                    message: error.to_string(),
                    value: Some(error.instance.clone().into_owned()),
                },
            }
        })
        .collect()
}

/// `/address/city` → `address.city`; the root pointer becomes empty.
fn dotted(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}.{name}")
    }
}

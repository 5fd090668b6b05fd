//! The `__schema` payload: a deterministic, machine-readable description
//! of the spec, its derived command tree, and the capabilities counts.
//! Canonical serialization happens at the renderer; this module only
//! shapes the data.

use serde_json::{json, Value};

use crate::model::CommandAction;
use crate::params::ParamKind;
use crate::ApiContext;

pub const SCHEMA_VERSION: u64 = 1;

/// Full payload: everything, including the raw operation list and the
/// naming plan.
pub fn schema_payload(ctx: &ApiContext) -> Value {
    let mut payload = minimal_payload(ctx);
    let obj = payload.as_object_mut().expect("payload is an object");
    obj.insert("operations".into(), operations_json(ctx));
    obj.insert("planned".into(), planned_json(ctx));
    obj.insert("commandsIndex".into(), commands_index_json(ctx));
    payload
}

/// Minimal payload: identity, capabilities, servers, auth, and commands.
pub fn minimal_payload(ctx: &ApiContext) -> Value {
    json!({
        "schemaVersion": SCHEMA_VERSION,
        "openapi": {
            "version": ctx.doc.openapi,
            "title": ctx.doc.info.title,
            "infoVersion": ctx.doc.info.version,
        },
        "spec": {
            "id": ctx.spec.spec_id,
            "fingerprint": ctx.spec.fingerprint,
            "source": ctx.spec.source.as_str(),
        },
        "capabilities": {
            "servers": ctx.servers.len(),
            "auth": ctx.auth_schemes.len(),
            "operations": ctx.planned.len(),
            "commands": ctx.model.action_count(),
        },
        "servers": ctx.servers.iter().map(|s| json!({
            "url": s.url,
            "description": s.description,
            "variables": s.variable_names,
        })).collect::<Vec<_>>(),
        "authSchemes": ctx.auth_schemes.iter().map(|s| {
            serde_json::to_value(s).expect("auth scheme serializes")
        }).collect::<Vec<_>>(),
        "commands": ctx.model.resources.iter().map(|r| json!({
            "resource": r.name,
            "actions": r.actions.iter().map(action_json).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    })
}

fn action_json(action: &CommandAction) -> Value {
    json!({
        "id": action.id,
        "key": action.key,
        "action": action.action,
        "aliasOf": action.alias_of,
        "method": action.method.as_str(),
        "path": action.path,
        "style": action.style,
        "tags": action.tags,
        "summary": action.summary,
        "deprecated": action.deprecated,
        "positionals": action
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::Positional)
            .map(|p| json!({"name": p.name, "type": p.ty}))
            .collect::<Vec<_>>(),
        "flags": action
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::Flag)
            .map(|p| serde_json::to_value(p).expect("param serializes"))
            .collect::<Vec<_>>(),
        "bodyFlags": action
            .body_flags
            .iter()
            .map(|b| serde_json::to_value(b).expect("body flag serializes"))
            .collect::<Vec<_>>(),
        "auth": serde_json::to_value(&action.auth).expect("auth serializes"),
        "requestBody": action.request_body.as_ref().map(|rb| json!({
            "required": rb.required,
            "contentTypes": rb.content_types,
            "preferredContentType": action.body_content_type,
        })),
    })
}

fn operations_json(ctx: &ApiContext) -> Value {
    Value::Array(
        ctx.planned
            .iter()
            .map(|p| {
                json!({
                    "key": p.op.key(),
                    "method": p.op.method.as_str(),
                    "path": p.op.path,
                    "operationId": p.op.operation_id,
                    "tags": p.op.tags,
                    "summary": p.op.summary,
                    "deprecated": p.op.deprecated,
                })
            })
            .collect(),
    )
}

fn planned_json(ctx: &ApiContext) -> Value {
    Value::Array(
        ctx.planned
            .iter()
            .map(|p| {
                json!({
                    "key": p.op.key(),
                    "resource": p.resource,
                    "action": p.action,
                    "canonicalAction": p.canonical_action,
                    "aliasOf": p.alias_of,
                    "style": p.style,
                    "pathArgs": p.path_args,
                    "rawPathArgs": p.raw_path_args,
                })
            })
            .collect(),
    )
}

fn commands_index_json(ctx: &ApiContext) -> Value {
    let mut index = serde_json::Map::new();
    for action in ctx.model.iter_actions() {
        index.insert(
            format!("{}:{}", action.resource, action.action),
            json!(action.id),
        );
    }
    Value::Object(index)
}

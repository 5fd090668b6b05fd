//! Project a `CommandResult` onto an output stream: human text or a
//! stable JSON envelope, plus the stream choice and process exit code.

use serde_json::{json, Map, Value};

use crate::load::canonical::to_canonical_string;
use crate::result::{CommandResult, Outcome, PreparedRequest, ValidationIssue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A fully rendered result, ready to write.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub stream: OutputStream,
    pub exit_code: i32,
}

pub fn render(result: &CommandResult, format: OutputFormat) -> Rendered {
    let stream = match result.outcome {
        Outcome::Error { .. } | Outcome::Validation { .. } => OutputStream::Stderr,
        _ => OutputStream::Stdout,
    };
    let text = match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => render_json(result),
    };
    Rendered {
        text,
        stream,
        exit_code: result.exit_code(),
    }
}

fn render_text(result: &CommandResult) -> String {
    match &result.outcome {
        Outcome::Success { response, .. } => {
            if response.ok {
                body_text(&response.body)
            } else {
                format!("HTTP {}\n{}", response.status, response.raw_body)
            }
        }
        Outcome::Error {
            message, response, ..
        } => match response {
            Some(response) => format!("HTTP {}\n{}", response.status, response.raw_body),
            None => format!("error: {message}"),
        },
        Outcome::Validation { errors, .. } => {
            let mut out = String::new();
            for issue in errors {
                out.push_str(&format!("- {}: {}\n", issue.path, issue.message));
            }
            if let (Some(resource), Some(action)) = (&result.resource, &result.action) {
                out.push_str(&format!("Run '{resource} {action} --help' for usage.\n"));
            }
            out.pop();
            out
        }
        Outcome::Prepared { request } => {
            let mut out = format!("{} {}\n", request.method, request.url);
            for (name, value) in request.headers.iter() {
                out.push_str(&format!("{name}: {value}\n"));
            }
            if let Some(body) = &request.body {
                out.push('\n');
                out.push_str(body);
            } else {
                out.pop();
            }
            out
        }
        Outcome::Curl { curl, .. } => curl.clone(),
        Outcome::Data { kind, data } => render_data_text(kind, data),
    }
}

fn body_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).expect("body serializes"),
    }
}

/// Kind-specific human formatting for data payloads.
fn render_data_text(kind: &str, data: &Value) -> String {
    match kind {
        k if k.starts_with("schema") => to_canonical_string(data),
        "login" => format!(
            "Stored token for '{}' (profile '{}').",
            field(data, "specId"),
            field(data, "profile")
        ),
        "logout" => format!(
            "Removed token for '{}' (profile '{}').",
            field(data, "specId"),
            field(data, "profile")
        ),
        "whoami" => {
            let mut out = format!("profile: {}", field(data, "profile"));
            if let Some(server) = data.get("server").and_then(Value::as_str) {
                out.push_str(&format!("\nserver: {server}"));
            }
            if let Some(scheme) = data.get("authScheme").and_then(Value::as_str) {
                out.push_str(&format!("\nauth scheme: {scheme}"));
            }
            out.push_str(&format!("\ntoken: {}", field(data, "token")));
            out
        }
        _ => serde_json::to_string_pretty(data).expect("data serializes"),
    }
}

fn field<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("-")
}

fn render_json(result: &CommandResult) -> String {
    let envelope = match &result.outcome {
        Outcome::Success { response, .. } => json!({
            "ok": response.ok,
            "status": response.status,
            "body": response.body,
        }),
        Outcome::Error {
            message, response, ..
        } => {
            let mut envelope = Map::new();
            envelope.insert("ok".into(), json!(false));
            envelope.insert("error".into(), json!(message));
            if let Some(response) = response {
                envelope.insert("status".into(), json!(response.status));
                envelope.insert("body".into(), response.body.clone());
            }
            Value::Object(envelope)
        }
        Outcome::Validation { errors, .. } => json!({
            "ok": false,
            "errors": errors.iter().map(issue_json).collect::<Vec<_>>(),
        }),
        Outcome::Prepared { request } => json!({
            "ok": true,
            "request": request_json(request),
        }),
        Outcome::Curl { curl, .. } => json!({"ok": true, "curl": curl}),
        Outcome::Data { kind, data } => {
            let envelope = json!({"ok": true, "kind": kind, "data": data});
            if kind.starts_with("schema") {
                return to_canonical_string(&envelope);
            }
            envelope
        }
    };
    // Canonical compact serialization keeps the envelope byte-stable no
    // matter how the maps were built.
    to_canonical_string(&envelope)
}

fn issue_json(issue: &ValidationIssue) -> Value {
    let mut obj = Map::new();
    obj.insert("path".into(), json!(issue.path));
    obj.insert("message".into(), json!(issue.message));
    if let Some(value) = &issue.value {
        obj.insert("value".into(), value.clone());
    }
    Value::Object(obj)
}

fn request_json(request: &PreparedRequest) -> Value {
    let mut headers = Map::new();
    for (name, value) in request.headers.iter() {
        headers.insert(name.to_string(), json!(value));
    }
    let mut obj = Map::new();
    obj.insert("method".into(), json!(request.method));
    obj.insert("url".into(), json!(request.url));
    obj.insert("headers".into(), Value::Object(headers));
    if let Some(body) = &request.body {
        obj.insert("body".into(), json!(body));
    }
    obj.insert("curl".into(), json!(request.curl));
    Value::Object(obj)
}

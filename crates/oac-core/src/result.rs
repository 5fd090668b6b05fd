//! The tagged result IR every invocation funnels into. Failures along the
//! pipeline surface as variants here, never as unwound stacks; the
//! renderer is the only place that turns them into stream output.

use indexmap::IndexMap;
use serde_json::Value;

/// Insertion-ordered header map with case-insensitive lookup and
/// replacement, preserving the casing of the first insertion.
#[derive(Debug, Clone, Default)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, matching existing names case-insensitively.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        if let Some(existing) = self
            .0
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
        {
            self.0.insert(existing, value.into());
        } else {
            self.0.insert(name.to_string(), value.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A fully materialized request that has not been issued.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    /// curl-equivalent rendering with masked credentials.
    pub curl: String,
}

/// What came back over the wire.
#[derive(Debug, Clone)]
pub struct ResponseSummary {
    pub status: u16,
    pub ok: bool,
    pub headers: Vec<(String, String)>,
    /// Parsed JSON when the content type says so and the body parses;
    /// otherwise the raw text as a JSON string.
    pub body: Value,
    pub raw_body: String,
}

/// Wall-clock start and elapsed time of one execution.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Milliseconds since the Unix epoch.
    pub started_at: u64,
    pub duration_ms: u64,
}

/// One schema or input violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub value: Option<Value>,
}

/// The discriminated outcome of one invocation.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success {
        request: PreparedRequest,
        response: ResponseSummary,
        timing: Timing,
    },
    Error {
        message: String,
        request: Option<PreparedRequest>,
        response: Option<ResponseSummary>,
        timing: Option<Timing>,
    },
    Validation {
        errors: Vec<ValidationIssue>,
        request: Option<PreparedRequest>,
    },
    Prepared {
        request: PreparedRequest,
    },
    Curl {
        curl: String,
        request: PreparedRequest,
    },
    Data {
        kind: String,
        data: Value,
    },
}

/// An outcome plus the command context it happened under.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub resource: Option<String>,
    pub action: Option<String>,
    pub outcome: Outcome,
}

impl CommandResult {
    pub fn new(outcome: Outcome) -> Self {
        CommandResult {
            resource: None,
            action: None,
            outcome,
        }
    }

    pub fn with_context(mut self, resource: &str, action: &str) -> Self {
        self.resource = Some(resource.to_string());
        self.action = Some(action.to_string());
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        CommandResult::new(Outcome::Error {
            message: message.into(),
            request: None,
            response: None,
            timing: None,
        })
    }

    pub fn data(kind: &str, data: Value) -> Self {
        CommandResult::new(Outcome::Data {
            kind: kind.to_string(),
            data,
        })
    }

    /// Zero only for an ok success or any non-executing variant.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            Outcome::Success { response, .. } if response.ok => 0,
            Outcome::Prepared { .. } | Outcome::Curl { .. } | Outcome::Data { .. } => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_preserve_order_and_first_casing() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        headers.set("Authorization", "Bearer x");
        headers.set("content-type", "text/plain");
        let pairs: Vec<(&str, &str)> = headers.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("Content-Type", "text/plain"),
                ("Authorization", "Bearer x")
            ]
        );
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn exit_codes_follow_the_outcome() {
        let ok = CommandResult::data("schema", json!({}));
        assert_eq!(ok.exit_code(), 0);
        assert_eq!(CommandResult::error("boom").exit_code(), 1);
        let invalid = CommandResult::new(Outcome::Validation {
            errors: vec![],
            request: None,
        });
        assert_eq!(invalid.exit_code(), 1);
    }
}

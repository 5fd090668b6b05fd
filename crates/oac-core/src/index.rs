//! Flatten path items into a normalized, deterministically ordered
//! operation list with merged parameters and content-typed request bodies.

use indexmap::IndexMap;
use serde_json::Value;

use crate::parse::operation::{Operation, PathItem};
use crate::parse::parameter::{ParamLocation, Parameter};
use crate::parse::security::SecurityRequirement;
use crate::parse::spec::Document;

/// HTTP method, in path-item declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    pub fn lower(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

/// A parameter after merging and location filtering.
#[derive(Debug, Clone)]
pub struct NormalizedParameter {
    pub location: ParamLocation,
    pub name: String,
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<Value>,
}

/// A request body reduced to its content types and their schemas.
#[derive(Debug, Clone)]
pub struct NormalizedRequestBody {
    pub required: bool,
    pub content_types: Vec<String>,
    pub schema_by_content_type: IndexMap<String, Value>,
}

/// One HTTP verb at one path, fully merged.
#[derive(Debug, Clone)]
pub struct NormalizedOperation {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Effective security: operation-level when declared (an empty list is
    /// an explicit opt-out), else the document default.
    pub security: Option<Vec<SecurityRequirement>>,
    pub parameters: Vec<NormalizedParameter>,
    pub request_body: Option<NormalizedRequestBody>,
}

impl NormalizedOperation {
    /// The `"METHOD path"` identity key.
    pub fn key(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}

/// Flatten every path item, sorted by `(path, method)`.
pub fn index_operations(doc: &Document) -> Vec<NormalizedOperation> {
    let mut out = Vec::new();

    for (path, item) in &doc.paths {
        for (method, op) in methods_of(item) {
            out.push(normalize(doc, path, method, item, op));
        }
    }

    out.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then_with(|| a.method.as_str().cmp(b.method.as_str()))
    });
    out
}

fn methods_of(item: &PathItem) -> Vec<(HttpMethod, &Operation)> {
    let mut pairs = Vec::new();
    macro_rules! push_op {
        ($method:expr, $op:expr) => {
            if let Some(ref op) = $op {
                pairs.push(($method, op));
            }
        };
    }
    push_op!(HttpMethod::Get, item.get);
    push_op!(HttpMethod::Post, item.post);
    push_op!(HttpMethod::Put, item.put);
    push_op!(HttpMethod::Patch, item.patch);
    push_op!(HttpMethod::Delete, item.delete);
    push_op!(HttpMethod::Options, item.options);
    push_op!(HttpMethod::Head, item.head);
    push_op!(HttpMethod::Trace, item.trace);
    pairs
}

fn normalize(
    doc: &Document,
    path: &str,
    method: HttpMethod,
    item: &PathItem,
    op: &Operation,
) -> NormalizedOperation {
    NormalizedOperation {
        method,
        path: path.to_string(),
        operation_id: op.operation_id.clone(),
        tags: op.tags.clone(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        deprecated: op.deprecated.unwrap_or(false),
        security: op.security.clone().or_else(|| doc.security.clone()),
        parameters: merge_parameters(&item.parameters, &op.parameters),
        request_body: op.request_body.as_ref().map(|rb| NormalizedRequestBody {
            required: rb.required,
            content_types: rb.content.keys().cloned().collect(),
            schema_by_content_type: rb
                .content
                .iter()
                .map(|(ct, mt)| (ct.clone(), mt.schema.clone().unwrap_or(Value::Null)))
                .collect(),
        }),
    }
}

/// Merge path-item and operation parameters keyed on `(location, name)`;
/// operation entries win. Entries with no usable name or location are
/// discarded, and path parameters are always required.
fn merge_parameters(shared: &[Parameter], own: &[Parameter]) -> Vec<NormalizedParameter> {
    let mut merged: IndexMap<(ParamLocation, String), NormalizedParameter> = IndexMap::new();

    for param in shared.iter().chain(own) {
        let Some(name) = param.name.as_deref().filter(|n| !n.is_empty()) else {
            log::warn!("discarding parameter with no name");
            continue;
        };
        let Some(location) = param.location.as_deref().and_then(ParamLocation::parse) else {
            log::warn!("discarding parameter '{name}' with unsupported location");
            continue;
        };
        merged.insert(
            (location, name.to_string()),
            NormalizedParameter {
                location,
                name: name.to_string(),
                required: param.required || location == ParamLocation::Path,
                description: param.description.clone(),
                schema: param.schema.clone(),
            },
        );
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{load_text, SpecSource};
    use crate::parse;

    fn doc(json: &str) -> Document {
        let loaded = load_text(json, SpecSource::Embedded).unwrap();
        parse::document(&loaded.doc).unwrap()
    }

    #[test]
    fn operation_parameters_override_path_item_parameters() {
        let d = doc(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},"paths":{
                "/items/{id}": {
                    "parameters": [
                        {"name":"id","in":"path","schema":{"type":"string"}},
                        {"name":"shared","in":"query","required":false}
                    ],
                    "get": {"parameters": [
                        {"name":"shared","in":"query","required":true}
                    ]}
                }
            }}"#,
        );
        let ops = index_operations(&d);
        assert_eq!(ops.len(), 1);
        let shared = ops[0]
            .parameters
            .iter()
            .find(|p| p.name == "shared")
            .unwrap();
        assert!(shared.required, "operation-level entry should win");
        let id = ops[0].parameters.iter().find(|p| p.name == "id").unwrap();
        assert!(id.required, "path params are forced required");
    }

    #[test]
    fn unsupported_locations_are_discarded() {
        let d = doc(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},"paths":{
                "/x": {"get": {"parameters": [
                    {"name":"good","in":"query"},
                    {"name":"bad","in":"body"},
                    {"in":"query"}
                ]}}
            }}"#,
        );
        let ops = index_operations(&d);
        assert_eq!(ops[0].parameters.len(), 1);
        assert_eq!(ops[0].parameters[0].name, "good");
    }

    #[test]
    fn security_falls_back_to_document_level() {
        let d = doc(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},
                "security": [{"global": []}],
                "paths":{
                    "/a": {"get": {}},
                    "/b": {"get": {"security": []}}
                }}"#,
        );
        let ops = index_operations(&d);
        assert!(ops[0].security.as_ref().unwrap()[0].contains_key("global"));
        assert!(ops[1].security.as_ref().unwrap().is_empty());
    }

    #[test]
    fn output_is_sorted_by_path_then_method() {
        let d = doc(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},"paths":{
                "/b": {"get": {}},
                "/a": {"post": {}, "get": {}, "delete": {}}
            }}"#,
        );
        let keys: Vec<String> = index_operations(&d).iter().map(|o| o.key()).collect();
        assert_eq!(keys, vec!["DELETE /a", "GET /a", "POST /a", "GET /b"]);
    }
}

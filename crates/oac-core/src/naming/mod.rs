//! Deterministic `(resource, action)` assignment for every operation.
//!
//! REST-shaped operations get CRUD verbs from method + path shape,
//! RPC-shaped ones (dotted paths or dotted POST operationIds) reuse the
//! trailing operationId or path component. Collisions are re-suffixed
//! deterministically so the same document always yields the same tree.

pub mod case;
pub mod plural;

use serde::Serialize;

use crate::index::{HttpMethod, NormalizedOperation};
use crate::servers::extract_placeholders;
use case::kebab;
use plural::{pluralize, singularize};

/// Command-shape classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpStyle {
    Rest,
    Rpc,
}

/// An indexed operation with its derived command identity.
#[derive(Debug, Clone)]
pub struct PlannedOperation {
    pub op: NormalizedOperation,
    pub resource: String,
    pub action: String,
    /// The action before collision suffixing.
    pub canonical_action: String,
    /// Set when collision resolution renamed the action.
    pub alias_of: Option<String>,
    pub style: OpStyle,
    /// Kebab-cased path template variables, in template order.
    pub path_args: Vec<String>,
    /// Original path template variable names, in template order.
    pub raw_path_args: Vec<String>,
}

const GENERIC_TAGS: [&str; 3] = ["default", "defaults", "api"];

/// Assign `(resource, action)` pairs, resolve collisions, and sort.
pub fn plan(ops: Vec<NormalizedOperation>) -> Vec<PlannedOperation> {
    let mut planned: Vec<PlannedOperation> = ops
        .into_iter()
        .map(|op| {
            let style = classify_style(&op);
            let raw_path_args = extract_placeholders(&op.path);
            let path_args: Vec<String> = raw_path_args.iter().map(|a| kebab(a)).collect();
            let resource = derive_resource(&op);
            let action = match style {
                OpStyle::Rest => derive_rest_action(&op, !raw_path_args.is_empty()),
                OpStyle::Rpc => derive_rpc_action(&op),
            };
            PlannedOperation {
                canonical_action: action.clone(),
                action,
                alias_of: None,
                resource,
                style,
                path_args,
                raw_path_args,
                op,
            }
        })
        .collect();

    resolve_collisions(&mut planned);

    planned.sort_by(|a, b| {
        a.resource
            .cmp(&b.resource)
            .then_with(|| a.action.cmp(&b.action))
            .then_with(|| a.op.path.cmp(&b.op.path))
            .then_with(|| a.op.method.as_str().cmp(b.op.method.as_str()))
    });
    planned
}

fn classify_style(op: &NormalizedOperation) -> OpStyle {
    if op.path.contains('.') {
        return OpStyle::Rpc;
    }
    let dotted_id = op
        .operation_id
        .as_deref()
        .is_some_and(|id| id.contains('.'));
    if dotted_id && op.method == HttpMethod::Post {
        return OpStyle::Rpc;
    }
    OpStyle::Rest
}

fn derive_resource(op: &NormalizedOperation) -> String {
    // 1. First non-generic tag.
    for tag in &op.tags {
        let k = kebab(tag);
        if !k.is_empty() && !GENERIC_TAGS.contains(&k.as_str()) {
            return pluralize(&k);
        }
    }

    // 2. operationId prefix, when the id carries a separator.
    if let Some(id) = op.operation_id.as_deref() {
        if let Some(prefix) = id_prefix(id) {
            let k = kebab(prefix);
            if k == "ping" {
                return k;
            }
            if !k.is_empty() {
                return pluralize(&k);
            }
        }
    }

    // 3. First non-parameter path segment.
    for segment in op.path.split('/') {
        if segment.is_empty() || segment.starts_with('{') {
            continue;
        }
        let head = segment.split('.').next().unwrap_or(segment);
        let k = kebab(head);
        if k.is_empty() {
            continue;
        }
        if k == "ping" {
            return k;
        }
        return pluralize(&k);
    }

    "api".to_string()
}

fn derive_rest_action(op: &NormalizedOperation, has_path_args: bool) -> String {
    if let Some(id) = op.operation_id.as_deref() {
        if let Some(suffix) = id_suffix(id) {
            if let Some(canonical) = canonical_verb(&kebab(suffix)) {
                return canonical.to_string();
            }
        }
    }

    match (op.method, has_path_args) {
        (HttpMethod::Get, false) => "list".to_string(),
        (HttpMethod::Post, false) => "create".to_string(),
        (HttpMethod::Get, true) => "get".to_string(),
        (HttpMethod::Put, true) | (HttpMethod::Patch, true) => "update".to_string(),
        (HttpMethod::Delete, true) => "delete".to_string(),
        _ => op.method.lower(),
    }
}

fn derive_rpc_action(op: &NormalizedOperation) -> String {
    if let Some(id) = op.operation_id.as_deref() {
        if let Some(suffix) = id_suffix(id) {
            let k = kebab(suffix);
            if !k.is_empty() {
                return canonical_verb(&k).map(str::to_string).unwrap_or(k);
            }
        }
    }

    // Last dotted component of the final path segment.
    if let Some(segment) = op
        .path
        .split('/')
        .rev()
        .find(|s| !s.is_empty() && !s.starts_with('{'))
    {
        let tail = segment.rsplit('.').next().unwrap_or(segment);
        let k = kebab(tail);
        if !k.is_empty() {
            return canonical_verb(&k).map(str::to_string).unwrap_or(k);
        }
    }

    op.method.lower()
}

/// Prefix of an operationId before the first `.`, `__`, or `_` separator;
/// `None` when the id has no separator.
fn id_prefix(id: &str) -> Option<&str> {
    let candidates = ['.', '_'];
    id.find(candidates).map(|idx| &id[..idx])
}

/// Suffix of an operationId after its last `.`, `__`, or `_` separator.
fn id_suffix(id: &str) -> Option<&str> {
    let idx = id.rfind(['.', '_'])?;
    let suffix = id[idx..].trim_start_matches(['.', '_']);
    (!suffix.is_empty()).then_some(suffix)
}

/// Canonical CRUD verb for a kebab-cased candidate, if it is one.
fn canonical_verb(candidate: &str) -> Option<&'static str> {
    match candidate {
        "get" | "retrieve" | "read" => Some("get"),
        "list" | "search" => Some("list"),
        "create" => Some("create"),
        "update" | "patch" => Some("update"),
        "delete" | "remove" => Some("delete"),
        _ => None,
    }
}

/// Every synonym that canonicalizes to the given action.
fn synonyms_of(action: &str) -> &'static [&'static str] {
    match action {
        "get" => &["get", "retrieve", "read"],
        "list" => &["list", "search"],
        "create" => &["create"],
        "update" => &["update", "patch"],
        "delete" => &["delete", "remove"],
        _ => &[],
    }
}

fn resolve_collisions(planned: &mut [PlannedOperation]) {
    loop {
        let Some(group) = first_collision_group(planned) else {
            return;
        };

        let mut renamed_any = false;
        for &idx in &group {
            let base = planned[idx].canonical_action.clone();
            let suggestion = disambiguator_for(&planned[idx])
                .map(|d| format!("{base}-{d}"))
                .filter(|candidate| {
                    !planned
                        .iter()
                        .enumerate()
                        .any(|(i, p)| i != idx && p.resource == planned[idx].resource && p.action == *candidate)
                });
            if let Some(candidate) = suggestion {
                planned[idx].alias_of = Some(base);
                planned[idx].action = candidate;
                renamed_any = true;
            }
        }

        if !renamed_any {
            // Nothing meaningful to disambiguate by; fall back to positional
            // numeric suffixes in original order.
            for (position, &idx) in group.iter().enumerate() {
                let base = planned[idx].canonical_action.clone();
                planned[idx].alias_of = Some(base.clone());
                planned[idx].action = format!("{base}-{}", position + 1);
            }
        }
    }
}

/// Indices of the first `(resource, action)` group with more than one
/// member, in original order.
fn first_collision_group(planned: &[PlannedOperation]) -> Option<Vec<usize>> {
    for (i, probe) in planned.iter().enumerate() {
        let group: Vec<usize> = planned
            .iter()
            .enumerate()
            .filter(|(_, p)| p.resource == probe.resource && p.action == probe.action)
            .map(|(j, _)| j)
            .collect();
        if group.len() > 1 && group[0] == i {
            return Some(group);
        }
    }
    None
}

/// A meaningful distinguishing fragment for a colliding operation: the
/// operationId with the action synonym and resource words removed, else a
/// distinguishing path segment.
fn disambiguator_for(planned: &PlannedOperation) -> Option<String> {
    let resource = &planned.resource;
    let singular = singularize(resource);

    if let Some(id) = planned.op.operation_id.as_deref() {
        let mut d = kebab(id);
        for synonym in synonyms_of(&planned.canonical_action) {
            if d == *synonym {
                d.clear();
                break;
            }
            if let Some(rest) = d.strip_prefix(&format!("{synonym}-")) {
                d = rest.to_string();
                break;
            }
        }
        d = remove_token_sequence(&d, resource);
        d = remove_token_sequence(&d, &singular);
        if !d.is_empty() && d != planned.canonical_action {
            return Some(d);
        }
    }

    planned
        .op
        .path
        .split('/')
        .rev()
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .map(kebab)
        .find(|k| !k.is_empty() && k != resource && k != &singular)
}

/// Remove a kebab token sequence (e.g. a resource name) from a kebab
/// string, token-aligned, and collapse the dashes left behind.
fn remove_token_sequence(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let needle_tokens: Vec<&str> = needle.split('-').collect();
    let tokens: Vec<&str> = haystack.split('-').filter(|t| !t.is_empty()).collect();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i..].starts_with(&needle_tokens) {
            i += needle_tokens.len();
        } else {
            kept.push(tokens[i]);
            i += 1;
        }
    }
    kept.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::NormalizedOperation;

    fn op(method: HttpMethod, path: &str, operation_id: Option<&str>, tags: &[&str]) -> NormalizedOperation {
        NormalizedOperation {
            method,
            path: path.to_string(),
            operation_id: operation_id.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: None,
            description: None,
            deprecated: false,
            security: None,
            parameters: Vec::new(),
            request_body: None,
        }
    }

    #[test]
    fn rest_verbs_from_method_and_path_shape() {
        let planned = plan(vec![
            op(HttpMethod::Get, "/contacts", None, &[]),
            op(HttpMethod::Post, "/contacts", None, &[]),
            op(HttpMethod::Get, "/contacts/{id}", None, &[]),
            op(HttpMethod::Patch, "/contacts/{id}", None, &[]),
            op(HttpMethod::Delete, "/contacts/{id}", None, &[]),
        ]);
        let actions: Vec<&str> = planned.iter().map(|p| p.action.as_str()).collect();
        assert_eq!(actions, vec!["create", "delete", "get", "list", "update"]);
        assert!(planned.iter().all(|p| p.resource == "contacts"));
    }

    #[test]
    fn tag_beats_operation_id_and_path() {
        let planned = plan(vec![op(
            HttpMethod::Get,
            "/v1/people",
            Some("people_list"),
            &["Contact"],
        )]);
        assert_eq!(planned[0].resource, "contacts");
    }

    #[test]
    fn generic_tags_are_skipped() {
        let planned = plan(vec![op(HttpMethod::Get, "/users", None, &["default"])]);
        assert_eq!(planned[0].resource, "users");
    }

    #[test]
    fn operation_id_suffix_canonicalizes() {
        let planned = plan(vec![op(
            HttpMethod::Get,
            "/users/{id}",
            Some("users_retrieve"),
            &[],
        )]);
        assert_eq!(planned[0].action, "get");
        assert_eq!(planned[0].resource, "users");
    }

    #[test]
    fn dotted_path_is_rpc() {
        let planned = plan(vec![op(
            HttpMethod::Post,
            "/v1/messages.send",
            None,
            &[],
        )]);
        assert_eq!(planned[0].style, OpStyle::Rpc);
        assert_eq!(planned[0].action, "send");
        assert_eq!(planned[0].resource, "v1s");
    }

    #[test]
    fn dotted_post_operation_id_is_rpc() {
        let planned = plan(vec![op(
            HttpMethod::Post,
            "/rpc",
            Some("users.deactivate"),
            &[],
        )]);
        assert_eq!(planned[0].style, OpStyle::Rpc);
        assert_eq!(planned[0].resource, "users");
        assert_eq!(planned[0].action, "deactivate");
    }

    #[test]
    fn ping_is_never_pluralized() {
        let planned = plan(vec![op(HttpMethod::Get, "/ping", None, &[])]);
        assert_eq!(planned[0].resource, "ping");
        assert_eq!(planned[0].action, "list");
    }

    #[test]
    fn collisions_use_operation_id_disambiguator() {
        let planned = plan(vec![
            op(HttpMethod::Get, "/users/{id}", Some("users_get"), &[]),
            op(
                HttpMethod::Get,
                "/users/by-email/{email}",
                Some("getUserByEmail"),
                &[],
            ),
        ]);
        let actions: Vec<&str> = planned.iter().map(|p| p.action.as_str()).collect();
        assert!(actions.contains(&"get"));
        assert!(actions.contains(&"get-by-email"), "got {actions:?}");
        let renamed = planned.iter().find(|p| p.action == "get-by-email").unwrap();
        assert_eq!(renamed.alias_of.as_deref(), Some("get"));
        assert_eq!(renamed.canonical_action, "get");
    }

    #[test]
    fn collisions_fall_back_to_path_segment() {
        let planned = plan(vec![
            op(HttpMethod::Get, "/users", None, &["Users"]),
            op(HttpMethod::Get, "/users/search", None, &["Users"]),
        ]);
        let actions: Vec<&str> = planned.iter().map(|p| p.action.as_str()).collect();
        assert!(actions.contains(&"list"));
        assert!(actions.contains(&"list-search"), "got {actions:?}");
    }

    #[test]
    fn collisions_fall_back_to_numeric_suffix() {
        let planned = plan(vec![
            op(HttpMethod::Get, "/users", None, &[]),
            op(HttpMethod::Get, "/users/", None, &[]),
        ]);
        let mut actions: Vec<&str> = planned.iter().map(|p| p.action.as_str()).collect();
        actions.sort();
        assert_eq!(actions, vec!["list-1", "list-2"]);
    }

    #[test]
    fn pairs_are_unique_and_sorted() {
        let planned = plan(vec![
            op(HttpMethod::Get, "/b", None, &[]),
            op(HttpMethod::Get, "/a", None, &[]),
            op(HttpMethod::Post, "/a", None, &[]),
            op(HttpMethod::Get, "/a/{id}", None, &[]),
        ]);
        let mut pairs: Vec<(String, String)> = planned
            .iter()
            .map(|p| (p.resource.clone(), p.action.clone()))
            .collect();
        let sorted = pairs.clone();
        pairs.dedup();
        assert_eq!(pairs.len(), planned.len(), "pairs must be unique");
        assert_eq!(pairs, sorted, "output must already be sorted");
        assert_eq!(pairs[0].0, "as");
    }

    #[test]
    fn path_args_follow_template_order() {
        let planned = plan(vec![op(
            HttpMethod::Get,
            "/a/{userId}/b/{messageId}",
            None,
            &[],
        )]);
        assert_eq!(planned[0].raw_path_args, vec!["userId", "messageId"]);
        assert_eq!(planned[0].path_args, vec!["user-id", "message-id"]);
    }
}

//! The resource-grouped command catalog: everything the CLI surface and
//! the request builder need about one action, derived once and read-only
//! afterwards.

use indexmap::IndexMap;
use serde_json::Value;

use crate::auth::{derive_summary, AuthSummary};
use crate::index::{HttpMethod, NormalizedRequestBody};
use crate::naming::case::kebab;
use crate::naming::{OpStyle, PlannedOperation};
use crate::params::{self, BodyFlagDef, ParamKind, ParamSpec, ValidationSchemas};

/// One executable action under a resource.
#[derive(Debug, Clone)]
pub struct CommandAction {
    /// `"{spec_id}:{resource}:{action}:{operation-key}"`, kebab throughout.
    pub id: String,
    /// `"METHOD path"` operation identity.
    pub key: String,
    pub resource: String,
    pub action: String,
    pub canonical_action: String,
    pub alias_of: Option<String>,
    pub method: HttpMethod,
    pub path: String,
    pub raw_path_args: Vec<String>,
    pub path_args: Vec<String>,
    /// Positionals in template order, then flags by location and name.
    pub params: Vec<ParamSpec>,
    pub body_flags: Vec<BodyFlagDef>,
    pub validation: ValidationSchemas,
    pub auth: AuthSummary,
    pub request_body: Option<NormalizedRequestBody>,
    pub body_content_type: Option<String>,
    pub request_body_schema: Option<Value>,
    pub style: OpStyle,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub deprecated: bool,
}

impl CommandAction {
    pub fn positionals(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Positional)
    }

    pub fn flags(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.kind == ParamKind::Flag)
    }
}

/// A resource with its actions, sorted by action, path, method.
#[derive(Debug, Clone)]
pub struct CommandResource {
    pub name: String,
    pub actions: Vec<CommandAction>,
}

/// The full catalog, resources sorted alphabetically.
#[derive(Debug, Clone, Default)]
pub struct CommandModel {
    pub resources: Vec<CommandResource>,
}

impl CommandModel {
    pub fn find(&self, resource: &str, action: &str) -> Option<&CommandAction> {
        self.resources
            .iter()
            .find(|r| r.name == resource)?
            .actions
            .iter()
            .find(|a| a.action == action)
    }

    pub fn resource(&self, name: &str) -> Option<&CommandResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn iter_actions(&self) -> impl Iterator<Item = &CommandAction> {
        self.resources.iter().flat_map(|r| r.actions.iter())
    }

    pub fn action_count(&self) -> usize {
        self.resources.iter().map(|r| r.actions.len()).sum()
    }
}

/// Group planned operations into the final catalog.
pub fn build_model(spec_id: &str, planned: &[PlannedOperation]) -> CommandModel {
    let mut grouped: IndexMap<String, Vec<CommandAction>> = IndexMap::new();

    for p in planned {
        let derived = params::derive(&p.op, &p.raw_path_args);
        let key = p.op.key();
        let action = CommandAction {
            id: format!(
                "{spec_id}:{}:{}:{}",
                kebab(&p.resource),
                kebab(&p.action),
                kebab(&key)
            ),
            key,
            resource: p.resource.clone(),
            action: p.action.clone(),
            canonical_action: p.canonical_action.clone(),
            alias_of: p.alias_of.clone(),
            method: p.op.method,
            path: p.op.path.clone(),
            raw_path_args: p.raw_path_args.clone(),
            path_args: p.path_args.clone(),
            params: derived.params,
            body_flags: derived.body_flags,
            validation: derived.validation,
            auth: derive_summary(p.op.security.as_deref()),
            request_body: p.op.request_body.clone(),
            body_content_type: derived.body_content_type,
            request_body_schema: derived.body_schema,
            style: p.style,
            tags: p.op.tags.clone(),
            summary: p.op.summary.clone(),
            deprecated: p.op.deprecated,
        };
        grouped.entry(p.resource.clone()).or_default().push(action);
    }

    let mut resources: Vec<CommandResource> = grouped
        .into_iter()
        .map(|(name, mut actions)| {
            actions.sort_by(|a, b| {
                a.action
                    .cmp(&b.action)
                    .then_with(|| a.path.cmp(&b.path))
                    .then_with(|| a.method.as_str().cmp(b.method.as_str()))
            });
            CommandResource { name, actions }
        })
        .collect();
    resources.sort_by(|a, b| a.name.cmp(&b.name));

    CommandModel { resources }
}

//! Materialize one invocation into a `PreparedRequest`: resolve the
//! server, substitute the path template, place parameters by location,
//! validate against the derived schemas, assemble the body, and inject
//! auth. No I/O happens here.

pub mod body;
pub mod curl;
pub mod validate;

use indexmap::IndexMap;
use serde_json::Value;

use crate::auth::{AuthKind, AuthScheme};
use crate::error::RequestError;
use crate::model::CommandAction;
use crate::naming::case::camel;
use crate::params::{ParamKind, ParamSpec, ParamType};
use crate::parse::parameter::ParamLocation;
use crate::profile::{effective_profile_name, ProfileStore};
use crate::result::{Headers, PreparedRequest, ValidationIssue};
use crate::servers::ServerInfo;
use base64::Engine;

/// One parsed flag value as handed over by the argv layer.
#[derive(Debug, Clone)]
pub enum FlagValue {
    Str(String),
    Many(Vec<String>),
    Bool(bool),
}

/// Parsed inputs of a single invocation. Flag keys are camelCase of the
/// long flag name; dot-notation body-flag keys keep their dots literally.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub positionals: Vec<String>,
    pub flags: IndexMap<String, FlagValue>,
    /// Raw `--body` payload, already read from file or stdin.
    pub raw_body: Option<String>,
    /// `--curl` was requested.
    pub curl: bool,
}

/// Root-level overrides.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub server: Option<String>,
    pub server_vars: IndexMap<String, String>,
    pub headers: Vec<(String, String)>,
    pub auth: Option<String>,
    pub bearer_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
}

/// Defaults baked in at build time; absence means "no default".
#[derive(Debug, Clone, Default)]
pub struct EmbeddedDefaults {
    pub server: Option<String>,
    pub server_vars: IndexMap<String, String>,
    pub auth_scheme: Option<String>,
}

/// Everything the builder needs besides the action and the invocation.
pub struct BuildContext<'a> {
    pub spec_id: &'a str,
    pub servers: &'a [ServerInfo],
    pub auth_schemes: &'a [AuthScheme],
    pub defaults: &'a EmbeddedDefaults,
    pub store: &'a dyn ProfileStore,
}

/// A failed build: input/schema violations surface as a validation
/// result, everything else as an error result.
pub enum BuildFailure {
    Validation(Vec<ValidationIssue>),
    Error(RequestError),
}

impl From<RequestError> for BuildFailure {
    fn from(e: RequestError) -> Self {
        BuildFailure::Error(e)
    }
}

pub fn build_request(
    ctx: &BuildContext<'_>,
    action: &CommandAction,
    invocation: &Invocation,
    globals: &Globals,
) -> Result<PreparedRequest, BuildFailure> {
    let profile = ctx.store.get_profile(None);

    // Server, then its template variables.
    let server = globals
        .server
        .clone()
        .or_else(|| profile.as_ref().and_then(|p| p.server.clone()))
        .or_else(|| ctx.defaults.server.clone())
        .or_else(|| ctx.servers.first().map(|s| s.url.clone()))
        .ok_or(RequestError::NoServer)?;
    let server = resolve_server_vars(&server, ctx, globals)?;

    // Path template → positionals, URL-encoded at substitution sites.
    let path = substitute_path(action, &invocation.positionals)?;

    // Distribute declared flags by location.
    let placed = place_parameters(action, invocation)?;

    let mut headers = Headers::new();
    for (name, value) in &placed.headers {
        headers.set(name, value.clone());
    }

    // Body before auth so the content type lands in its documented slot.
    let assembled = body::assemble(action, invocation)?;
    if let Some(assembled) = &assembled {
        headers.set("Content-Type", assembled.content_type.clone());
    }

    for (name, value) in &globals.headers {
        headers.set(name, value.clone());
    }

    let mut query = placed.query;
    let mut cookies = placed.cookies;
    apply_auth(ctx, action, globals, &mut headers, &mut query, &mut cookies)?;

    if !cookies.is_empty() {
        let joined = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.set("Cookie", joined);
    }

    let url = build_url(&server, &path, &query)?;
    let method = action.method.as_str().to_string();
    let body_text = assembled.map(|b| b.text);
    let curl = curl::render(&method, &url, &headers, body_text.as_deref());

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body: body_text,
        curl,
    })
}

/// Substitute `{var}` placeholders with CLI, embedded, or spec defaults,
/// in that order; any leftover is an error.
fn resolve_server_vars(
    server: &str,
    ctx: &BuildContext<'_>,
    globals: &Globals,
) -> Result<String, RequestError> {
    let names = crate::servers::extract_placeholders(server);
    if names.is_empty() {
        return Ok(server.to_string());
    }
    let spec_defaults = ctx.servers.iter().find(|s| s.url == server);

    let mut resolved = server.to_string();
    let mut missing = Vec::new();
    for name in names {
        let value = globals
            .server_vars
            .get(&name)
            .cloned()
            .or_else(|| ctx.defaults.server_vars.get(&name).cloned())
            .or_else(|| {
                spec_defaults
                    .and_then(|s| s.variables.get(&name))
                    .and_then(|v| v.default.clone())
            });
        match value {
            Some(value) => resolved = resolved.replace(&format!("{{{name}}}"), &value),
            None => missing.push(name),
        }
    }
    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(RequestError::UnresolvedServerVars(missing))
    }
}

fn substitute_path(
    action: &CommandAction,
    positionals: &[String],
) -> Result<String, BuildFailure> {
    let missing: Vec<ValidationIssue> = action
        .raw_path_args
        .iter()
        .enumerate()
        .filter(|(i, _)| positionals.get(*i).is_none())
        .map(|(_, arg)| ValidationIssue {
            path: arg.clone(),
            message: format!("missing required positional '{arg}'"),
            value: None,
        })
        .collect();
    if !missing.is_empty() {
        return Err(BuildFailure::Validation(missing));
    }

    let mut path = action.path.clone();
    for (arg, value) in action.raw_path_args.iter().zip(positionals) {
        let encoded = urlencoding::encode(value);
        path = path.replace(&format!("{{{arg}}}"), &encoded);
    }
    Ok(path)
}

struct PlacedParams {
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

/// Look up each declared flag by its camelCase key, coerce it for
/// validation, and distribute the raw strings into per-location lists.
fn place_parameters(
    action: &CommandAction,
    invocation: &Invocation,
) -> Result<PlacedParams, BuildFailure> {
    let mut placed = PlacedParams {
        query: Vec::new(),
        headers: Vec::new(),
        cookies: Vec::new(),
    };
    let mut issues = Vec::new();
    let mut instances: IndexMap<ParamLocation, serde_json::Map<String, Value>> = IndexMap::new();

    for spec in action.params.iter().filter(|p| p.kind == ParamKind::Flag) {
        let key = camel(spec.flag.trim_start_matches("--"));
        let Some(value) = invocation.flags.get(&key) else {
            continue;
        };

        let strings = string_values(spec, value);
        match coerce_param(spec, &strings, value) {
            Ok(coerced) => {
                instances
                    .entry(spec.raw_location)
                    .or_default()
                    .insert(spec.name.clone(), coerced);
            }
            Err(issue) => issues.push(issue),
        }

        let target = match spec.raw_location {
            ParamLocation::Query => &mut placed.query,
            ParamLocation::Header => &mut placed.headers,
            ParamLocation::Cookie => &mut placed.cookies,
            ParamLocation::Path => continue,
        };
        for s in strings {
            target.push((spec.name.clone(), s));
        }
    }

    for (location, schema) in [
        (ParamLocation::Query, &action.validation.query),
        (ParamLocation::Header, &action.validation.header),
        (ParamLocation::Cookie, &action.validation.cookie),
    ] {
        if let Some(schema) = schema {
            let instance = Value::Object(instances.get(&location).cloned().unwrap_or_default());
            issues.extend(validate::validate_against(schema, &instance));
        }
    }

    if issues.is_empty() {
        Ok(placed)
    } else {
        Err(BuildFailure::Validation(issues))
    }
}

/// Flatten a flag value to its wire strings. Repeatable array flags
/// accept repetition, a JSON array literal, or one comma-joined value.
fn string_values(spec: &ParamSpec, value: &FlagValue) -> Vec<String> {
    if spec.ty == ParamType::Array {
        let raw: Vec<String> = match value {
            FlagValue::Many(values) => values.clone(),
            FlagValue::Str(s) => vec![s.clone()],
            FlagValue::Bool(b) => vec![b.to_string()],
        };
        if raw.len() == 1 {
            return expand_array_literal(&raw[0]);
        }
        return raw;
    }
    match value {
        FlagValue::Str(s) => vec![s.clone()],
        FlagValue::Many(values) => values.last().cloned().into_iter().collect(),
        FlagValue::Bool(b) => vec![b.to_string()],
    }
}

fn expand_array_literal(raw: &str) -> Vec<String> {
    if raw.trim_start().starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
            return items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
        }
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

/// Coerce the raw strings into a typed JSON value for schema validation.
fn coerce_param(
    spec: &ParamSpec,
    strings: &[String],
    value: &FlagValue,
) -> Result<Value, ValidationIssue> {
    if spec.ty == ParamType::Array {
        let item_type = spec.item_type.unwrap_or(ParamType::String);
        let items = strings
            .iter()
            .map(|s| coerce_scalar(item_type, s, &spec.name))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Array(items));
    }
    if let FlagValue::Bool(b) = value {
        return Ok(Value::Bool(*b));
    }
    let raw = strings.first().map(String::as_str).unwrap_or("");
    coerce_scalar(spec.ty, raw, &spec.name)
}

fn coerce_scalar(ty: ParamType, raw: &str, name: &str) -> Result<Value, ValidationIssue> {
    let fail = |expected: &str| ValidationIssue {
        path: name.to_string(),
        message: format!("expected {expected}, got '{raw}'"),
        value: Some(Value::String(raw.to_string())),
    };
    match ty {
        ParamType::Integer => raw.parse::<i64>().map(Value::from).map_err(|_| fail("integer")),
        ParamType::Number => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::from(n)),
            _ => Err(fail("number")),
        },
        ParamType::Boolean => match raw {
            "true" | "" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(fail("boolean")),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Pick the scheme per the priority chain, then apply it.
fn apply_auth(
    ctx: &BuildContext<'_>,
    action: &CommandAction,
    globals: &Globals,
    headers: &mut Headers,
    query: &mut Vec<(String, String)>,
    cookies: &mut Vec<(String, String)>,
) -> Result<(), RequestError> {
    let profile_name = effective_profile_name(ctx.store);
    let stored_token = ctx.store.get_token(ctx.spec_id, &profile_name);

    let scheme = select_scheme(ctx, action, globals, stored_token.is_some())?;
    let Some(scheme) = scheme else {
        return Ok(());
    };

    match scheme.kind {
        AuthKind::HttpBearer | AuthKind::Oauth2 | AuthKind::OpenIdConnect => {
            let token = globals
                .bearer_token
                .clone()
                .or(stored_token)
                .ok_or_else(|| RequestError::MissingCredential {
                    key: scheme.key.clone(),
                    kind: "bearer",
                })?;
            headers.set("Authorization", format!("Bearer {token}"));
        }
        AuthKind::HttpBasic => {
            let (user, pass) = globals
                .username
                .as_deref()
                .zip(globals.password.as_deref())
                .ok_or_else(|| RequestError::MissingCredential {
                    key: scheme.key.clone(),
                    kind: "basic",
                })?;
            let encoded =
                base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
            headers.set("Authorization", format!("Basic {encoded}"));
        }
        AuthKind::ApiKey => {
            let key_value =
                globals
                    .api_key
                    .clone()
                    .ok_or_else(|| RequestError::MissingCredential {
                        key: scheme.key.clone(),
                        kind: "api-key",
                    })?;
            let name = scheme.name.clone().unwrap_or_else(|| "api_key".to_string());
            match scheme.location {
                Some(crate::auth::ApiKeyLocation::Query) => query.push((name, key_value)),
                Some(crate::auth::ApiKeyLocation::Cookie) => cookies.push((name, key_value)),
                _ => headers.set(&name, key_value),
            }
        }
        AuthKind::Unknown => {
            return Err(RequestError::UnknownScheme(scheme.key.clone()));
        }
    }
    Ok(())
}

fn select_scheme<'a>(
    ctx: &'a BuildContext<'_>,
    action: &CommandAction,
    globals: &Globals,
    has_stored_token: bool,
) -> Result<Option<&'a AuthScheme>, RequestError> {
    let by_key = |key: &str| ctx.auth_schemes.iter().find(|s| s.key == key);

    if let Some(key) = globals.auth.as_deref() {
        return by_key(key)
            .map(Some)
            .ok_or_else(|| RequestError::UnknownScheme(key.to_string()));
    }

    if action.auth.none_required() {
        return Ok(None);
    }

    if let Some(key) = ctx
        .store
        .get_profile(None)
        .and_then(|p| p.auth_scheme)
        .filter(|key| by_key(key).is_some())
    {
        return Ok(by_key(&key));
    }

    if let Some(key) = ctx
        .defaults
        .auth_scheme
        .as_deref()
        .filter(|key| by_key(key).is_some())
    {
        return Ok(by_key(key));
    }

    if let Some(key) = action.auth.single_scheme() {
        if let Some(scheme) = by_key(key) {
            return Ok(Some(scheme));
        }
    }

    if ctx.auth_schemes.len() == 1 {
        return Ok(Some(&ctx.auth_schemes[0]));
    }

    if has_stored_token {
        if let Some(key) = action.auth.first_bearer_compatible(ctx.auth_schemes) {
            return Ok(by_key(key));
        }
    }

    Ok(None)
}

/// Join the server base and the templated path, preserving any base path,
/// then append query pairs in order (arrays as repeated keys).
fn build_url(server: &str, path: &str, query: &[(String, String)]) -> Result<String, RequestError> {
    let base = server.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let joined = format!("{base}{path}");
    let mut url = url::Url::parse(&joined).map_err(|e| RequestError::InvalidUrl {
        url: joined.clone(),
        reason: e.to_string(),
    })?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    Ok(url.to_string())
}

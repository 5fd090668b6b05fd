use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no OpenAPI document provided (pass --spec or embed one at build time)")]
    NoSpecProvided,

    #[error("failed to fetch spec from {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),

    #[error("not an OpenAPI 3.x document: {0}")]
    InvalidDocument(String),
}

/// Failures while materializing a request, before any I/O happens.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no server URL available (pass --server or add a servers entry)")]
    NoServer,

    #[error("unresolved server variables: {}", .0.join(", "))]
    UnresolvedServerVars(Vec<String>),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unknown auth scheme '{0}'")]
    UnknownScheme(String),

    #[error("no credential available for {kind} scheme '{key}'")]
    MissingCredential { key: String, kind: &'static str },

    #[error("request body content type '{0}' is not JSON; use --body instead of field flags")]
    NonJsonBody(String),

    #[error("invalid JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

/// Failures at the programmatic dispatch API.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("unknown action '{action}' for resource '{resource}'")]
    UnknownAction { resource: String, action: String },
}

/// Failures from the HTTP fetcher itself.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Transport(String),
}

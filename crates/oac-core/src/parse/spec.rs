use indexmap::IndexMap;
use serde::Deserialize;

use super::operation::PathItem;
use super::security::{SecurityRequirement, SecurityScheme};
use super::server::Server;

/// Info object describing the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,

    pub description: Option<String>,
}

/// Top-level OpenAPI 3.x document, post-dereference.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub openapi: String,

    #[serde(default)]
    pub info: Info,

    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub components: Option<Components>,

    pub security: Option<Vec<SecurityRequirement>>,
}

/// The slice of `components` the pipeline consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(rename = "securitySchemes", default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

use serde::Deserialize;

use super::parameter::Parameter;
use super::request_body::RequestBody;
use super::security::SecurityRequirement;
use super::server::Server;

/// An API operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,

    pub summary: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,

    pub deprecated: Option<bool>,

    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(default)]
    pub servers: Vec<Server>,
}

/// A path item, containing operations keyed by HTTP method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub servers: Vec<Server>,

    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub patch: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub trace: Option<Operation>,
}

use indexmap::IndexMap;
use serde::Deserialize;

/// A raw security scheme as it appears under `components.securitySchemes`.
/// Classification into auth kinds happens in the registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: Option<String>,

    pub description: Option<String>,

    pub name: Option<String>,

    #[serde(rename = "in")]
    pub location: Option<String>,

    pub scheme: Option<String>,

    #[serde(rename = "bearerFormat")]
    pub bearer_format: Option<String>,

    pub flows: Option<OAuthFlows>,

    #[serde(rename = "openIdConnectUrl")]
    pub open_id_connect_url: Option<String>,
}

/// OAuth2 flows configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthFlows {
    pub implicit: Option<OAuthFlow>,
    pub password: Option<OAuthFlow>,
    #[serde(rename = "clientCredentials")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(rename = "authorizationCode")]
    pub authorization_code: Option<OAuthFlow>,
}

/// A single OAuth2 flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthFlow {
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: Option<String>,

    #[serde(rename = "tokenUrl")]
    pub token_url: Option<String>,

    #[serde(rename = "refreshUrl")]
    pub refresh_url: Option<String>,

    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// A security requirement: map of scheme key → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

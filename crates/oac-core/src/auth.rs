//! Security scheme registry and per-operation auth requirements.

use serde::Serialize;

use crate::naming::case::kebab;
use crate::parse::security::{OAuthFlow, SecurityRequirement, SecurityScheme};
use crate::parse::spec::Document;

/// Classified kind of a security scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthKind {
    #[serde(rename = "http-bearer")]
    HttpBearer,
    #[serde(rename = "http-basic")]
    HttpBasic,
    #[serde(rename = "api-key")]
    ApiKey,
    #[serde(rename = "oauth2")]
    Oauth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AuthKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::HttpBearer => "http-bearer",
            AuthKind::HttpBasic => "http-basic",
            AuthKind::ApiKey => "api-key",
            AuthKind::Oauth2 => "oauth2",
            AuthKind::OpenIdConnect => "openIdConnect",
            AuthKind::Unknown => "unknown",
        }
    }

    /// Kinds applied as `Authorization: Bearer <token>`.
    pub fn is_bearer_compatible(&self) -> bool {
        matches!(
            self,
            AuthKind::HttpBearer | AuthKind::Oauth2 | AuthKind::OpenIdConnect
        )
    }
}

/// Where an API key goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

impl ApiKeyLocation {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "header" => Some(ApiKeyLocation::Header),
            "query" => Some(ApiKeyLocation::Query),
            "cookie" => Some(ApiKeyLocation::Cookie),
            _ => None,
        }
    }
}

/// One OAuth2 flow with its scope names sorted.
#[derive(Debug, Clone, Serialize)]
pub struct OAuthFlowInfo {
    pub grant: String,
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    pub scopes: Vec<String>,
}

/// A classified security scheme, keyed by its `securitySchemes` entry name.
#[derive(Debug, Clone, Serialize)]
pub struct AuthScheme {
    pub key: String,
    pub kind: AuthKind,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<ApiKeyLocation>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub description: Option<String>,
    pub oauth_flows: Vec<OAuthFlowInfo>,
    pub openid_connect_url: Option<String>,
}

/// Parse `components.securitySchemes`, sorted by kebab-cased key.
pub fn scheme_registry(doc: &Document) -> Vec<AuthScheme> {
    let mut schemes: Vec<AuthScheme> = doc
        .components
        .iter()
        .flat_map(|c| c.security_schemes.iter())
        .map(|(key, raw)| classify(key, raw))
        .collect();
    schemes.sort_by_key(|s| kebab(&s.key));
    schemes
}

fn classify(key: &str, raw: &SecurityScheme) -> AuthScheme {
    let location = raw.location.as_deref().and_then(ApiKeyLocation::parse);
    let kind = match raw.scheme_type.as_deref() {
        Some("http") => match raw.scheme.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("bearer") => AuthKind::HttpBearer,
            Some(s) if s.eq_ignore_ascii_case("basic") => AuthKind::HttpBasic,
            _ => AuthKind::Unknown,
        },
        Some("apiKey") => {
            if location.is_some() {
                AuthKind::ApiKey
            } else {
                AuthKind::Unknown
            }
        }
        Some("oauth2") => AuthKind::Oauth2,
        Some("openIdConnect") => AuthKind::OpenIdConnect,
        _ => AuthKind::Unknown,
    };

    let mut oauth_flows = Vec::new();
    if let Some(flows) = &raw.flows {
        let mut push_flow = |grant: &str, flow: &Option<OAuthFlow>| {
            if let Some(flow) = flow {
                let mut scopes: Vec<String> = flow.scopes.keys().cloned().collect();
                scopes.sort();
                oauth_flows.push(OAuthFlowInfo {
                    grant: grant.to_string(),
                    authorization_url: flow.authorization_url.clone(),
                    token_url: flow.token_url.clone(),
                    refresh_url: flow.refresh_url.clone(),
                    scopes,
                });
            }
        };
        push_flow("implicit", &flows.implicit);
        push_flow("password", &flows.password);
        push_flow("clientCredentials", &flows.client_credentials);
        push_flow("authorizationCode", &flows.authorization_code);
    }

    AuthScheme {
        key: key.to_string(),
        kind,
        name: raw.name.clone(),
        location,
        scheme: raw.scheme.clone(),
        bearer_format: raw.bearer_format.clone(),
        description: raw.description.clone(),
        oauth_flows,
        openid_connect_url: raw.open_id_connect_url.clone(),
    }
}

/// One scheme reference inside an alternative; all requirements of an
/// alternative must be satisfied together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRequirement {
    pub key: String,
    pub scopes: Vec<String>,
}

/// Ordered list of alternatives; any one suffices. Empty means no auth.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthSummary {
    pub alternatives: Vec<Vec<AuthRequirement>>,
}

impl AuthSummary {
    pub fn none_required(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// The single scheme key, when exactly one alternative names exactly
    /// one scheme.
    pub fn single_scheme(&self) -> Option<&str> {
        match self.alternatives.as_slice() {
            [alt] => match alt.as_slice() {
                [req] => Some(&req.key),
                _ => None,
            },
            _ => None,
        }
    }

    /// First requirement whose scheme is bearer-compatible.
    pub fn first_bearer_compatible<'a>(&'a self, schemes: &'a [AuthScheme]) -> Option<&'a str> {
        for alt in &self.alternatives {
            for req in alt {
                if schemes
                    .iter()
                    .any(|s| s.key == req.key && s.kind.is_bearer_compatible())
                {
                    return Some(&req.key);
                }
            }
        }
        None
    }
}

/// Derive the summary from an operation's effective security.
pub fn derive_summary(security: Option<&[SecurityRequirement]>) -> AuthSummary {
    let Some(requirements) = security else {
        return AuthSummary::default();
    };
    AuthSummary {
        alternatives: requirements
            .iter()
            .map(|req| {
                req.iter()
                    .map(|(key, scopes)| AuthRequirement {
                        key: key.clone(),
                        scopes: scopes.clone(),
                    })
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{load_text, SpecSource};
    use crate::parse;

    fn registry_of(json: &str) -> Vec<AuthScheme> {
        let loaded = load_text(json, SpecSource::Embedded).unwrap();
        scheme_registry(&parse::document(&loaded.doc).unwrap())
    }

    #[test]
    fn classifies_the_common_kinds() {
        let schemes = registry_of(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},"paths":{},
            "components":{"securitySchemes":{
                "bearerAuth": {"type":"http","scheme":"bearer","bearerFormat":"JWT"},
                "basicAuth": {"type":"http","scheme":"basic"},
                "keyAuth": {"type":"apiKey","name":"X-Api-Key","in":"header"},
                "badKey": {"type":"apiKey","name":"k","in":"body"},
                "oidc": {"type":"openIdConnect","openIdConnectUrl":"https://x/.well-known"}
            }}}"#,
        );
        let kind_of = |key: &str| schemes.iter().find(|s| s.key == key).unwrap().kind;
        assert_eq!(kind_of("bearerAuth"), AuthKind::HttpBearer);
        assert_eq!(kind_of("basicAuth"), AuthKind::HttpBasic);
        assert_eq!(kind_of("keyAuth"), AuthKind::ApiKey);
        assert_eq!(kind_of("badKey"), AuthKind::Unknown);
        assert_eq!(kind_of("oidc"), AuthKind::OpenIdConnect);
    }

    #[test]
    fn registry_is_sorted_by_kebab_key() {
        let schemes = registry_of(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},"paths":{},
            "components":{"securitySchemes":{
                "zed": {"type":"http","scheme":"bearer"},
                "ApiKey": {"type":"apiKey","name":"k","in":"query"}
            }}}"#,
        );
        let keys: Vec<&str> = schemes.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["ApiKey", "zed"]);
    }

    #[test]
    fn oauth_scopes_are_sorted() {
        let schemes = registry_of(
            r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},"paths":{},
            "components":{"securitySchemes":{"oauth": {"type":"oauth2","flows":{
                "authorizationCode": {
                    "authorizationUrl":"https://x/auth","tokenUrl":"https://x/token",
                    "scopes": {"write": "", "read": ""}
                }
            }}}}}"#,
        );
        assert_eq!(schemes[0].oauth_flows[0].scopes, vec!["read", "write"]);
    }

    #[test]
    fn empty_security_list_means_no_auth() {
        let summary = derive_summary(Some(&[]));
        assert!(summary.none_required());
    }

    #[test]
    fn single_scheme_detection() {
        let mut req = SecurityRequirement::new();
        req.insert("bearerAuth".to_string(), vec![]);
        let summary = derive_summary(Some(&[req]));
        assert_eq!(summary.single_scheme(), Some("bearerAuth"));
    }
}

use indexmap::IndexMap;
use serde::Deserialize;

/// A server variable for URL templates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerVariable {
    pub default: Option<String>,

    pub description: Option<String>,

    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
}

/// A server URL definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub url: String,

    pub description: Option<String>,

    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
}

use serde::Deserialize;
use serde_json::Value;

/// Parameter location. Anything outside the four OpenAPI locations is
/// discarded at indexing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

/// An API parameter. `name` and `in` are optional here so malformed
/// entries survive deserialization and can be skipped by the indexer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,

    #[serde(rename = "in")]
    pub location: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    pub schema: Option<Value>,
}

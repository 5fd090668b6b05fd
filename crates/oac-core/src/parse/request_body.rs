use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// One entry of a request body's `content` map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<Value>,
}

/// A request body definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

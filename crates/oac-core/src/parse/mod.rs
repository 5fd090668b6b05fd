//! Typed views over the dereferenced OpenAPI document.
//!
//! The loader has already resolved every `$ref`, so the model carries no
//! reference indirection. Fields the pipeline does not consume are simply
//! not declared; schemas stay `serde_json::Value` because they flow into
//! validator compilation and body-flag derivation as-is.

pub mod operation;
pub mod parameter;
pub mod request_body;
pub mod security;
pub mod server;
pub mod spec;

use serde_json::Value;

use crate::error::LoadError;
pub use spec::Document;

/// Deserialize the dereferenced document into the typed model.
pub fn document(doc: &Value) -> Result<Document, LoadError> {
    Ok(serde_json::from_value(doc.clone())?)
}

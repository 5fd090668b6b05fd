//! Spec acquisition and normalization.
//!
//! Picks a source (embedded text wins over `--spec`), sniffs JSON vs YAML,
//! dereferences every `$ref`, and derives the content-addressed fingerprint
//! and spec id the rest of the pipeline keys on.

pub mod canonical;
pub mod deref;

use serde_json::Value;

use crate::error::LoadError;
use crate::naming::case::kebab;

/// Where the spec text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecSource {
    Embedded,
    File(String),
    Url(String),
}

impl SpecSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecSource::Embedded => "embedded",
            SpecSource::File(_) => "file",
            SpecSource::Url(_) => "url",
        }
    }
}

/// The dereferenced document plus its derived identity.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub doc: Value,
    pub source: SpecSource,
    pub fingerprint: String,
    pub spec_id: String,
}

/// File access seam so tests can supply spec text without touching disk.
pub trait SpecRead {
    fn read(&self, path: &str) -> std::io::Result<String>;
}

/// Default reader backed by the filesystem.
pub struct FsRead;

impl SpecRead for FsRead {
    fn read(&self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Inputs for [`load`]. Exactly one source is chosen, embedded first.
pub struct LoadOptions<'a> {
    pub spec: Option<&'a str>,
    pub embedded_text: Option<&'a str>,
    pub reader: &'a dyn SpecRead,
}

/// Load, parse, and dereference the spec from the highest-priority source.
pub fn load(options: &LoadOptions<'_>) -> Result<LoadedSpec, LoadError> {
    if let Some(text) = options.embedded_text {
        return load_text(text, SpecSource::Embedded);
    }
    match options.spec {
        Some(spec) if is_http_url(spec) => {
            let text = fetch_url(spec)?;
            load_text(&text, SpecSource::Url(spec.to_string()))
        }
        Some(path) => {
            let text = options.reader.read(path).map_err(|source| LoadError::Read {
                path: path.to_string(),
                source,
            })?;
            load_text(&text, SpecSource::File(path.to_string()))
        }
        None => Err(LoadError::NoSpecProvided),
    }
}

/// Parse and normalize already-acquired spec text.
pub fn load_text(text: &str, source: SpecSource) -> Result<LoadedSpec, LoadError> {
    let raw = parse_text(text)?;
    validate(&raw)?;
    let doc = deref::dereference(&raw)?;
    let fingerprint = canonical::fingerprint(&doc);
    let spec_id = derive_spec_id(&doc, &fingerprint);
    log::debug!("loaded spec {spec_id} ({} bytes, {source:?})", text.len());
    Ok(LoadedSpec {
        doc,
        source,
        fingerprint,
        spec_id,
    })
}

/// JSON when the first significant byte is `{` or `[`, YAML otherwise.
fn parse_text(text: &str) -> Result<Value, LoadError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Ok(serde_json::from_str(trimmed)?)
    } else {
        let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str(text)?;
        Ok(yaml_to_json(yaml))
    }
}

/// YAML → JSON value conversion. YAML allows non-string mapping keys
/// (unquoted `200:` status codes are integers); those are stringified
/// rather than rejected.
fn yaml_to_json(yaml: serde_yaml_ng::Value) -> Value {
    use serde_yaml_ng::Value as Yaml;
    match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut out = serde_json::Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Number(n) => n.to_string(),
                    other => {
                        log::warn!("dropping mapping entry with non-scalar key {other:?}");
                        continue;
                    }
                };
                out.insert(key, yaml_to_json(value));
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn validate(doc: &Value) -> Result<(), LoadError> {
    let Some(obj) = doc.as_object() else {
        return Err(LoadError::InvalidDocument(
            "document root is not an object".to_string(),
        ));
    };
    match obj.get("openapi").and_then(Value::as_str) {
        Some(version) if version.starts_with("3.") => Ok(()),
        Some(version) => Err(LoadError::InvalidDocument(format!(
            "unsupported openapi version '{version}'"
        ))),
        None => Err(LoadError::InvalidDocument(
            "missing 'openapi' version field".to_string(),
        )),
    }
}

/// Kebab-cased `info.title` when non-empty, else a fingerprint prefix.
fn derive_spec_id(doc: &Value, fingerprint: &str) -> String {
    let title = doc
        .pointer("/info/title")
        .and_then(Value::as_str)
        .map(kebab)
        .unwrap_or_default();
    if title.is_empty() {
        fingerprint[..12].to_string()
    } else {
        title
    }
}

fn is_http_url(spec: &str) -> bool {
    spec.starts_with("http://") || spec.starts_with("https://")
}

fn fetch_url(url: &str) -> Result<String, LoadError> {
    let response = reqwest::blocking::get(url).map_err(|e| LoadError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !response.status().is_success() {
        return Err(LoadError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status().as_u16()),
        });
    }
    response.text().map_err(|e| LoadError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticRead(&'static str);

    impl SpecRead for StaticRead {
        fn read(&self, _path: &str) -> std::io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    const MINIMAL_JSON: &str = r#"{"openapi":"3.0.3","info":{"title":"Pet API","version":"1.0"},"paths":{}}"#;

    #[test]
    fn embedded_text_wins_over_spec_path() {
        let reader = StaticRead(r#"{"openapi":"3.0.0","info":{"title":"Other"},"paths":{}}"#);
        let loaded = load(&LoadOptions {
            spec: Some("ignored.json"),
            embedded_text: Some(MINIMAL_JSON),
            reader: &reader,
        })
        .unwrap();
        assert_eq!(loaded.source, SpecSource::Embedded);
        assert_eq!(loaded.spec_id, "pet-api");
    }

    #[test]
    fn yaml_is_sniffed_by_leading_byte() {
        let yaml = "openapi: \"3.1.0\"\ninfo:\n  title: Yaml API\n  version: \"2\"\npaths: {}\n";
        let loaded = load_text(yaml, SpecSource::Embedded).unwrap();
        assert_eq!(loaded.spec_id, "yaml-api");
    }

    #[test]
    fn yaml_integer_keys_are_stringified() {
        let yaml = "openapi: \"3.0.0\"\ninfo:\n  title: T\npaths:\n  /x:\n    get:\n      responses:\n        200:\n          description: ok\n";
        let loaded = load_text(yaml, SpecSource::Embedded).unwrap();
        assert!(loaded
            .doc
            .pointer("/paths/~1x/get/responses/200/description")
            .is_some());
    }

    #[test]
    fn missing_source_is_rejected() {
        let err = load(&LoadOptions {
            spec: None,
            embedded_text: None,
            reader: &FsRead,
        })
        .unwrap_err();
        assert!(matches!(err, LoadError::NoSpecProvided));
    }

    #[test]
    fn swagger_two_is_rejected() {
        let text = r#"{"openapi":"2.0","info":{"title":"Old"},"paths":{}}"#;
        let err = load_text(text, SpecSource::Embedded).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDocument(_)));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = load_text("[1, 2]", SpecSource::Embedded).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDocument(_)));
    }

    #[test]
    fn empty_title_falls_back_to_fingerprint_prefix() {
        let text = r#"{"openapi":"3.0.0","info":{"title":""},"paths":{}}"#;
        let loaded = load_text(text, SpecSource::Embedded).unwrap();
        assert_eq!(loaded.spec_id.len(), 12);
        assert!(loaded.fingerprint.starts_with(&loaded.spec_id));
    }

    #[test]
    fn identical_content_yields_identical_identity() {
        let a = load_text(MINIMAL_JSON, SpecSource::Embedded).unwrap();
        let b = load_text(MINIMAL_JSON, SpecSource::File("x.json".into())).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.spec_id, b.spec_id);
    }
}

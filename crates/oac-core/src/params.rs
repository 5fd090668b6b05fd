//! Derive CLI-facing parameter specs from an operation: positionals for
//! path variables, kebab-cased flags for everything else, dot-notation
//! body flags for scalar leaves of a JSON body, and the per-location
//! schemas the request builder validates against.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::index::{NormalizedOperation, NormalizedRequestBody};
use crate::naming::case::kebab;
use crate::parse::parameter::ParamLocation;

/// Long flag names reserved by the CLI surface itself.
pub const RESERVED_FLAGS: [&str; 2] = ["curl", "body"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Positional,
    Flag,
}

/// Scalar-ish JSON type of a parameter or body leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Unknown,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Unknown => "unknown",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ParamType::String | ParamType::Number | ParamType::Integer | ParamType::Boolean
        )
    }
}

/// One derived positional or flag.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    #[serde(rename = "in")]
    pub location: &'static str,
    pub name: String,
    pub flag: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub format: Option<String>,
    #[serde(rename = "enum")]
    pub enum_values: Vec<String>,
    pub item_type: Option<ParamType>,
    pub item_format: Option<String>,
    pub item_enum: Vec<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub schema: Option<Value>,
    #[serde(skip)]
    pub raw_location: ParamLocation,
}

/// A flag generated from one scalar leaf of the request body schema.
#[derive(Debug, Clone, Serialize)]
pub struct BodyFlagDef {
    pub flag: String,
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub description: String,
    pub required: bool,
}

/// Per-location validation schemas; absent when a location has no params.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSchemas {
    pub query: Option<Value>,
    pub header: Option<Value>,
    pub cookie: Option<Value>,
}

/// Derived parameter surface of one operation.
#[derive(Debug, Clone)]
pub struct DerivedParams {
    /// All params: positionals in template order first, then flags
    /// ordered by location then name.
    pub params: Vec<ParamSpec>,
    pub body_flags: Vec<BodyFlagDef>,
    pub validation: ValidationSchemas,
    /// The preferred content type and its schema, when a body exists.
    pub body_content_type: Option<String>,
    pub body_schema: Option<Value>,
}

impl DerivedParams {
    pub fn positionals(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Positional)
    }

    pub fn flags(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.kind == ParamKind::Flag)
    }
}

/// Derive the full parameter surface for one operation.
pub fn derive(op: &NormalizedOperation, raw_path_args: &[String]) -> DerivedParams {
    let mut params = Vec::new();

    // Positionals mirror the path template, not the declared parameter
    // list; declared path params contribute their schema when present.
    for arg in raw_path_args {
        let declared = op
            .parameters
            .iter()
            .find(|p| p.location == ParamLocation::Path && &p.name == arg);
        params.push(param_spec(
            ParamKind::Positional,
            ParamLocation::Path,
            arg,
            true,
            declared.and_then(|p| p.description.clone()),
            declared.and_then(|p| p.schema.as_ref()),
        ));
    }

    let mut flags: Vec<ParamSpec> = op
        .parameters
        .iter()
        .filter(|p| p.location != ParamLocation::Path)
        .map(|p| {
            param_spec(
                ParamKind::Flag,
                p.location,
                &p.name,
                p.required,
                p.description.clone(),
                p.schema.as_ref(),
            )
        })
        .collect();
    flags.sort_by(|a, b| {
        a.raw_location
            .cmp(&b.raw_location)
            .then_with(|| a.name.cmp(&b.name))
    });

    let validation = validation_schemas(&flags);
    params.extend(flags);

    let (body_content_type, body_schema) = op
        .request_body
        .as_ref()
        .and_then(preferred_content)
        .map(|(ct, schema)| (Some(ct), Some(schema)))
        .unwrap_or((None, None));

    let body_flags = body_schema
        .as_ref()
        .map(|schema| {
            let taken: Vec<&str> = params
                .iter()
                .map(|p| p.flag.trim_start_matches("--"))
                .chain(RESERVED_FLAGS)
                .collect();
            body_flag_defs(schema, &taken)
        })
        .unwrap_or_default();

    DerivedParams {
        params,
        body_flags,
        validation,
        body_content_type,
        body_schema,
    }
}

/// Preferred body content type: `application/json`, else anything
/// containing `json`, else the first entry.
pub fn preferred_content(body: &NormalizedRequestBody) -> Option<(String, Value)> {
    let pick = body
        .content_types
        .iter()
        .find(|ct| ct.as_str() == "application/json")
        .or_else(|| body.content_types.iter().find(|ct| ct.contains("json")))
        .or_else(|| body.content_types.first())?;
    let schema = body
        .schema_by_content_type
        .get(pick)
        .cloned()
        .unwrap_or(Value::Null);
    Some((pick.clone(), schema))
}

fn param_spec(
    kind: ParamKind,
    location: ParamLocation,
    name: &str,
    required: bool,
    description: Option<String>,
    schema: Option<&Value>,
) -> ParamSpec {
    let shape = TypeShape::of(schema);
    let item_shape = schema
        .and_then(|s| s.get("items"))
        .map(|items| TypeShape::of(Some(items)));

    ParamSpec {
        kind,
        location: location.as_str(),
        name: name.to_string(),
        flag: format!("--{}", kebab(name)),
        required,
        ty: shape.ty,
        format: shape.format,
        enum_values: shape.enum_values,
        item_type: item_shape.as_ref().map(|s| s.ty),
        item_format: item_shape.as_ref().and_then(|s| s.format.clone()),
        item_enum: item_shape.map(|s| s.enum_values).unwrap_or_default(),
        description,
        schema: schema.cloned(),
        raw_location: location,
    }
}

/// Extracted `(type, format, enum)` of a schema, tolerant of the 3.1
/// type-array form: the first non-null entry wins.
struct TypeShape {
    ty: ParamType,
    format: Option<String>,
    enum_values: Vec<String>,
}

impl TypeShape {
    fn of(schema: Option<&Value>) -> Self {
        let Some(schema) = schema else {
            return TypeShape {
                ty: ParamType::Unknown,
                format: None,
                enum_values: Vec::new(),
            };
        };
        let ty = match schema.get("type") {
            Some(Value::String(s)) => type_from_str(s),
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_str)
                .find(|s| *s != "null")
                .map(type_from_str)
                .unwrap_or(ParamType::Unknown),
            _ => ParamType::Unknown,
        };
        let format = schema
            .get("format")
            .and_then(Value::as_str)
            .map(str::to_string);
        // Only string-valued enum members surface on the CLI.
        let enum_values = schema
            .get("enum")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        TypeShape {
            ty,
            format,
            enum_values,
        }
    }
}

fn type_from_str(s: &str) -> ParamType {
    match s {
        "string" => ParamType::String,
        "number" => ParamType::Number,
        "integer" => ParamType::Integer,
        "boolean" => ParamType::Boolean,
        "array" => ParamType::Array,
        "object" => ParamType::Object,
        _ => ParamType::Unknown,
    }
}

/// Walk an object schema's scalar leaves, emitting one dot-joined flag per
/// leaf. Names colliding with operation flags or reserved built-ins are
/// skipped, as are arrays and non-object composites.
pub fn body_flag_defs(schema: &Value, taken_flags: &[&str]) -> Vec<BodyFlagDef> {
    let mut defs = Vec::new();
    if TypeShape::of(Some(schema)).ty != ParamType::Object && schema.get("properties").is_none() {
        return defs;
    }
    walk_body(schema, &mut Vec::new(), true, taken_flags, &mut defs);
    defs
}

fn walk_body(
    schema: &Value,
    path: &mut Vec<String>,
    required_so_far: bool,
    taken: &[&str],
    out: &mut Vec<BodyFlagDef>,
) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let required_names: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    for (name, prop) in properties {
        let shape = TypeShape::of(Some(prop));
        let required = required_so_far && required_names.contains(&name.as_str());
        path.push(name.clone());
        if shape.ty.is_scalar() {
            let flag_name = path.join(".");
            if taken.contains(&flag_name.as_str()) {
                log::warn!("skipping body flag --{flag_name}: name already taken");
            } else {
                out.push(BodyFlagDef {
                    flag: format!("--{flag_name}"),
                    path: path.clone(),
                    ty: shape.ty,
                    description: prop
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    required,
                });
            }
        } else if shape.ty == ParamType::Object || prop.get("properties").is_some() {
            walk_body(prop, path, required, taken, out);
        }
        path.pop();
    }
}

/// Object schemas for the query/header/cookie parameter sets.
fn validation_schemas(flags: &[ParamSpec]) -> ValidationSchemas {
    ValidationSchemas {
        query: location_schema(flags, ParamLocation::Query),
        header: location_schema(flags, ParamLocation::Header),
        cookie: location_schema(flags, ParamLocation::Cookie),
    }
}

fn location_schema(flags: &[ParamSpec], location: ParamLocation) -> Option<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for spec in flags.iter().filter(|p| p.raw_location == location) {
        properties.insert(
            spec.name.clone(),
            spec.schema.clone().unwrap_or_else(|| json!({})),
        );
        if spec.required {
            required.push(Value::String(spec.name.clone()));
        }
    }
    if properties.is_empty() {
        return None;
    }
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Some(Value::Object(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{HttpMethod, NormalizedParameter};
    use indexmap::IndexMap;

    fn base_op() -> NormalizedOperation {
        NormalizedOperation {
            method: HttpMethod::Get,
            path: "/contacts/{contactId}".to_string(),
            operation_id: None,
            tags: Vec::new(),
            summary: None,
            description: None,
            deprecated: false,
            security: None,
            parameters: Vec::new(),
            request_body: None,
        }
    }

    fn param(name: &str, location: ParamLocation, required: bool, schema: Value) -> NormalizedParameter {
        NormalizedParameter {
            location,
            name: name.to_string(),
            required,
            description: None,
            schema: Some(schema),
        }
    }

    #[test]
    fn path_params_become_positionals_in_template_order() {
        let mut op = base_op();
        op.path = "/a/{second}/{first}".to_string();
        op.parameters = vec![
            param("first", ParamLocation::Path, true, json!({"type":"string"})),
            param("second", ParamLocation::Path, true, json!({"type":"string"})),
        ];
        let derived = derive(&op, &["second".to_string(), "first".to_string()]);
        let names: Vec<&str> = derived.positionals().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn flags_are_kebab_cased_and_ordered() {
        let mut op = base_op();
        op.parameters = vec![
            param("X-Request-Id", ParamLocation::Header, false, json!({"type":"string"})),
            param("pageSize", ParamLocation::Query, false, json!({"type":"integer"})),
            param("filter", ParamLocation::Query, false, json!({"type":"string"})),
        ];
        let derived = derive(&op, &[]);
        let flags: Vec<&str> = derived.flags().map(|p| p.flag.as_str()).collect();
        assert_eq!(flags, vec!["--filter", "--page-size", "--x-request-id"]);
    }

    #[test]
    fn array_params_carry_item_shape() {
        let mut op = base_op();
        op.parameters = vec![param(
            "tag",
            ParamLocation::Query,
            false,
            json!({"type":"array","items":{"type":"string","enum":["a","b"]}}),
        )];
        let derived = derive(&op, &[]);
        let spec = derived.flags().next().unwrap();
        assert_eq!(spec.ty, ParamType::Array);
        assert_eq!(spec.item_type, Some(ParamType::String));
        assert_eq!(spec.item_enum, vec!["a", "b"]);
    }

    #[test]
    fn nullable_type_array_takes_first_non_null() {
        let mut op = base_op();
        op.parameters = vec![param(
            "name",
            ParamLocation::Query,
            false,
            json!({"type":["string","null"]}),
        )];
        let derived = derive(&op, &[]);
        assert_eq!(derived.flags().next().unwrap().ty, ParamType::String);
    }

    #[test]
    fn body_flags_expand_scalar_leaves_with_dots() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "address": {
                    "type": "object",
                    "properties": {
                        "street": {"type": "string"},
                        "city": {"type": "string"}
                    }
                },
                "labels": {"type": "array", "items": {"type": "string"}}
            }
        });
        let defs = body_flag_defs(&schema, &["curl"]);
        let flags: Vec<&str> = defs.iter().map(|d| d.flag.as_str()).collect();
        assert!(flags.contains(&"--name"));
        assert!(flags.contains(&"--address.street"));
        assert!(flags.contains(&"--address.city"));
        assert!(!flags.iter().any(|f| f.contains("labels")), "arrays are not expanded");

        let name = defs.iter().find(|d| d.flag == "--name").unwrap();
        assert!(name.required);
        let city = defs.iter().find(|d| d.flag == "--address.city").unwrap();
        assert!(!city.required, "nested optional chain is not required");
    }

    #[test]
    fn nested_required_needs_the_whole_chain() {
        let schema = json!({
            "type": "object",
            "required": ["address"],
            "properties": {
                "address": {
                    "type": "object",
                    "required": ["city"],
                    "properties": {"city": {"type": "string"}, "zip": {"type": "string"}}
                }
            }
        });
        let defs = body_flag_defs(&schema, &[]);
        let city = defs.iter().find(|d| d.flag == "--address.city").unwrap();
        assert!(city.required);
        let zip = defs.iter().find(|d| d.flag == "--address.zip").unwrap();
        assert!(!zip.required);
    }

    #[test]
    fn body_flags_skip_taken_names() {
        let schema = json!({
            "type": "object",
            "properties": {"limit": {"type": "integer"}, "curl": {"type": "string"}}
        });
        let defs = body_flag_defs(&schema, &["limit", "curl"]);
        assert!(defs.is_empty());
    }

    #[test]
    fn validation_schema_collects_required_per_location() {
        let mut op = base_op();
        op.parameters = vec![
            param("limit", ParamLocation::Query, true, json!({"type":"integer"})),
            param("name", ParamLocation::Query, false, json!({"type":"string"})),
        ];
        let derived = derive(&op, &[]);
        let query = derived.validation.query.as_ref().unwrap();
        assert_eq!(query["required"], json!(["limit"]));
        assert!(derived.validation.header.is_none());
        assert!(derived.validation.cookie.is_none());
    }

    #[test]
    fn preferred_content_type_prefers_json() {
        let mut schemas = IndexMap::new();
        schemas.insert("text/plain".to_string(), json!({}));
        schemas.insert("application/vnd.api+json".to_string(), json!({"type":"object"}));
        let body = NormalizedRequestBody {
            required: true,
            content_types: vec!["text/plain".into(), "application/vnd.api+json".into()],
            schema_by_content_type: schemas,
        };
        let (ct, _) = preferred_content(&body).unwrap();
        assert_eq!(ct, "application/vnd.api+json");
    }
}

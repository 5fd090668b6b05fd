use oac_core::introspect::{minimal_payload, schema_payload};
use oac_core::load::canonical::to_canonical_string;
use oac_core::load::{load_text, SpecSource};
use oac_core::ApiContext;

const CONTACTS: &str = include_str!("fixtures/contacts.yaml");
const PETSTORE: &str = include_str!("fixtures/petstore.json");

fn context(text: &str) -> ApiContext {
    let loaded = load_text(text, SpecSource::Embedded).expect("fixture loads");
    ApiContext::from_loaded(loaded).expect("pipeline succeeds")
}

#[test]
fn schema_output_is_byte_identical_across_builds() {
    let a = to_canonical_string(&schema_payload(&context(CONTACTS)));
    let b = to_canonical_string(&schema_payload(&context(CONTACTS)));
    assert_eq!(a, b);
}

#[test]
fn payload_carries_identity_and_counts() {
    let ctx = context(CONTACTS);
    let payload = schema_payload(&ctx);
    assert_eq!(payload["schemaVersion"], 1);
    assert_eq!(payload["openapi"]["version"], "3.0.3");
    assert_eq!(payload["openapi"]["title"], "Contact API");
    assert_eq!(payload["spec"]["id"], "contact-api");
    assert_eq!(payload["spec"]["source"], "embedded");
    assert_eq!(
        payload["spec"]["fingerprint"].as_str().unwrap(),
        ctx.spec.fingerprint
    );
    assert_eq!(payload["capabilities"]["commands"], 4);
    assert_eq!(payload["capabilities"]["operations"], 4);
    assert_eq!(payload["capabilities"]["auth"], 1);
    assert_eq!(payload["capabilities"]["servers"], 1);
}

#[test]
fn minimal_payload_omits_the_heavy_sections() {
    let ctx = context(CONTACTS);
    let full = schema_payload(&ctx);
    let minimal = minimal_payload(&ctx);
    for key in ["operations", "planned", "commandsIndex"] {
        assert!(full.get(key).is_some(), "full payload keeps {key}");
        assert!(minimal.get(key).is_none(), "minimal payload drops {key}");
    }
    assert!(minimal.get("commands").is_some());
}

#[test]
fn commands_index_maps_pairs_to_action_ids() {
    let ctx = context(PETSTORE);
    let payload = schema_payload(&ctx);
    let index = payload["commandsIndex"].as_object().unwrap();
    let id = index["pets:get"].as_str().unwrap();
    assert!(id.starts_with("petstore:pets:get:"));
    assert_eq!(index.len(), ctx.model.action_count());
}

#[test]
fn planned_section_records_the_naming_decisions() {
    let ctx = context(PETSTORE);
    let payload = schema_payload(&ctx);
    let planned = payload["planned"].as_array().unwrap();
    let retrieve = planned
        .iter()
        .find(|p| p["key"] == "GET /pets/{petId}")
        .unwrap();
    assert_eq!(retrieve["resource"], "pets");
    assert_eq!(retrieve["action"], "get");
    assert_eq!(retrieve["style"], "rest");
    assert_eq!(retrieve["rawPathArgs"][0], "petId");
    assert_eq!(retrieve["pathArgs"][0], "pet-id");
}

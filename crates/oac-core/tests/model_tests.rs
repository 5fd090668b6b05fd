use std::collections::HashSet;

use oac_core::load::{load_text, SpecSource};
use oac_core::ApiContext;

const CONTACTS: &str = include_str!("fixtures/contacts.yaml");
const PETSTORE: &str = include_str!("fixtures/petstore.json");
const SECURED: &str = include_str!("fixtures/secured.json");

fn context(text: &str) -> ApiContext {
    let loaded = load_text(text, SpecSource::Embedded).expect("fixture loads");
    ApiContext::from_loaded(loaded).expect("pipeline succeeds")
}

#[test]
fn contacts_tree_has_the_expected_commands() {
    let ctx = context(CONTACTS);
    let resources: Vec<&str> = ctx.model.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(resources, vec!["contacts", "items", "users"]);

    let actions: Vec<&str> = ctx
        .model
        .resource("contacts")
        .unwrap()
        .actions
        .iter()
        .map(|a| a.action.as_str())
        .collect();
    assert_eq!(actions, vec!["create", "list"]);
    assert!(ctx.model.find("users", "get").is_some());
}

#[test]
fn operation_id_suffixes_drive_petstore_actions() {
    let ctx = context(PETSTORE);
    let pets = ctx.model.resource("pets").expect("pets resource");
    let actions: Vec<&str> = pets.actions.iter().map(|a| a.action.as_str()).collect();
    // pets_retrieve → get, pets_remove → delete via the synonym map.
    assert_eq!(actions, vec!["create", "delete", "get", "list"]);
}

#[test]
fn resource_action_pairs_are_unique() {
    for fixture in [CONTACTS, PETSTORE, SECURED] {
        let ctx = context(fixture);
        let mut seen = HashSet::new();
        for action in ctx.model.iter_actions() {
            assert!(
                seen.insert((action.resource.clone(), action.action.clone())),
                "duplicate pair {}/{}",
                action.resource,
                action.action
            );
        }
    }
}

#[test]
fn every_template_variable_is_a_positional_in_order() {
    for fixture in [CONTACTS, PETSTORE] {
        let ctx = context(fixture);
        for action in ctx.model.iter_actions() {
            let names: Vec<&str> = action.positionals().map(|p| p.name.as_str()).collect();
            let expected: Vec<&str> = action.raw_path_args.iter().map(String::as_str).collect();
            assert_eq!(names, expected, "positionals for {}", action.key);
        }
    }
}

#[test]
fn flag_long_names_are_unique_per_action() {
    for fixture in [CONTACTS, PETSTORE] {
        let ctx = context(fixture);
        for action in ctx.model.iter_actions() {
            let mut seen = HashSet::new();
            for flag in action
                .flags()
                .map(|f| f.flag.clone())
                .chain(action.body_flags.iter().map(|b| b.flag.clone()))
            {
                assert!(seen.insert(flag.clone()), "duplicate {flag} in {}", action.key);
                assert_ne!(flag, "--curl", "--curl is reserved");
            }
        }
    }
}

#[test]
fn security_override_disables_auth_for_one_operation() {
    let ctx = context(SECURED);
    let open = ctx.model.find("opens", "list").expect("open action");
    assert!(open.auth.none_required());

    let locked = ctx.model.find("lockeds", "list").expect("locked action");
    assert_eq!(locked.auth.alternatives.len(), 1);
    assert_eq!(locked.auth.alternatives[0][0].key, "bearerAuth");
}

#[test]
fn same_bytes_build_the_same_tree_twice() {
    let a = context(CONTACTS);
    let b = context(CONTACTS);
    assert_eq!(a.spec.fingerprint, b.spec.fingerprint);
    let ids_a: Vec<&str> = a.model.iter_actions().map(|x| x.id.as_str()).collect();
    let ids_b: Vec<&str> = b.model.iter_actions().map(|x| x.id.as_str()).collect();
    assert_eq!(ids_a, ids_b);
}

#[test]
fn body_flags_cover_nested_scalars_only() {
    let ctx = context(CONTACTS);
    let create = ctx.model.find("contacts", "create").unwrap();
    let flags: HashSet<&str> = create.body_flags.iter().map(|b| b.flag.as_str()).collect();
    assert_eq!(
        flags,
        HashSet::from(["--name", "--address.street", "--address.city"])
    );
    let by_flag = |name: &str| create.body_flags.iter().find(|b| b.flag == name).unwrap();
    assert!(by_flag("--name").required);
    assert!(!by_flag("--address.city").required);
}

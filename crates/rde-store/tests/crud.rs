//! Tests for the standalone entity repositories.

use rde_model::SetId;
use rde_store::{Store, StoreError};

fn store() -> Store {
    Store::open_in_memory().expect("open in-memory store")
}

#[test]
fn person_round_trip_and_search() {
    let mut store = store();
    let mut person = store
        .add_person("Charlotte Reader", "0000-0002", "https://example.org/cr")
        .expect("add person");
    assert_eq!(store.get_person(person.id).expect("get person"), person);

    person.name = "Charlotte B. Reader".to_string();
    store.update_person(&person).expect("update person");
    assert_eq!(store.get_person(person.id).expect("get person").name, person.name);

    let hits = store.search_persons("reader").expect("search persons");
    assert_eq!(hits.len(), 1);
    assert!(store.search_persons("nobody").expect("search persons").is_empty());

    store.delete_person(person.id).expect("delete person");
    assert!(matches!(
        store.get_person(person.id),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn updating_missing_person_is_not_found() {
    let mut store = store();
    let ghost = rde_model::Person {
        id: 99,
        name: "Ghost".to_string(),
        orcid: String::new(),
        url: String::new(),
    };
    assert!(matches!(
        store.update_person(&ghost),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn organization_round_trip() {
    let mut store = store();
    let mut org = store
        .add_organization("Radiological Society", "RSNA", "https://rsna.org")
        .expect("add organization");
    org.abbreviation = "RS".to_string();
    store.update_organization(&org).expect("update organization");
    assert_eq!(
        store.get_organization(org.id).expect("get organization").abbreviation,
        "RS"
    );
    assert_eq!(store.search_organizations("radiological").expect("search").len(), 1);
    store.delete_organization(org.id).expect("delete organization");
    assert!(store.list_organizations().expect("list").is_empty());
}

#[test]
fn reference_round_trip() {
    let mut store = store();
    let mut reference = store
        .add_reference("Doe J. CT of the chest.", "10.1000/xyz", "12345", "")
        .expect("add reference");
    reference.pubmed_id = "54321".to_string();
    store.update_reference(&reference).expect("update reference");
    assert_eq!(
        store.get_reference(reference.id).expect("get reference").pubmed_id,
        "54321"
    );
    store.delete_reference(reference.id).expect("delete reference");
    assert!(matches!(
        store.get_reference(reference.id),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn index_code_round_trip_and_search() {
    let mut store = store();
    let code = store
        .add_index_code("RID1301", "RADLEX", "lung", "https://radlex.org/RID1301")
        .expect("add code");
    assert_eq!(store.get_index_code(code.id).expect("get code"), code);
    assert_eq!(store.search_index_codes("rid13").expect("search codes").len(), 1);
    store.delete_index_code(code.id).expect("delete code");
    assert!(store.list_index_codes().expect("list codes").is_empty());
}

#[test]
fn deleting_person_removes_their_role_links() {
    let mut store = store();
    let set_id = store
        .create_module(r#"<ReportingModule Id="M"><DataElements/></ReportingModule>"#)
        .expect("create module");
    let person = store.add_person("A. Author", "", "").expect("add person");
    store.link_person(set_id, person.id, Some("author")).expect("link person");

    store.delete_person(person.id).expect("delete person");
    let details = store.set_details(set_id).expect("aggregate set");
    assert!(details.persons.is_empty());
}

#[test]
fn linking_against_missing_rows_is_not_found() {
    let mut store = store();
    let set_id = store
        .create_module(r#"<ReportingModule Id="M"><DataElements/></ReportingModule>"#)
        .expect("create module");
    assert!(matches!(
        store.link_index_code(SetId(777), 1),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.link_person(set_id, 777, None),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.link_organization(set_id, 777, None),
        Err(StoreError::NotFound(_))
    ));
}

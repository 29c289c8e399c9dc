//! End-to-end tests for module ingestion.

use rde_model::{SetId, ValueType};
use rde_store::{DEFAULT_SOURCE, DEFAULT_STATUS, DEFAULT_VERSION, MAX_VALUE_LEN, Store, StoreError};

const TWO_ELEMENT_MODULE: &str = r#"<ReportingModule Id="Liver_Lesion">
  <Metadata>
    <ModuleDescription>Focal liver lesion characterization</ModuleDescription>
    <Contact><Name>Abdominal Imaging</Name></Contact>
  </Metadata>
  <DataElements>
    <IntegerDataElement Id="LES_COUNT" DisplaySequence="1">
      <Label>Lesion count</Label>
      <Minimum>1</Minimum>
      <Maximum>3</Maximum>
    </IntegerDataElement>
    <ChoiceDataElement Id="ENHANCEMENT" DisplaySequence="2">
      <Label>Enhancement pattern</Label>
      <ChoiceInfo>
        <Choices>
          <Choice><Value>arterial</Value><Label>Arterial</Label></Choice>
          <Choice><Value>portal</Value><Label>Portal venous</Label></Choice>
          <Choice><Value>delayed</Value><Label>Delayed</Label></Choice>
        </Choices>
      </ChoiceInfo>
    </ChoiceDataElement>
  </DataElements>
</ReportingModule>"#;

const EMPTY_MODULE: &str = r#"<ReportingModule Id="Liver_Lesion_v2">
  <Metadata>
    <ModuleDescription>Trimmed revision</ModuleDescription>
    <Contact><Name>Body MR</Name></Contact>
  </Metadata>
  <DataElements></DataElements>
</ReportingModule>"#;

fn store() -> Store {
    Store::open_in_memory().expect("open in-memory store")
}

fn count(store: &Store, table: &str) -> u32 {
    // Peeking straight at the tables keeps these assertions independent of
    // the read-side aggregation.
    let details = match table {
        "element" => store.list_elements().expect("list elements").len(),
        "element_set" => store.list_sets().expect("list sets").len(),
        other => panic!("unknown table {other}"),
    };
    details as u32
}

#[test]
fn create_persists_elements_set_refs_and_values() {
    let mut store = store();
    let set_id = store.create_module(TWO_ELEMENT_MODULE).expect("create module");

    let set = store.get_set(set_id).expect("get set");
    assert_eq!(set.name, "Liver Lesion");
    assert_eq!(set.description, "Focal liver lesion characterization");
    assert_eq!(set.contact_name, "Abdominal Imaging");
    assert_eq!(set.status, DEFAULT_STATUS);
    assert_eq!(set.version, DEFAULT_VERSION);

    let refs = store.set_element_refs(set_id).expect("set refs");
    assert_eq!(refs.len(), 2);
    assert_eq!(count(&store, "element"), 2);
    assert_eq!(count(&store, "element_set"), 1);

    let integer = store.get_element(refs[0].element_id).expect("integer element");
    assert_eq!(integer.name, "Lesion count");
    assert_eq!(integer.value_type, ValueType::Integer);
    assert_eq!(integer.value_min, Some(1.0));
    assert_eq!(integer.value_max, Some(3.0));
    assert_eq!(integer.min_cardinality, 1);
    assert_eq!(integer.max_cardinality, 1);
    assert_eq!(integer.source, DEFAULT_SOURCE);
    assert!(store.element_values(integer.id).expect("values").is_empty());

    let choice = store.get_element(refs[1].element_id).expect("choice element");
    assert_eq!(choice.value_type, ValueType::ValueSet);
    let values = store.element_values(choice.id).expect("choice values");
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| v.element_id == choice.id));
    let stored: Vec<&str> = values.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(stored, ["arterial", "portal", "delayed"]);
}

#[test]
fn elements_are_persisted_in_sequence_order() {
    let xml = r#"<ReportingModule Id="Ordered">
      <DataElements>
        <IntegerDataElement Id="B" DisplaySequence="2"><Label>Second</Label></IntegerDataElement>
        <IntegerDataElement Id="A" DisplaySequence="1"><Label>First</Label></IntegerDataElement>
      </DataElements>
    </ReportingModule>"#;
    let mut store = store();
    let set_id = store.create_module(xml).expect("create module");
    let refs = store.set_element_refs(set_id).expect("set refs");
    let names: Vec<String> = refs
        .iter()
        .map(|r| store.get_element(r.element_id).expect("element").name)
        .collect();
    assert_eq!(names, ["First", "Second"]);
}

#[test]
fn multi_choice_cardinality_is_option_count() {
    let xml = r#"<ReportingModule Id="MC">
      <DataElements>
        <MultiChoiceDataElement Id="F" DisplaySequence="1">
          <Label>Findings</Label>
          <ChoiceInfo><Choices>
            <Choice><Value>a</Value><Label>A</Label></Choice>
            <Choice><Value>b</Value><Label>B</Label></Choice>
            <Choice><Value>c</Value><Label>C</Label></Choice>
            <Choice><Value>d</Value><Label>D</Label></Choice>
          </Choices></ChoiceInfo>
        </MultiChoiceDataElement>
      </DataElements>
    </ReportingModule>"#;
    let mut store = store();
    let set_id = store.create_module(xml).expect("create module");
    let refs = store.set_element_refs(set_id).expect("set refs");
    let element = store.get_element(refs[0].element_id).expect("element");
    assert_eq!(element.min_cardinality, 1);
    assert_eq!(element.max_cardinality, 4);
}

#[test]
fn long_option_values_are_truncated() {
    let long_value = "v".repeat(MAX_VALUE_LEN + 40);
    let xml = format!(
        r#"<ReportingModule Id="T"><DataElements>
          <ChoiceDataElement Id="C" DisplaySequence="1">
            <Label>Choice</Label>
            <ChoiceInfo><Choice><Value>{long_value}</Value><Label>Long</Label></Choice></ChoiceInfo>
          </ChoiceDataElement>
        </DataElements></ReportingModule>"#
    );
    let mut store = store();
    let set_id = store.create_module(&xml).expect("create module");
    let refs = store.set_element_refs(set_id).expect("set refs");
    let values = store.element_values(refs[0].element_id).expect("values");
    assert_eq!(values[0].value.len(), MAX_VALUE_LEN);
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let long_value = "é".repeat(MAX_VALUE_LEN + 5);
    let xml = format!(
        r#"<ReportingModule Id="T"><DataElements>
          <ChoiceDataElement Id="C" DisplaySequence="1">
            <Label>Choice</Label>
            <ChoiceInfo><Choice><Value>{long_value}</Value><Label>Accented</Label></Choice></ChoiceInfo>
          </ChoiceDataElement>
        </DataElements></ReportingModule>"#
    );
    let mut store = store();
    let set_id = store.create_module(&xml).expect("create module");
    let refs = store.set_element_refs(set_id).expect("set refs");
    let values = store.element_values(refs[0].element_id).expect("values");
    assert_eq!(values[0].value.chars().count(), MAX_VALUE_LEN);
}

#[test]
fn malformed_document_is_a_validation_failure_with_no_rows() {
    let mut store = store();
    let err = store
        .create_module("<ReportingModule Id=\"Broken\"><DataElements>")
        .expect_err("malformed document");
    assert!(matches!(err, StoreError::Validation(_)), "{err}");
    assert_eq!(count(&store, "element"), 0);
    assert_eq!(count(&store, "element_set"), 0);
}

#[test]
fn update_replaces_the_element_graph() {
    let mut store = store();
    let set_id = store.create_module(TWO_ELEMENT_MODULE).expect("create module");
    let old_refs = store.set_element_refs(set_id).expect("old refs");
    assert_eq!(old_refs.len(), 2);

    let replacement = r#"<ReportingModule Id="Liver_Lesion">
      <DataElements>
        <NumericDataElement Id="SIZE" DisplaySequence="1">
          <Label>Largest diameter</Label>
          <Minimum>0.1</Minimum>
          <Unit>cm</Unit>
        </NumericDataElement>
      </DataElements>
    </ReportingModule>"#;
    store.update_module(replacement, set_id).expect("update module");

    let refs = store.set_element_refs(set_id).expect("new refs");
    assert_eq!(refs.len(), 1);
    // No elements from the prior generation survive.
    assert_eq!(count(&store, "element"), 1);
    let element = store.get_element(refs[0].element_id).expect("element");
    assert_eq!(element.name, "Largest diameter");
    assert_eq!(element.value_type, ValueType::Float);
    for old in &old_refs {
        assert!(store.get_element(old.element_id).is_err());
    }
}

#[test]
fn update_with_empty_document_clears_elements_but_keeps_the_set() {
    let mut store = store();
    let set_id = store.create_module(TWO_ELEMENT_MODULE).expect("create module");
    store.update_module(EMPTY_MODULE, set_id).expect("update to empty");

    assert!(store.set_element_refs(set_id).expect("refs").is_empty());
    assert_eq!(count(&store, "element"), 0);
    let set = store.get_set(set_id).expect("set survives");
    assert_eq!(set.name, "Liver Lesion v2");
    assert_eq!(set.description, "Trimmed revision");
    assert_eq!(set.contact_name, "Body MR");
}

#[test]
fn update_of_missing_set_reports_not_found_without_mutating() {
    let mut store = store();
    store.create_module(TWO_ELEMENT_MODULE).expect("create module");
    let err = store
        .update_module(EMPTY_MODULE, SetId(9999))
        .expect_err("missing set");
    assert!(matches!(err, StoreError::NotFound(_)), "{err}");
    // The existing set's graph is untouched.
    assert_eq!(count(&store, "element"), 2);
}

#[test]
fn update_with_malformed_document_leaves_prior_graph_intact() {
    let mut store = store();
    let set_id = store.create_module(TWO_ELEMENT_MODULE).expect("create module");
    let err = store
        .update_module("<ReportingModule Id=\"X\"><DataElements>", set_id)
        .expect_err("malformed update");
    assert!(matches!(err, StoreError::Validation(_)), "{err}");
    assert_eq!(store.set_element_refs(set_id).expect("refs").len(), 2);
    assert_eq!(count(&store, "element"), 2);
    let set = store.get_set(set_id).expect("set");
    assert_eq!(set.name, "Liver Lesion");
}

#[test]
fn delete_set_removes_graph_and_cross_references() {
    let mut store = store();
    let set_id = store.create_module(TWO_ELEMENT_MODULE).expect("create module");
    let person = store.add_person("A. Reader", "", "").expect("add person");
    store
        .link_person(set_id, person.id, Some("author"))
        .expect("link person");

    store.delete_set(set_id).expect("delete set");
    assert!(store.get_set(set_id).is_err());
    assert_eq!(count(&store, "element"), 0);
    // The person itself survives; only the link goes.
    assert!(store.get_person(person.id).is_ok());

    let err = store.delete_set(set_id).expect_err("already gone");
    assert!(matches!(err, StoreError::NotFound(_)), "{err}");
}

#[test]
fn store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.db");
    let set_id = {
        let mut store = Store::open(&path).expect("open store");
        store.create_module(TWO_ELEMENT_MODULE).expect("create module")
    };
    let store = Store::open(&path).expect("reopen store");
    let set = store.get_set(set_id).expect("set after reopen");
    assert_eq!(set.name, "Liver Lesion");
    assert_eq!(store.set_element_refs(set_id).expect("refs").len(), 2);
}

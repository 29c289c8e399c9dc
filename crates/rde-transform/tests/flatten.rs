//! Tests for the module flattener.

use proptest::collection::vec as prop_vec;
use proptest::proptest;
use rde_ingest::{
    Choice, ChoiceElement, ChoiceOptions, Diagram, DocumentModel, ElementHeader, ElementKind,
    GlobalValue, IntegerElement, ModuleMetadata, MultiChoiceElement, NumericElement,
    PassthroughElement,
};
use rde_transform::{RecordKind, flatten_module};

fn empty_doc() -> DocumentModel {
    DocumentModel {
        module_id: "Test_Module".to_string(),
        metadata: ModuleMetadata::default(),
        elements: Vec::new(),
        rules: Vec::new(),
    }
}

fn header(id: &str, label: &str, sequence: i32) -> ElementHeader {
    ElementHeader {
        id: id.to_string(),
        label: label.to_string(),
        display_sequence: sequence,
        required: false,
        hint: None,
        diagrams: Vec::new(),
    }
}

fn integer(id: &str, sequence: i32, minimum: &str, maximum: &str) -> ElementKind {
    ElementKind::Integer(IntegerElement {
        header: header(id, &format!("{id} label"), sequence),
        minimum: minimum.to_string(),
        maximum: maximum.to_string(),
        unit: None,
    })
}

fn choice(value: &str, label: &str) -> Choice {
    Choice {
        value: value.to_string(),
        label: label.to_string(),
        report_text: None,
    }
}

#[test]
fn empty_document_flattens_to_empty_result() {
    let flat = flatten_module(&empty_doc());
    assert!(flat.elements.is_empty());
    assert!(flat.globals.is_empty());
    assert!(flat.labels.is_empty());
}

#[test]
fn elements_sort_by_display_sequence() {
    let mut doc = empty_doc();
    doc.elements = vec![
        integer("E3", 3, "", ""),
        integer("E1", 1, "", ""),
        integer("E2", 2, "", ""),
    ];
    let flat = flatten_module(&doc);
    let ids: Vec<&str> = flat.elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["E1", "E2", "E3"]);
}

#[test]
fn tied_sequences_keep_document_order() {
    let mut doc = empty_doc();
    doc.elements = vec![
        integer("first", 5, "", ""),
        integer("second", 5, "", ""),
        integer("third", 5, "", ""),
    ];
    let flat = flatten_module(&doc);
    let ids: Vec<&str> = flat.elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[test]
fn globals_are_excluded_from_element_ordering() {
    let mut doc = empty_doc();
    doc.elements = vec![
        ElementKind::Global(GlobalValue {
            id: "MODALITY".to_string(),
            text: "CT".to_string(),
        }),
        integer("E1", 1, "", ""),
    ];
    let flat = flatten_module(&doc);
    assert_eq!(flat.elements.len(), 1);
    assert_eq!(flat.globals.len(), 1);
    let global = &flat.globals[0];
    assert_eq!(global.id, "MODALITY");
    assert_eq!(global.label, "MODALITY");
    assert_eq!(global.value, "CT");
}

#[test]
fn numeric_bounds_copied_only_when_present() {
    let mut doc = empty_doc();
    doc.elements = vec![ElementKind::Numeric(NumericElement {
        header: header("N1", "Diameter", 1),
        minimum: Some(0.5),
        maximum: None,
        unit: Some("mm".to_string()),
    })];
    let flat = flatten_module(&doc);
    let record = &flat.elements[0];
    assert_eq!(record.kind, RecordKind::Numeric);
    assert_eq!(record.minimum, Some(0.5));
    // An absent bound stays unset, never defaults to zero.
    assert_eq!(record.maximum, None);
    assert_eq!(record.unit.as_deref(), Some("mm"));
}

#[test]
fn integer_bounds_parse_from_non_empty_text() {
    let mut doc = empty_doc();
    doc.elements = vec![
        integer("I1", 1, "1", "10"),
        integer("I2", 2, "", "not a number"),
    ];
    let flat = flatten_module(&doc);
    assert_eq!(flat.elements[0].minimum, Some(1.0));
    assert_eq!(flat.elements[0].maximum, Some(10.0));
    assert_eq!(flat.elements[1].minimum, None);
    assert_eq!(flat.elements[1].maximum, None);
}

#[test]
fn choice_options_merge_primary_then_list() {
    let mut doc = empty_doc();
    doc.elements = vec![ElementKind::Choice(ChoiceElement {
        header: header("C1", "Laterality", 1),
        options: ChoiceOptions {
            primary: Some(choice("L", "Left")),
            listed: vec![choice("R", "Right"), choice("B", "Bilateral")],
        },
        image_map: None,
        allow_freetext: true,
    })];
    let flat = flatten_module(&doc);
    let record = &flat.elements[0];
    assert_eq!(record.kind, RecordKind::Choice);
    assert!(record.allow_freetext);
    let values: Vec<&str> = record.options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, ["L", "R", "B"]);
}

#[test]
fn multi_choice_never_surfaces_freetext() {
    let mut doc = empty_doc();
    doc.elements = vec![ElementKind::MultiChoice(MultiChoiceElement {
        header: header("MC1", "Findings", 1),
        options: ChoiceOptions {
            primary: None,
            listed: vec![choice("a", "A"), choice("b", "B")],
        },
        image_map: None,
    })];
    let flat = flatten_module(&doc);
    let record = &flat.elements[0];
    assert_eq!(record.kind, RecordKind::MultiChoice);
    assert!(!record.allow_freetext);
    assert_eq!(record.options.len(), 2);
}

#[test]
fn computed_elements_have_no_flattened_form() {
    let mut doc = empty_doc();
    doc.elements = vec![
        ElementKind::Computed(PassthroughElement {
            id: "X1".to_string(),
            label: "Score".to_string(),
            display_sequence: 1,
        }),
        integer("I1", 2, "", ""),
    ];
    let flat = flatten_module(&doc);
    assert_eq!(flat.elements.len(), 1);
    assert_eq!(flat.elements[0].id, "I1");
}

#[test]
fn label_map_is_case_insensitive_and_covers_option_values() {
    let mut doc = empty_doc();
    doc.elements = vec![ElementKind::Choice(ChoiceElement {
        header: header("C1", "Laterality", 1),
        options: ChoiceOptions {
            primary: None,
            listed: vec![choice("LeftLung", "Left")],
        },
        image_map: None,
        allow_freetext: false,
    })];
    let flat = flatten_module(&doc);
    assert_eq!(flat.labels.get("c1"), Some("Laterality"));
    assert_eq!(flat.labels.get("LEFTLUNG"), Some("Left"));
    assert_eq!(flat.labels.get("missing"), None);
}

#[test]
fn diagram_key_flag_presence_is_preserved() {
    let mut doc = empty_doc();
    let mut h = header("N1", "With diagrams", 1);
    h.diagrams = vec![
        Diagram {
            label: "Key".to_string(),
            location: "a.png".to_string(),
            display_sequence: 1,
            key_diagram: Some(false),
        },
        Diagram {
            label: "Unknown".to_string(),
            location: "b.png".to_string(),
            display_sequence: 2,
            key_diagram: None,
        },
    ];
    doc.elements = vec![ElementKind::Numeric(NumericElement {
        header: h,
        minimum: None,
        maximum: None,
        unit: None,
    })];
    let flat = flatten_module(&doc);
    let diagrams = &flat.elements[0].diagrams;
    // Explicit false and absent stay distinguishable through flattening.
    assert_eq!(diagrams[0].key_diagram, Some(false));
    assert_eq!(diagrams[1].key_diagram, None);
}

proptest! {
    #[test]
    fn flatten_is_a_stable_sort(sequences in prop_vec(0i32..6, 0..24)) {
        let mut doc = empty_doc();
        doc.elements = sequences
            .iter()
            .enumerate()
            .map(|(index, sequence)| integer(&format!("E{index}"), *sequence, "", ""))
            .collect();
        let flat = flatten_module(&doc);

        // Non-decreasing by sequence, and ties keep source (index) order.
        for pair in flat.elements.windows(2) {
            assert!(pair[0].display_sequence <= pair[1].display_sequence);
            if pair[0].display_sequence == pair[1].display_sequence {
                let left: usize = pair[0].id[1..].parse().unwrap();
                let right: usize = pair[1].id[1..].parse().unwrap();
                assert!(left < right);
            }
        }
    }
}

//! Flattening of the polymorphic document model into one uniform shape.
//!
//! The flattener walks the parsed element list once, copies the per-kind
//! field set into [`ElementRecord`], and returns the answerable records
//! sorted ascending by display sequence. The sort is stable: elements
//! sharing a sequence value keep their source document order. Globals are
//! excluded from that ordering and returned separately.

use std::collections::BTreeMap;

use tracing::debug;

use rde_ingest::{
    Choice, Diagram, DocumentModel, ElementKind, ImageMap, IntegerElement, NumericElement,
};

/// Which source kind an [`ElementRecord`] was flattened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Numeric,
    Integer,
    Choice,
    MultiChoice,
}

/// One answerable element in the unified shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub id: String,
    pub label: String,
    pub kind: RecordKind,
    pub required: bool,
    pub hint: Option<String>,
    pub diagrams: Vec<Diagram>,
    pub display_sequence: i32,
    /// Only set when the source carried an explicit bound; never zero-filled.
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub unit: Option<String>,
    /// Merged option list: primary slot first, then the array, source order.
    pub options: Vec<Choice>,
    pub image_map: Option<ImageMap>,
    /// Surfaced for single-choice only; multi-choice never supports it.
    pub allow_freetext: bool,
}

/// A module-scoped constant; label duplicates the id.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalRecord {
    pub id: String,
    pub label: String,
    pub value: String,
}

/// Case-insensitive lookup from element id (and choice option value) to the
/// label it was flattened with. Local to one conversion call; traceability
/// only, never shared state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    entries: BTreeMap<String, String>,
}

impl LabelMap {
    fn insert(&mut self, key: &str, label: &str) {
        self.entries
            .insert(key.to_lowercase(), label.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one flattening pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedModule {
    pub elements: Vec<ElementRecord>,
    pub globals: Vec<GlobalRecord>,
    pub labels: LabelMap,
}

/// Flatten a parsed document into ordered uniform records.
///
/// A document containing none of the known element kinds produces an empty
/// result; that is not an error here. Computed/DateTime/TimeSpan elements
/// are carried by the document model but have no flattened counterpart.
pub fn flatten_module(doc: &DocumentModel) -> FlattenedModule {
    let mut out = FlattenedModule::default();
    for element in &doc.elements {
        match element {
            ElementKind::Global(global) => {
                out.labels.insert(&global.id, &global.id);
                out.globals.push(GlobalRecord {
                    id: global.id.clone(),
                    label: global.id.clone(),
                    value: global.text.clone(),
                });
            }
            ElementKind::Numeric(numeric) => {
                out.labels.insert(&numeric.header.id, &numeric.header.label);
                out.elements.push(flatten_numeric(numeric));
            }
            ElementKind::Integer(integer) => {
                out.labels.insert(&integer.header.id, &integer.header.label);
                out.elements.push(flatten_integer(integer));
            }
            ElementKind::Choice(choice) => {
                let options = merge_options(&choice.options);
                out.labels.insert(&choice.header.id, &choice.header.label);
                for option in &options {
                    out.labels.insert(&option.value, &option.label);
                }
                out.elements.push(ElementRecord {
                    id: choice.header.id.clone(),
                    label: choice.header.label.clone(),
                    kind: RecordKind::Choice,
                    required: choice.header.required,
                    hint: choice.header.hint.clone(),
                    diagrams: choice.header.diagrams.clone(),
                    display_sequence: choice.header.display_sequence,
                    minimum: None,
                    maximum: None,
                    unit: None,
                    options,
                    image_map: choice.image_map.clone(),
                    allow_freetext: choice.allow_freetext,
                });
            }
            ElementKind::MultiChoice(multi) => {
                let options = merge_options(&multi.options);
                out.labels.insert(&multi.header.id, &multi.header.label);
                for option in &options {
                    out.labels.insert(&option.value, &option.label);
                }
                out.elements.push(ElementRecord {
                    id: multi.header.id.clone(),
                    label: multi.header.label.clone(),
                    kind: RecordKind::MultiChoice,
                    required: multi.header.required,
                    hint: multi.header.hint.clone(),
                    diagrams: multi.header.diagrams.clone(),
                    display_sequence: multi.header.display_sequence,
                    minimum: None,
                    maximum: None,
                    unit: None,
                    options,
                    image_map: multi.image_map.clone(),
                    allow_freetext: false,
                });
            }
            ElementKind::Computed(_) | ElementKind::DateTime(_) | ElementKind::TimeSpan(_) => {
                debug!(id = %element.id(), "element kind has no flattened form, skipping");
            }
        }
    }
    out.elements
        .sort_by_key(|record| record.display_sequence);
    out
}

fn flatten_numeric(numeric: &NumericElement) -> ElementRecord {
    ElementRecord {
        id: numeric.header.id.clone(),
        label: numeric.header.label.clone(),
        kind: RecordKind::Numeric,
        required: numeric.header.required,
        hint: numeric.header.hint.clone(),
        diagrams: numeric.header.diagrams.clone(),
        display_sequence: numeric.header.display_sequence,
        minimum: numeric.minimum,
        maximum: numeric.maximum,
        unit: numeric.unit.clone(),
        options: Vec::new(),
        image_map: None,
        allow_freetext: false,
    }
}

fn flatten_integer(integer: &IntegerElement) -> ElementRecord {
    ElementRecord {
        id: integer.header.id.clone(),
        label: integer.header.label.clone(),
        kind: RecordKind::Integer,
        required: integer.header.required,
        hint: integer.header.hint.clone(),
        diagrams: integer.header.diagrams.clone(),
        display_sequence: integer.header.display_sequence,
        minimum: parse_integer_bound(&integer.minimum),
        maximum: parse_integer_bound(&integer.maximum),
        unit: integer.unit.clone(),
        options: Vec::new(),
        image_map: None,
        allow_freetext: false,
    }
}

/// Integer bounds arrive as raw text; only a non-empty string that parses as
/// an integer becomes a bound.
fn parse_integer_bound(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok().map(|v| v as f64)
}

fn merge_options(options: &rde_ingest::ChoiceOptions) -> Vec<Choice> {
    let mut merged = Vec::with_capacity(options.len());
    if let Some(primary) = &options.primary {
        merged.push(primary.clone());
    }
    merged.extend(options.listed.iter().cloned());
    merged
}

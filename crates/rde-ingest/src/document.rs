//! In-memory parse result of an authoring-time reporting module.
//!
//! The element list is polymorphic and keeps document order; the condition
//! sub-tree under `<Rules>` is structurally independent of the elements and
//! is retained without interpretation. Nothing in the ingestion or read
//! paths evaluates conditions.

/// A parsed reporting module.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentModel {
    /// Module id from the root `Id` attribute; authoring convention uses
    /// underscores where the stored set name uses spaces.
    pub module_id: String,
    pub metadata: ModuleMetadata,
    /// Element definitions in document order.
    pub elements: Vec<ElementKind>,
    /// Condition rules, parsed but never evaluated here.
    pub rules: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleMetadata {
    pub description: Option<String>,
    pub contact_name: Option<String>,
}

/// Closed union of element definitions found in the document format.
///
/// Only the first five kinds participate in flattening; Computed, DateTime,
/// and TimeSpan are carried for structural completeness.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Global(GlobalValue),
    Numeric(NumericElement),
    Integer(IntegerElement),
    Choice(ChoiceElement),
    MultiChoice(MultiChoiceElement),
    Computed(PassthroughElement),
    DateTime(PassthroughElement),
    TimeSpan(PassthroughElement),
}

impl ElementKind {
    /// Source id of the element, whatever its kind.
    pub fn id(&self) -> &str {
        match self {
            ElementKind::Global(g) => &g.id,
            ElementKind::Numeric(e) => &e.header.id,
            ElementKind::Integer(e) => &e.header.id,
            ElementKind::Choice(e) => &e.header.id,
            ElementKind::MultiChoice(e) => &e.header.id,
            ElementKind::Computed(e) | ElementKind::DateTime(e) | ElementKind::TimeSpan(e) => &e.id,
        }
    }
}

/// A module-scoped constant; label and value collapse to id and first text.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalValue {
    pub id: String,
    pub text: String,
}

/// Fields shared by every answerable element kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementHeader {
    pub id: String,
    pub label: String,
    pub display_sequence: i32,
    pub required: bool,
    pub hint: Option<String>,
    pub diagrams: Vec<Diagram>,
}

/// An illustrative diagram attached to an element.
///
/// `key_diagram` is tri-state in the source: an absent attribute is not the
/// same thing as an explicit `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub label: String,
    pub location: String,
    pub display_sequence: i32,
    pub key_diagram: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericElement {
    pub header: ElementHeader,
    /// Absent in the source means unset; never defaulted to zero.
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerElement {
    pub header: ElementHeader,
    /// Raw source text; the flattener copies the bound only when the string
    /// is non-empty and parses as an integer.
    pub minimum: String,
    pub maximum: String,
    pub unit: Option<String>,
}

/// One selectable option.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub report_text: Option<String>,
}

/// The two source shapes an option list can arrive in: a single primary
/// `<Choice>` slot and/or a `<Choices>` array. The flattener merges them,
/// primary first, into one ordered list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceOptions {
    pub primary: Option<Choice>,
    pub listed: Vec<Choice>,
}

impl ChoiceOptions {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.listed.is_empty()
    }

    /// Number of options across both source shapes.
    pub fn len(&self) -> usize {
        usize::from(self.primary.is_some()) + self.listed.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMap {
    pub label: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceElement {
    pub header: ElementHeader,
    pub options: ChoiceOptions,
    pub image_map: Option<ImageMap>,
    pub allow_freetext: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiChoiceElement {
    pub header: ElementHeader,
    pub options: ChoiceOptions,
    pub image_map: Option<ImageMap>,
}

/// Computed/DateTime/TimeSpan elements: parsed for structural completeness,
/// excluded from flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct PassthroughElement {
    pub id: String,
    pub label: String,
    pub display_sequence: i32,
}

/// Closed union of the conditional-logic sub-schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    SectionIf(Box<Condition>),
    SectionIfNot(Box<Condition>),
    Equal(Comparison),
    NotEqual(Comparison),
    GreaterThan(Comparison),
    LessThan(Comparison),
    GreaterOrEqual(Comparison),
    LessOrEqual(Comparison),
    Contains(Comparison),
    HasAnyNChoices { element_id: String, minimum_choices: u32 },
}

/// A leaf comparison against one element's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub element_id: String,
    pub value: String,
}

pub mod document;
pub mod error;
pub mod parser;

pub use document::{
    Choice, ChoiceElement, ChoiceOptions, Comparison, Condition, Diagram, DocumentModel,
    ElementHeader, ElementKind, GlobalValue, ImageMap, IntegerElement, ModuleMetadata,
    MultiChoiceElement, NumericElement, PassthroughElement,
};
pub use error::ParseError;
pub use parser::parse_document;

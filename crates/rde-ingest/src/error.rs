use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("expected root element <ReportingModule>, found <{found}>")]
    UnexpectedRoot { found: String },

    #[error("document contains no <ReportingModule> root")]
    MissingRoot,

    #[error("missing required attribute {attribute} on <{element}>")]
    MissingAttribute {
        element: String,
        attribute: String,
    },

    #[error("element {id} is missing a <Label>")]
    MissingLabel { id: String },

    #[error("choice element {id} declares no options")]
    EmptyChoices { id: String },

    #[error("invalid {what} value {value:?} on <{element}>")]
    InvalidValue {
        element: String,
        what: &'static str,
        value: String,
    },

    #[error("condition <{element}> must wrap exactly one nested condition")]
    BadConditionArity { element: String },

    #[error("unexpected end of document inside <{element}>")]
    UnexpectedEof { element: String },

    #[error("unknown condition element <{element}>")]
    UnknownCondition { element: String },
}

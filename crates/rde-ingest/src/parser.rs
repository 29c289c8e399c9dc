//! Event-driven parser for the reporting-module XML format.
//!
//! The reader walks the document once. Each element-kind handler consumes
//! exactly its own subtree, so the surrounding loops only ever see sibling
//! boundaries. Unknown elements are skipped with a warning rather than
//! rejected, to tolerate authoring-tool extensions.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

use crate::document::{
    Choice, ChoiceElement, ChoiceOptions, Comparison, Condition, Diagram, DocumentModel,
    ElementHeader, ElementKind, GlobalValue, ImageMap, IntegerElement, ModuleMetadata,
    MultiChoiceElement, NumericElement, PassthroughElement,
};
use crate::error::ParseError;

type XmlReader<'a> = Reader<&'a [u8]>;

/// Parse reporting-module XML text into a [`DocumentModel`].
pub fn parse_document(xml: &str) -> Result<DocumentModel, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                return if e.local_name().as_ref() == b"ReportingModule" {
                    parse_module(&mut reader, &e)
                } else {
                    Err(ParseError::UnexpectedRoot { found: local(&e) })
                };
            }
            Event::Eof => return Err(ParseError::MissingRoot),
            _ => {}
        }
    }
}

fn parse_module(reader: &mut XmlReader, root: &BytesStart) -> Result<DocumentModel, ParseError> {
    let module_id = require_attr(root, "Id")?;
    let mut metadata = ModuleMetadata::default();
    let mut elements = Vec::new();
    let mut rules = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Metadata" => metadata = parse_metadata(reader)?,
                b"DataElements" => elements = parse_data_elements(reader)?,
                b"Rules" => rules = parse_rules(reader)?,
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "ReportingModule".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(DocumentModel {
        module_id,
        metadata,
        elements,
        rules,
    })
}

/// Both metadata fields are optional at every level of nesting; a missing
/// intermediate node must never be an error.
fn parse_metadata(reader: &mut XmlReader) -> Result<ModuleMetadata, ParseError> {
    let mut metadata = ModuleMetadata::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ModuleDescription" => {
                    metadata.description = Some(read_text(reader, &e)?);
                }
                b"Contact" => {
                    metadata.contact_name = parse_contact(reader)?;
                }
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(metadata),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Metadata".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_contact(reader: &mut XmlReader) -> Result<Option<String>, ParseError> {
    let mut name = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Name" => name = Some(read_text(reader, &e)?),
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(name),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Contact".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_data_elements(reader: &mut XmlReader) -> Result<Vec<ElementKind>, ParseError> {
    let mut elements = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let kind = match e.local_name().as_ref() {
                    b"GlobalValue" => Some(ElementKind::Global(GlobalValue {
                        id: require_attr(&e, "Id")?,
                        text: read_text(reader, &e)?,
                    })),
                    b"NumericDataElement" => Some(parse_numeric(reader, &e)?),
                    b"IntegerDataElement" => Some(parse_integer(reader, &e)?),
                    b"ChoiceDataElement" => Some(parse_choice_element(reader, &e, false)?),
                    b"MultiChoiceDataElement" => Some(parse_choice_element(reader, &e, true)?),
                    b"ComputedDataElement" => Some(parse_passthrough(reader, &e, ElementKind::Computed)?),
                    b"DateTimeDataElement" => Some(parse_passthrough(reader, &e, ElementKind::DateTime)?),
                    b"TimeSpanDataElement" => Some(parse_passthrough(reader, &e, ElementKind::TimeSpan)?),
                    _ => {
                        warn!(element = %local(&e), "skipping unknown data element");
                        skip_subtree(reader, &e)?;
                        None
                    }
                };
                elements.extend(kind);
            }
            // Self-closing forms of the known kinds must fail the same
            // checks their expanded forms would; only unknown tags are
            // skipped.
            Event::Empty(e) => match e.local_name().as_ref() {
                b"GlobalValue" => elements.push(ElementKind::Global(GlobalValue {
                    id: require_attr(&e, "Id")?,
                    text: String::new(),
                })),
                b"NumericDataElement" | b"IntegerDataElement" => {
                    return Err(ParseError::MissingLabel {
                        id: require_attr(&e, "Id")?,
                    });
                }
                b"ChoiceDataElement" | b"MultiChoiceDataElement" => {
                    return Err(ParseError::EmptyChoices {
                        id: require_attr(&e, "Id")?,
                    });
                }
                b"ComputedDataElement" => {
                    elements.push(ElementKind::Computed(empty_passthrough(&e)?));
                }
                b"DateTimeDataElement" => {
                    elements.push(ElementKind::DateTime(empty_passthrough(&e)?));
                }
                b"TimeSpanDataElement" => {
                    elements.push(ElementKind::TimeSpan(empty_passthrough(&e)?));
                }
                _ => warn!(element = %local(&e), "skipping unknown data element"),
            },
            Event::End(_) => return Ok(elements),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "DataElements".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn header_from_attrs(start: &BytesStart) -> Result<ElementHeader, ParseError> {
    Ok(ElementHeader {
        id: require_attr(start, "Id")?,
        label: String::new(),
        display_sequence: int_attr(start, "DisplaySequence")?.unwrap_or(0),
        required: bool_attr(start, "IsRequired")?.unwrap_or(false),
        hint: None,
        diagrams: Vec::new(),
    })
}

fn finish_header(header: ElementHeader) -> Result<ElementHeader, ParseError> {
    if header.label.is_empty() {
        return Err(ParseError::MissingLabel { id: header.id });
    }
    Ok(header)
}

fn parse_numeric(reader: &mut XmlReader, start: &BytesStart) -> Result<ElementKind, ParseError> {
    let mut header = header_from_attrs(start)?;
    let mut minimum = None;
    let mut maximum = None;
    let mut unit = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Label" => header.label = read_text(reader, &e)?,
                b"Hint" => header.hint = Some(read_text(reader, &e)?),
                b"Diagrams" => header.diagrams = parse_diagrams(reader)?,
                b"Minimum" => minimum = Some(float_text(reader, &e, "Minimum")?),
                b"Maximum" => maximum = Some(float_text(reader, &e, "Maximum")?),
                b"Unit" => unit = Some(read_text(reader, &e)?),
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "NumericDataElement".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(ElementKind::Numeric(NumericElement {
        header: finish_header(header)?,
        minimum,
        maximum,
        unit,
    }))
}

fn parse_integer(reader: &mut XmlReader, start: &BytesStart) -> Result<ElementKind, ParseError> {
    let mut header = header_from_attrs(start)?;
    let mut minimum = String::new();
    let mut maximum = String::new();
    let mut unit = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Label" => header.label = read_text(reader, &e)?,
                b"Hint" => header.hint = Some(read_text(reader, &e)?),
                b"Diagrams" => header.diagrams = parse_diagrams(reader)?,
                b"Minimum" => minimum = read_text(reader, &e)?,
                b"Maximum" => maximum = read_text(reader, &e)?,
                b"Unit" => unit = Some(read_text(reader, &e)?),
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "IntegerDataElement".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(ElementKind::Integer(IntegerElement {
        header: finish_header(header)?,
        minimum,
        maximum,
        unit,
    }))
}

fn parse_choice_element(
    reader: &mut XmlReader,
    start: &BytesStart,
    multi: bool,
) -> Result<ElementKind, ParseError> {
    let mut header = header_from_attrs(start)?;
    let allow_freetext = bool_attr(start, "AllowFreetext")?.unwrap_or(false);
    let mut options = ChoiceOptions::default();
    let mut image_map = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Label" => header.label = read_text(reader, &e)?,
                b"Hint" => header.hint = Some(read_text(reader, &e)?),
                b"Diagrams" => header.diagrams = parse_diagrams(reader)?,
                b"ChoiceInfo" => options = parse_choice_info(reader)?,
                b"ImageMap" => image_map = Some(parse_image_map(reader)?),
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "ChoiceDataElement".to_string(),
                });
            }
            _ => {}
        }
    }
    if options.is_empty() {
        return Err(ParseError::EmptyChoices { id: header.id });
    }
    let header = finish_header(header)?;
    Ok(if multi {
        ElementKind::MultiChoice(MultiChoiceElement {
            header,
            options,
            image_map,
        })
    } else {
        ElementKind::Choice(ChoiceElement {
            header,
            options,
            image_map,
            allow_freetext,
        })
    })
}

fn parse_choice_info(reader: &mut XmlReader) -> Result<ChoiceOptions, ParseError> {
    let mut options = ChoiceOptions::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Choice" => {
                    let choice = parse_choice(reader)?;
                    // The first direct child fills the primary slot; anything
                    // further joins the list so no authored option is lost.
                    if options.primary.is_none() {
                        options.primary = Some(choice);
                    } else {
                        options.listed.push(choice);
                    }
                }
                b"Choices" => parse_choice_list(reader, &mut options.listed)?,
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(options),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "ChoiceInfo".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_choice_list(reader: &mut XmlReader, out: &mut Vec<Choice>) -> Result<(), ParseError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Choice" => out.push(parse_choice(reader)?),
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Choices".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_choice(reader: &mut XmlReader) -> Result<Choice, ParseError> {
    let mut choice = Choice::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Value" => choice.value = read_text(reader, &e)?,
                b"Label" => choice.label = read_text(reader, &e)?,
                b"ReportText" => choice.report_text = Some(read_text(reader, &e)?),
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(choice),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Choice".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_image_map(reader: &mut XmlReader) -> Result<ImageMap, ParseError> {
    let mut label = String::new();
    let mut location = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Label" => label = read_text(reader, &e)?,
                b"Location" => location = read_text(reader, &e)?,
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(ImageMap { label, location }),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "ImageMap".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_diagrams(reader: &mut XmlReader) -> Result<Vec<Diagram>, ParseError> {
    let mut diagrams = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Diagram" => {
                    let mut diagram = diagram_from_attrs(&e)?;
                    parse_diagram_children(reader, &mut diagram)?;
                    diagrams.push(diagram);
                }
                _ => skip_subtree(reader, &e)?,
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"Diagram" {
                    diagrams.push(diagram_from_attrs(&e)?);
                }
            }
            Event::End(_) => return Ok(diagrams),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Diagrams".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn diagram_from_attrs(start: &BytesStart) -> Result<Diagram, ParseError> {
    Ok(Diagram {
        label: String::new(),
        location: String::new(),
        display_sequence: int_attr(start, "DisplaySequence")?.unwrap_or(0),
        key_diagram: bool_attr(start, "KeyDiagram")?,
    })
}

fn parse_diagram_children(reader: &mut XmlReader, diagram: &mut Diagram) -> Result<(), ParseError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Label" => diagram.label = read_text(reader, &e)?,
                b"Location" => diagram.location = read_text(reader, &e)?,
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Diagram".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn empty_passthrough(start: &BytesStart) -> Result<PassthroughElement, ParseError> {
    Ok(PassthroughElement {
        id: require_attr(start, "Id")?,
        label: String::new(),
        display_sequence: int_attr(start, "DisplaySequence")?.unwrap_or(0),
    })
}

fn parse_passthrough(
    reader: &mut XmlReader,
    start: &BytesStart,
    wrap: fn(PassthroughElement) -> ElementKind,
) -> Result<ElementKind, ParseError> {
    let id = require_attr(start, "Id")?;
    let display_sequence = int_attr(start, "DisplaySequence")?.unwrap_or(0);
    let mut label = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Label" => label = read_text(reader, &e)?,
                _ => skip_subtree(reader, &e)?,
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "data element".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(wrap(PassthroughElement {
        id,
        label,
        display_sequence,
    }))
}

fn parse_rules(reader: &mut XmlReader) -> Result<Vec<Condition>, ParseError> {
    let mut rules = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => rules.push(parse_condition(reader, &e, false)?),
            Event::Empty(e) => rules.push(parse_condition(reader, &e, true)?),
            Event::End(_) => return Ok(rules),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: "Rules".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_condition(
    reader: &mut XmlReader,
    start: &BytesStart,
    is_empty: bool,
) -> Result<Condition, ParseError> {
    let name = local(start);
    match start.local_name().as_ref() {
        b"And" => Ok(Condition::And(branch_children(reader, &name, is_empty)?)),
        b"Or" => Ok(Condition::Or(branch_children(reader, &name, is_empty)?)),
        b"Not" => Ok(Condition::Not(parse_single_child(reader, &name, is_empty)?)),
        b"SectionIf" => Ok(Condition::SectionIf(parse_single_child(reader, &name, is_empty)?)),
        b"SectionIfNot" => Ok(Condition::SectionIfNot(parse_single_child(
            reader, &name, is_empty,
        )?)),
        b"EqualCondition" => leaf(reader, start, is_empty, Condition::Equal),
        b"NotEqualCondition" => leaf(reader, start, is_empty, Condition::NotEqual),
        b"GreaterThanCondition" => leaf(reader, start, is_empty, Condition::GreaterThan),
        b"LessThanCondition" => leaf(reader, start, is_empty, Condition::LessThan),
        b"GreaterOrEqualCondition" => leaf(reader, start, is_empty, Condition::GreaterOrEqual),
        b"LessOrEqualCondition" => leaf(reader, start, is_empty, Condition::LessOrEqual),
        b"ContainsCondition" => leaf(reader, start, is_empty, Condition::Contains),
        b"HasAnyNChoicesCondition" => {
            let element_id = require_attr(start, "DataElementId")?;
            let raw = require_attr(start, "MinimumChoices")?;
            let minimum_choices = raw.trim().parse().map_err(|_| ParseError::InvalidValue {
                element: name.clone(),
                what: "MinimumChoices",
                value: raw,
            })?;
            if !is_empty {
                skip_subtree(reader, start)?;
            }
            Ok(Condition::HasAnyNChoices {
                element_id,
                minimum_choices,
            })
        }
        _ => Err(ParseError::UnknownCondition { element: name }),
    }
}

fn leaf(
    reader: &mut XmlReader,
    start: &BytesStart,
    is_empty: bool,
    wrap: fn(Comparison) -> Condition,
) -> Result<Condition, ParseError> {
    let comparison = Comparison {
        element_id: require_attr(start, "DataElementId")?,
        value: require_attr(start, "ComparisonValue")?,
    };
    if !is_empty {
        skip_subtree(reader, start)?;
    }
    Ok(wrap(comparison))
}

/// A self-closing branch node has no subtree to read.
fn branch_children(
    reader: &mut XmlReader,
    parent: &str,
    is_empty: bool,
) -> Result<Vec<Condition>, ParseError> {
    if is_empty {
        return Ok(Vec::new());
    }
    parse_condition_children(reader, parent)
}

fn parse_condition_children(
    reader: &mut XmlReader,
    parent: &str,
) -> Result<Vec<Condition>, ParseError> {
    let mut children = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => children.push(parse_condition(reader, &e, false)?),
            Event::Empty(e) => children.push(parse_condition(reader, &e, true)?),
            Event::End(_) => return Ok(children),
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    element: parent.to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_single_child(
    reader: &mut XmlReader,
    parent: &str,
    is_empty: bool,
) -> Result<Box<Condition>, ParseError> {
    let mut children = branch_children(reader, parent, is_empty)?;
    if children.len() != 1 {
        return Err(ParseError::BadConditionArity {
            element: parent.to_string(),
        });
    }
    Ok(Box::new(children.remove(0)))
}

fn local(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn read_text(reader: &mut XmlReader, start: &BytesStart) -> Result<String, ParseError> {
    Ok(reader.read_text(start.name())?.into_owned())
}

fn float_text(
    reader: &mut XmlReader,
    start: &BytesStart,
    what: &'static str,
) -> Result<f64, ParseError> {
    let raw = read_text(reader, start)?;
    raw.trim().parse().map_err(|_| ParseError::InvalidValue {
        element: local(start),
        what,
        value: raw,
    })
}

fn skip_subtree(reader: &mut XmlReader, start: &BytesStart) -> Result<(), ParseError> {
    reader.read_to_end(start.name())?;
    Ok(())
}

fn attr_value(start: &BytesStart, name: &str) -> Result<Option<String>, ParseError> {
    match start.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn require_attr(start: &BytesStart, name: &str) -> Result<String, ParseError> {
    attr_value(start, name)?.ok_or_else(|| ParseError::MissingAttribute {
        element: local(start),
        attribute: name.to_string(),
    })
}

fn bool_attr(start: &BytesStart, name: &str) -> Result<Option<bool>, ParseError> {
    match attr_value(start, name)? {
        None => Ok(None),
        Some(raw) => match raw.trim() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(ParseError::InvalidValue {
                element: local(start),
                what: "boolean attribute",
                value: raw,
            }),
        },
    }
}

fn int_attr(start: &BytesStart, name: &str) -> Result<Option<i32>, ParseError> {
    match attr_value(start, name)? {
        None => Ok(None),
        Some(raw) => {
            let parsed = raw.trim().parse().map_err(|_| ParseError::InvalidValue {
                element: local(start),
                what: "integer attribute",
                value: raw,
            })?;
            Ok(Some(parsed))
        }
    }
}

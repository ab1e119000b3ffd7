//! Read-only element tree and the XML reader that builds it
//!
//! Only tag names and element text are kept. Attributes, comments,
//! processing instructions and text that follows a child element (tail
//! text) are dropped while parsing.

use crate::error::ParseError;
use log::debug;
use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;

// Internal general entities only; parameter (`%`) and external (SYSTEM/PUBLIC)
// declarations do not match
static ENTITY_DECL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!ENTITY\s+([^\s%"'>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).unwrap()
});

/// A tagged node with optional text and ordered children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,

    /// Character data before the first child element, entities resolved
    pub text: Option<String>,

    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Text with surrounding whitespace stripped; absent text is ""
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    /// Parse an XML document and return its root element
    pub fn parse_str(xml: &str) -> Result<Element, ParseError> {
        parse_document(xml)
    }
}

/// Interpret raw document bytes as UTF-8 text
pub fn decode_document(bytes: Vec<u8>) -> Result<String, ParseError> {
    String::from_utf8(bytes).map_err(|err| ParseError::NotUtf8 {
        position: err.utf8_error().valid_up_to() as u64,
    })
}

/// An element whose end tag has not been seen yet
struct OpenElement {
    element: Element,
    seen_child: bool,
}

/// Build an element tree from XML text
///
/// The reader walks events with an explicit stack, so nesting depth is
/// bounded by memory rather than by the call stack.
pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Element> = None;
    let mut entities: HashMap<String, String> = HashMap::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(ParseError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })
            }
        };
        let position = reader.buffer_position() as u64;

        match event {
            Event::Start(ref e) => {
                let tag = tag_name(e, position)?;
                open_element(&mut stack, &root, tag.clone(), position)?;
                stack.push(OpenElement {
                    element: Element::new(tag),
                    seen_child: false,
                });
            }
            Event::Empty(ref e) => {
                let tag = tag_name(e, position)?;
                open_element(&mut stack, &root, tag.clone(), position)?;
                close_element(&mut stack, &mut root, Element::new(tag));
            }
            Event::End(_) => {
                // quick-xml has already matched the end name against the open tag
                if let Some(open) = stack.pop() {
                    close_element(&mut stack, &mut root, open.element);
                }
            }
            Event::Text(ref e) => {
                let text = e.decode().map_err(|err| ParseError::Malformed {
                    position,
                    message: err.to_string(),
                })?;
                push_text(&mut stack, &normalize_line_endings(&text), position)?;
            }
            Event::CData(ref e) => {
                let text = e.decode().map_err(|err| ParseError::Malformed {
                    position,
                    message: err.to_string(),
                })?;
                push_text(&mut stack, &normalize_line_endings(&text), position)?;
            }
            Event::GeneralRef(ref e) => {
                let resolved = resolve_reference(e, &entities, position)?;
                push_text(&mut stack, &resolved, position)?;
            }
            Event::DocType(ref e) => {
                let dtd = e.decode().map_err(|err| ParseError::Malformed {
                    position,
                    message: err.to_string(),
                })?;
                entities = declared_entities(&normalize_line_endings(&dtd), position)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::Unclosed {
            tag: open.element.tag,
        });
    }

    let root = root.ok_or(ParseError::NoRoot)?;
    debug!(
        "parsed document root <{}> with {} children",
        root.tag,
        root.children.len()
    );
    Ok(root)
}

fn tag_name(e: &BytesStart<'_>, position: u64) -> Result<String, ParseError> {
    let name = e.name();
    let tag = std::str::from_utf8(name.as_ref()).map_err(|err| ParseError::Malformed {
        position,
        message: err.to_string(),
    })?;
    Ok(tag.to_string())
}

/// Mark the current parent as having children; reject a second root
fn open_element(
    stack: &mut [OpenElement],
    root: &Option<Element>,
    tag: String,
    position: u64,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.seen_child = true;
            Ok(())
        }
        None if root.is_some() => Err(ParseError::MultipleRoots { tag, position }),
        None => Ok(()),
    }
}

fn close_element(stack: &mut [OpenElement], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.element.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [OpenElement], text: &str, position: u64) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(open) if !open.seen_child => {
            open.element
                .text
                .get_or_insert_with(String::new)
                .push_str(text);
            Ok(())
        }
        // Tail text after a child element is not kept
        Some(_) => Ok(()),
        None if is_blank(text) => Ok(()),
        None => Err(ParseError::TextOutsideRoot { position }),
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{feff}')
}

/// `\r\n` and lone `\r` become `\n`, as an XML processor must report them
fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Resolve `&name;` or `&#N;` against the predefined and DTD-declared entities
fn resolve_reference(
    e: &BytesRef<'_>,
    entities: &HashMap<String, String>,
    position: u64,
) -> Result<String, ParseError> {
    let char_ref = e.resolve_char_ref().map_err(|err| ParseError::InvalidCharRef {
        position,
        message: err.to_string(),
    })?;
    if let Some(c) = char_ref {
        if !is_xml_char(c) {
            return Err(ParseError::InvalidCharRef {
                position,
                message: format!("U+{:04X} is not an XML character", c as u32),
            });
        }
        return Ok(c.to_string());
    }

    let name = e.decode().map_err(|err| ParseError::Malformed {
        position,
        message: err.to_string(),
    })?;
    if let Some(predefined) = resolve_predefined_entity(&name) {
        return Ok(predefined.to_string());
    }
    entities
        .get(&*name)
        .cloned()
        .ok_or_else(|| ParseError::UndefinedEntity {
            name: name.to_string(),
            position,
        })
}

/// The `Char` production of XML 1.0
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Collect the internal entity declarations of a DOCTYPE
///
/// Replacement text is expanded once, at declaration, against the
/// predefined entities and the entities declared before it.
fn declared_entities(dtd: &str, position: u64) -> Result<HashMap<String, String>, ParseError> {
    let mut entities: HashMap<String, String> = HashMap::new();

    for caps in ENTITY_DECL_REGEX.captures_iter(dtd) {
        let name = &caps[1];
        let raw = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());

        let value = unescape_with(raw, |entity| {
            resolve_predefined_entity(entity).or_else(|| entities.get(entity).map(String::as_str))
        })
        .map_err(|err| ParseError::Malformed {
            position,
            message: format!("entity {}: {}", name, err),
        })?
        .into_owned();

        // the first declaration of a name is binding
        entities.entry(name.to_string()).or_insert(value);
    }

    debug!("doctype declares {} internal entities", entities.len());
    Ok(entities)
}

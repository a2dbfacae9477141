//! XML document handling
//!
//! This module provides the read-only element tree the converter walks.
//! Only local element names, attribute values and child order are kept;
//! text, comments and processing instructions are dropped while parsing.

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Attribute name to value mapping, in document order
pub type AttributeMap = IndexMap<String, String>;

/// XML Element in the document tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name of the element
    pub local_name: String,
    /// Namespace prefix as written in the document
    pub prefix: Option<String>,
    /// Element attributes; prefixed attributes keep their `prefix:name` key
    pub attributes: AttributeMap,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Get an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Get an attribute value, failing if the attribute is absent
    pub fn required_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name)
            .ok_or_else(|| Error::missing_attribute(&self.local_name, name))
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Build an element tree from a roxmltree element node
    ///
    /// Non-element children are skipped. Namespace declarations are not
    /// attributes in roxmltree, so nothing needs filtering here.
    pub fn from_roxmltree(node: roxmltree::Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        let prefix = tag
            .namespace()
            .and_then(|uri| node.lookup_prefix(uri))
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let mut element = Element {
            local_name: tag.name().to_string(),
            prefix,
            ..Default::default()
        };

        for attr in node.attributes() {
            let key = match attr.namespace().and_then(|uri| node.lookup_prefix(uri)) {
                Some(p) if !p.is_empty() => format!("{}:{}", p, attr.name()),
                _ => attr.name().to_string(),
            };
            element.attributes.insert(key, attr.value().to_string());
        }

        for child in node.children().filter(|n| n.is_element()) {
            element.add_child(Element::from_roxmltree(child));
        }

        element
    }
}

/// XML Document representation
#[derive(Debug, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes, enforcing the given limits
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    let position = reader.buffer_position();
                    return Err(ParseError::new(e.to_string())
                        .with_location(line_column(xml, position))
                        .into());
                }
                _ => {} // Text, comments, processing instructions, etc.
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(ParseError::new("Unexpected end of document: unclosed elements")
                .with_location(line_column(xml, xml.len()))
                .into());
        }

        Ok(doc)
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart) -> Result<Element> {
        let name = start.name();
        let local_name = std::str::from_utf8(name.local_name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();
        let prefix = match name.prefix() {
            Some(p) => Some(
                std::str::from_utf8(p.as_ref())
                    .map_err(|e| Error::Xml(format!("Invalid element prefix: {}", e)))?
                    .to_string(),
            ),
            None => None,
        };

        let mut element = Element {
            local_name,
            prefix,
            ..Default::default()
        };

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?;

            // Namespace declarations are not attributes of the EDM construct
            if attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
                continue;
            }

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            element.attributes.insert(attr_name.to_string(), attr_value);
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Take the root element, failing for an empty document
    pub fn into_root(self) -> Result<Element> {
        self.root
            .ok_or_else(|| Error::Xml("XML document has no root element".to_string()))
    }
}

/// Convert a byte offset into a 1-based `line:column` string
fn line_column(xml: &[u8], position: usize) -> String {
    let consumed = &xml[..position.min(xml.len())];
    let line = consumed.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = match consumed.iter().rposition(|&b| b == b'\n') {
        Some(newline) => consumed.len() - newline,
        None => consumed.len() + 1,
    };
    format!("{}:{}", line, column)
}

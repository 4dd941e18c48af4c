//! Owned XML document tree.
//!
//! A [`Document`] is parsed once from bytes, mutated in place and serialized
//! back to text. Every node has exactly one owner, so mutation needs nothing
//! more than `&mut` access to the tree.
//!
//! Parsing keeps elements, attribute order, text (whitespace included), CDATA
//! sections and comments found inside the root element. The prolog of the
//! input (its declaration, DOCTYPE and any comments outside the root) and
//! processing instructions are not kept: serialization always starts with a
//! fresh declaration.
//!
//! Input in any ASCII-compatible encoding named by its declaration (or BOM)
//! is decoded; output is always UTF-8.
//!
//! # Example
//!
//! ```
//! use xuproc::document::Document;
//!
//! let mut doc = Document::parse(br#"<testsuite><testcase name="a"/></testsuite>"#)?;
//! doc.root.children_named_mut("testcase").for_each(|tc| tc.set_attribute("name", "b"));
//!
//! let xml = doc.to_xml()?;
//! assert!(xml.contains(r#"<testcase name="b" />"#));
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::borrow::Cow;
use std::io::Write;

use anyhow::Context;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Declaration written in front of every serialized document.
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>";

/// Error raised when the input is not a well-formed XML document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct XmlError {
    pub message: String,
    pub position: u64,
}

/// A node inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, unescaped.
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the value of attribute `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets attribute `key`, keeping its position if it already exists.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Direct child elements with tag `name`. Does not descend further.
    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children.iter_mut().filter_map(move |node| match node {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Tag name followed by ` key="value"` for every attribute, escaped.
    fn start_tag_content(&self) -> String {
        let mut content = self.name.clone();
        for (key, value) in &self.attributes {
            content.push_str(&format!(" {key}=\"{}\"", escape_attribute(value)));
        }
        content
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> anyhow::Result<()> {
        let content = self.start_tag_content();

        if self.children.is_empty() {
            // Childless elements are written `<tag attr="v" />`
            let out = writer.get_mut();
            out.write_all(b"<")?;
            out.write_all(content.as_bytes())?;
            out.write_all(b" />")?;
            return Ok(());
        }

        writer.write_event(Event::Start(BytesStart::from_content(
            content,
            self.name.len(),
        )))?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write(writer)?,
                Node::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
                        text.as_str(),
                    ))))?;
                }
                Node::CData(data) => {
                    writer.write_event(Event::CData(BytesCData::new(data.as_str())))?;
                }
                Node::Comment(comment) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

/// A parsed XML document. Owns the whole tree through its root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parses a complete XML document.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if the input is not well-formed: mismatched or
    /// unclosed tags, invalid names, malformed or duplicate attributes,
    /// unknown entities, content outside the root element, or no root element
    /// at all.
    pub fn parse(input: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(error_at(&reader, e.to_string())),
                Ok(Event::Start(ref e)) => {
                    let element = read_element(&reader, e)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(error_at(&reader, "junk after document element"));
                    }
                    stack.push(element);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = read_element(&reader, e)?;
                    attach(&reader, &mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| error_at(&reader, "unexpected closing tag"))?;
                    attach(&reader, &mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref e)) => match stack.last_mut() {
                    Some(parent) => {
                        if e.windows(3).any(|w| w == b"]]>") {
                            return Err(error_at(&reader, "']]>' in character data"));
                        }
                        let raw = decode(&reader, e)?;
                        let text = unescape(&raw).map_err(|err| error_at(&reader, err.to_string()))?;
                        push_text(parent, text);
                    }
                    None if e.iter().all(u8::is_ascii_whitespace) => {}
                    None => return Err(error_at(&reader, "text outside of the root element")),
                },
                Ok(Event::CData(ref e)) => {
                    let Some(parent) = stack.last_mut() else {
                        return Err(error_at(&reader, "CDATA outside of the root element"));
                    };
                    let data = decode(&reader, e)?;
                    parent.children.push(Node::CData(data.into_owned()));
                }
                Ok(Event::Comment(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let comment = decode(&reader, e)?;
                        parent.children.push(Node::Comment(comment.into_owned()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(error_at(
                &reader,
                format!("unclosed element <{}>", open.name),
            ));
        }
        root.map(|root| Document { root })
            .ok_or_else(|| error_at(&reader, "no element found"))
    }

    /// Serializes the document, declaration first.
    pub fn to_xml(&self) -> anyhow::Result<String> {
        let mut out = Vec::new();
        out.extend_from_slice(XML_DECLARATION.as_bytes());
        out.push(b'\n');

        let mut writer = Writer::new(out);
        self.root.write(&mut writer)?;

        String::from_utf8(writer.into_inner()).context("Serialized document is not valid UTF-8")
    }
}

fn error_at(reader: &Reader<&[u8]>, message: impl Into<String>) -> XmlError {
    XmlError {
        message: message.into(),
        position: reader.error_position() as u64,
    }
}

/// Decodes raw bytes with the encoding the reader detected.
fn decode<'b>(reader: &Reader<&[u8]>, bytes: &'b [u8]) -> Result<Cow<'b, str>, XmlError> {
    reader
        .decoder()
        .decode(bytes)
        .map_err(|e| error_at(reader, e.to_string()))
}

fn read_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = decode(reader, start.name().as_ref())?.into_owned();
    if !is_xml_name(&name) {
        return Err(error_at(reader, format!("invalid tag name {name:?}")));
    }

    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| error_at(reader, e.to_string()))?;
        let key = decode(reader, attr.key.as_ref())?;
        if !is_xml_name(&key) {
            return Err(error_at(reader, format!("invalid attribute name {key:?}")));
        }
        let raw = decode(reader, &attr.value)?;
        if raw.contains('<') {
            return Err(error_at(reader, format!("'<' in value of attribute {key:?}")));
        }
        let value = unescape(&normalize_attribute_whitespace(&raw))
            .map_err(|e| error_at(reader, e.to_string()))?
            .into_owned();
        element.attributes.push((key.into_owned(), value));
    }
    Ok(element)
}

/// Literal line breaks and tabs in an attribute value read as single spaces.
/// Character references such as `&#10;` are unaffected.
fn normalize_attribute_whitespace(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\n', '\r', '\t']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(
        raw.replace("\r\n", " ")
            .replace(['\r', '\n', '\t'], " "),
    )
}

/// Escapes an attribute value so it reads back unchanged, whitespace included.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped;
    }
    Cow::Owned(
        escaped
            .replace('\n', "&#10;")
            .replace('\r', "&#13;")
            .replace('\t', "&#9;"),
    )
}

/// Hands a finished element to its parent, or makes it the root.
fn attach(
    reader: &Reader<&[u8]>,
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => return Err(error_at(reader, "junk after document element")),
        None => *root = Some(element),
    }
    Ok(())
}

/// Appends text, merging with a preceding text node.
fn push_text(parent: &mut Element, text: Cow<'_, str>) {
    if let Some(Node::Text(last)) = parent.children.last_mut() {
        last.push_str(&text);
    } else {
        parent.children.push(Node::Text(text.into_owned()));
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start_ok = first.is_alphabetic() || first == '_' || first == ':' || !first.is_ascii();
    start_ok
        && chars.all(|c| {
            c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':') || !c.is_ascii()
        })
}

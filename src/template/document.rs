//! Owned HTML node tree.
//!
//! # Responsibilities
//! - Parse template markup into an owned tree of elements and raw nodes
//! - Locate marked elements and mutate their content or attributes
//! - Serialize the tree back to markup
//!
//! # Design Decisions
//! - Tokenizing is delegated to quick-xml with end-name checks disabled,
//!   tree construction applies the HTML leniencies on top of it
//! - A `<` that does not open a tag is text: the reader restarts one byte
//!   further, so quick-xml never swallows the markup that follows
//! - `script`, `style`, `textarea` and `title` hold raw text up to their
//!   end tag and are never tokenized
//! - Repeated attributes keep the first occurrence
//! - Everything that is not an element (text, comments, doctype, CDATA)
//!   is kept as the exact source slice, so untouched markup round-trips
//! - Attribute values are stored in their escaped (source) form
//! - A `Document` is cheap to clone; each render works on its own clone

use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::template::binding::WriteTarget;

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Tag names start with an ASCII letter; anything else after `<` is text.
fn is_tag_name(name: &[u8]) -> bool {
    name.first().is_some_and(u8::is_ascii_alphabetic)
}

/// In `<a href=x/>` the slash belongs to the unquoted value, it does not
/// close the tag. quick-xml reports such a tag as empty with the slash
/// stripped from its content.
fn slash_in_unquoted_value(tag: &BytesStart<'_>) -> bool {
    let content: &[u8] = tag;
    match content.last() {
        None => false,
        Some(b) if b.is_ascii_whitespace() || *b == b'"' || *b == b'\'' => false,
        Some(_) => content
            .rsplit(u8::is_ascii_whitespace)
            .next()
            .is_some_and(|token| token.contains(&b'=')),
    }
}

/// Locate the end tag of a raw text element in `source`.
///
/// Returns the content length and the offset just past the end tag, both
/// relative to `source`. Without an end tag the content runs to the end.
fn find_raw_text_end(source: &str, name: &str) -> (usize, usize) {
    let lower = source.to_ascii_lowercase();
    let needle = format!("</{}", name.to_ascii_lowercase());
    let mut from = 0;
    while let Some(found) = lower[from..].find(&needle) {
        let at = from + found;
        let after = at + needle.len();
        match lower.as_bytes().get(after) {
            Some(b) if *b == b'>' || *b == b'/' || b.is_ascii_whitespace() => {
                let close = lower[after..]
                    .find('>')
                    .map_or(source.len(), |i| after + i + 1);
                return (at, close);
            }
            None => return (at, source.len()),
            Some(_) => from = after,
        }
    }
    (source.len(), source.len())
}

fn html_reader(source: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

/// Errors raised while parsing template markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed markup near byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("malformed attribute on <{element}>: {message}")]
    Attribute { element: String, message: String },
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Source markup kept verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Escaped value, as it appears between the quotes.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    fn from_tag(tag: &BytesStart<'_>, self_closing: bool) -> Result<Self, MarkupError> {
        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut parsed = tag.html_attributes();
        parsed.with_checks(false);
        for attr in parsed {
            let attr = attr.map_err(|e| MarkupError::Attribute {
                element: name.clone(),
                message: e.to_string(),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if attributes.iter().any(|a| a.name.eq_ignore_ascii_case(&key)) {
                continue;
            }
            attributes.push(Attribute {
                name: key,
                value: String::from_utf8_lossy(&attr.value).into_owned(),
            });
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            self_closing,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.name)
    }

    /// Escaped value of an attribute. Names compare case-insensitively.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute from an unescaped value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let escaped = quick_xml::escape::escape(value).into_owned();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = escaped,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: escaped,
            }),
        }
    }

    /// Replace the content with escaped text.
    pub fn set_text(&mut self, text: &str) {
        self.replace_content(quick_xml::escape::escape(text).into_owned());
    }

    /// Replace the content with raw markup.
    pub fn set_html(&mut self, html: &str) {
        self.replace_content(html.to_string());
    }

    fn replace_content(&mut self, raw: String) {
        self.self_closing = false;
        self.children = vec![Node::Raw(raw)];
    }

    /// Apply a resolved value according to its binding target.
    pub fn write(&mut self, target: &WriteTarget, value: &str) {
        match target {
            WriteTarget::Text => self.set_text(value),
            WriteTarget::Html => self.set_html(value),
            WriteTarget::Attribute(name) => self.set_attribute(name, value),
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&attr.value.replace('"', "&quot;"));
            out.push('"');
        }
        if self.self_closing {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl Node {
    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_to(out),
            Node::Raw(raw) => out.push_str(raw),
        }
    }
}

/// Builds the tree from the flat event stream.
#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn open(&mut self, element: Element) {
        if element.is_void() {
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    /// Handle a start tag ending at `end` in `markup`. Raw text elements
    /// consume their content and end tag; the returned offset is where
    /// tokenizing resumes.
    fn start(&mut self, mut element: Element, markup: &str, end: usize) -> Option<usize> {
        if !is_raw_text(&element.name) {
            self.open(element);
            return None;
        }
        let rest = &markup[end..];
        let (content_len, close) = find_raw_text_end(rest, &element.name);
        if content_len > 0 {
            element.children.push(Node::Raw(rest[..content_len].to_string()));
        }
        self.append(Node::Element(element));
        Some(end + close)
    }

    /// Close the nearest open element with this name, and everything
    /// opened inside it. Unmatched end tags are dropped.
    fn close(&mut self, name: &str) {
        if is_void(name) {
            return;
        }
        let Some(index) = self
            .open
            .iter()
            .rposition(|e| e.name.eq_ignore_ascii_case(name))
        else {
            return;
        };
        while self.open.len() > index {
            if let Some(element) = self.open.pop() {
                self.append(Node::Element(element));
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
        self.roots
    }
}

/// Parsed template markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parse markup into an owned tree.
    ///
    /// Parsing is lenient the way browsers are: stray `<` characters and
    /// unmatched end tags never fail, they are kept or dropped.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let mut builder = TreeBuilder::default();
        let mut offset = 0;
        let mut reader = html_reader(markup);

        loop {
            let start = offset + reader.buffer_position() as usize;
            let event = reader.read_event();
            let end = offset + reader.buffer_position() as usize;

            let resume = match event {
                Err(e) => {
                    if markup.as_bytes().get(start) != Some(&b'<') {
                        return Err(MarkupError::Syntax {
                            position: start,
                            message: e.to_string(),
                        });
                    }
                    builder.append(Node::Raw("<".to_string()));
                    Some(start + 1)
                }
                Ok(Event::Eof) => break,
                Ok(Event::Start(tag)) | Ok(Event::Empty(tag))
                    if !is_tag_name(tag.name().as_ref()) =>
                {
                    builder.append(Node::Raw("<".to_string()));
                    Some(start + 1)
                }
                Ok(Event::Start(tag)) => {
                    builder.start(Element::from_tag(&tag, false)?, markup, end)
                }
                Ok(Event::Empty(tag)) if slash_in_unquoted_value(&tag) => {
                    let mut element = Element::from_tag(&tag, false)?;
                    if let Some(last) = element.attributes.last_mut() {
                        last.value.push('/');
                    }
                    builder.start(element, markup, end)
                }
                Ok(Event::Empty(tag)) => {
                    builder.append(Node::Element(Element::from_tag(&tag, true)?));
                    None
                }
                Ok(Event::End(tag)) => {
                    if is_tag_name(tag.name().as_ref()) {
                        builder.close(&String::from_utf8_lossy(tag.name().as_ref()));
                    } else {
                        let raw = markup.get(start..end).unwrap_or_default();
                        builder.append(Node::Raw(raw.to_string()));
                    }
                    None
                }
                Ok(_) => {
                    let raw = markup.get(start..end).unwrap_or_default();
                    builder.append(Node::Raw(raw.to_string()));
                    None
                }
            };

            if let Some(position) = resume {
                offset = position;
                reader = html_reader(&markup[position..]);
            }
        }

        Ok(Self {
            nodes: builder.finish(),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// First element, in document order, whose `attribute` equals `marker`.
    pub fn find_marker_mut(&mut self, attribute: &str, marker: &str) -> Option<&mut Element> {
        find_in(&mut self.nodes, attribute, marker)
    }

    pub fn has_marker(&self, attribute: &str, marker: &str) -> bool {
        contains(&self.nodes, attribute, marker)
    }

    /// Serialize the tree back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_to(&mut out);
        }
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn find_in<'a>(nodes: &'a mut [Node], attribute: &str, marker: &str) -> Option<&'a mut Element> {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.attribute(attribute) == Some(marker) {
                return Some(element);
            }
            if let Some(found) = find_in(&mut element.children, attribute, marker) {
                return Some(found);
            }
        }
    }
    None
}

fn contains(nodes: &[Node], attribute: &str, marker: &str) -> bool {
    nodes.iter().any(|node| match node {
        Node::Element(element) => {
            element.attribute(attribute) == Some(marker)
                || contains(&element.children, attribute, marker)
        }
        Node::Raw(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_markup() {
        let markup = "<!DOCTYPE html>\n<html><head><title>Hi &amp; bye</title></head>\
                      <body><!-- note --><p class=\"x\" data-bind=\"name\"></p><br/></body></html>";
        let doc = Document::parse(markup).unwrap();
        assert_eq!(doc.to_html(), markup);
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let doc = Document::parse("<div><img src=\"a.png\"><span>x</span></div>").unwrap();
        let Node::Element(div) = &doc.nodes()[0] else {
            panic!("expected element");
        };
        assert_eq!(div.children().len(), 2);
        assert_eq!(doc.to_html(), "<div><img src=\"a.png\"><span>x</span></div>");
    }

    #[test]
    fn test_lenient_end_tags() {
        let doc = Document::parse("<div><p>one</div></span><p>two").unwrap();
        assert_eq!(doc.to_html(), "<div><p>one</p></div><p>two</p>");
    }

    #[test]
    fn test_unquoted_and_valueless_attributes() {
        let doc = Document::parse("<td width=100 nowrap>x</td>").unwrap();
        assert_eq!(doc.to_html(), "<td width=\"100\" nowrap=\"\">x</td>");
    }

    #[test]
    fn test_find_marker_first_in_document_order() {
        let mut doc =
            Document::parse("<div><p data-bind=\"a\">1</p></div><p data-bind=\"a\">2</p>").unwrap();
        doc.find_marker_mut("data-bind", "a").unwrap().set_text("x");
        assert_eq!(
            doc.to_html(),
            "<div><p data-bind=\"a\">x</p></div><p data-bind=\"a\">2</p>"
        );
        assert!(doc.has_marker("DATA-BIND", "a"));
        assert!(!doc.has_marker("data-bind", "b"));
    }

    #[test]
    fn test_write_targets() {
        let mut doc = Document::parse("<a data-bind=\"link\"/><img data-bind=\"logo\">").unwrap();
        let link = doc.find_marker_mut("data-bind", "link").unwrap();
        link.write(&WriteTarget::Html, "<b>go</b>");
        link.write(&WriteTarget::Attribute("href".into()), "https://x.test/?a=1&b=\"2\"");
        let logo = doc.find_marker_mut("data-bind", "logo").unwrap();
        logo.write(&WriteTarget::Attribute("src".into()), "logo.png");
        assert_eq!(
            doc.to_html(),
            "<a data-bind=\"link\" href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\"><b>go</b></a>\
             <img data-bind=\"logo\" src=\"logo.png\">"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = Document::parse("<p data-bind=\"n\">old</p>").unwrap();
        doc.find_marker_mut("data-bind", "n")
            .unwrap()
            .set_text("<script>&");
        assert_eq!(doc.to_html(), "<p data-bind=\"n\">&lt;script&gt;&amp;</p>");
    }

    #[test]
    fn test_repeated_attribute_keeps_first() {
        let doc = Document::parse("<p class=\"a\" class=\"b\" data-bind=\"n\"></p>").unwrap();
        assert_eq!(doc.to_html(), "<p class=\"a\" data-bind=\"n\"></p>");
    }

    #[test]
    fn test_bare_less_than_is_text() {
        let markup = "<p>1 < 2</p><p data-bind=\"n\"></p>";
        let mut doc = Document::parse(markup).unwrap();
        assert_eq!(doc.to_html(), markup);
        assert_eq!(doc.nodes().len(), 2);

        doc.find_marker_mut("data-bind", "n").unwrap().set_text("x");
        assert_eq!(doc.to_html(), "<p>1 < 2</p><p data-bind=\"n\">x</p>");
    }

    #[test]
    fn test_unterminated_less_than_is_text() {
        let markup = "<p>a <- b</p><p>if x <3";
        let doc = Document::parse(markup).unwrap();
        assert_eq!(doc.to_html(), "<p>a <- b</p><p>if x <3</p>");
    }

    #[test]
    fn test_script_and_style_are_raw_text() {
        let markup = "<script>if (a<b) { x = \"</p>\"; }</script>\
                      <style>p > a { color: red }</style><p data-bind=\"n\"></p>";
        let doc = Document::parse(markup).unwrap();
        assert_eq!(doc.to_html(), markup);
        assert_eq!(doc.nodes().len(), 3);
        assert!(doc.has_marker("data-bind", "n"));
    }

    #[test]
    fn test_raw_text_marker_is_not_an_element() {
        let doc = Document::parse("<script><p data-bind=\"n\"></p></SCRIPT>").unwrap();
        assert!(!doc.has_marker("data-bind", "n"));
        assert_eq!(doc.to_html(), "<script><p data-bind=\"n\"></p></script>");
    }

    #[test]
    fn test_trailing_slash_in_unquoted_value() {
        let doc = Document::parse("<a href=http://x/y/>z</a><br/><img src=\"a.png\"/>").unwrap();
        assert_eq!(
            doc.to_html(),
            "<a href=\"http://x/y/\">z</a><br/><img src=\"a.png\"/>"
        );
    }
}

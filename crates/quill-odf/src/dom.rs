//! Mutable XML tree for package parts
//!
//! Parts are parsed into an arena of nodes addressed by [`NodeId`]. Nodes are
//! never freed while the document lives: removing a node only detaches it
//! from its parent, so ids stay valid and side tables indexed by
//! [`NodeId::index`] remain usable for the whole pass.
//!
//! Text is kept unescaped. Attribute values are kept exactly as they appear
//! in the source (still escaped), so character references the tree does not
//! care about survive a parse/serialize round trip untouched.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Handle to a node inside an [`XmlDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic node every document is rooted at
    Document,
    /// An element with its qualified name and raw attribute values
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Character data (unescaped)
    Text(String),
    /// `<![CDATA[...]]>` content
    CData(String),
    /// `<!--...-->` content
    Comment(String),
    /// `<?...?>` content other than the XML declaration
    ProcessingInstruction(String),
    /// `<!DOCTYPE ...>` content
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The `<?xml ...?>` declaration of a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A well-formedness failure, located in the source text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct XmlError {
    pub message: String,
    /// Byte offset into the source
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl XmlError {
    fn at(source: &[u8], offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;

        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

/// Errors raised by tree mutations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The reference node has no parent to insert into or remove from
    #[error("node {0:?} is not attached to a parent")]
    Detached(NodeId),
}

/// A parsed, mutable XML document
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    declaration: Option<XmlDeclaration>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
        }
    }

    /// Parse a document from a string
    pub fn parse_str(source: &str) -> Result<Self, XmlError> {
        Self::parse(source.as_bytes())
    }

    /// Parse a document from raw bytes
    pub fn parse(source: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        let mut doc = Self::new();
        let mut stack: Vec<NodeId> = vec![doc.root()];
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let start = reader.buffer_position() as usize;
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XmlError::at(source, reader.buffer_position() as usize, e.to_string()))?;
            let top = stack[stack.len() - 1];

            match event {
                Event::Decl(d) => {
                    let version = d
                        .version()
                        .map(lossy)
                        .map_err(|e| XmlError::at(source, start, e.to_string()))?;
                    let encoding = d.encoding().and_then(|r| r.ok()).map(lossy);
                    let standalone = d.standalone().and_then(|r| r.ok()).map(lossy);
                    doc.declaration = Some(XmlDeclaration {
                        version,
                        encoding,
                        standalone,
                    });
                }
                Event::Start(s) => {
                    if stack.len() == 1 && doc.document_element().is_some() {
                        return Err(XmlError::at(source, start, "multiple root elements"));
                    }
                    let id = doc.element_from(&s, source, start)?;
                    doc.append_child(top, id);
                    stack.push(id);
                }
                Event::Empty(s) => {
                    if stack.len() == 1 && doc.document_element().is_some() {
                        return Err(XmlError::at(source, start, "multiple root elements"));
                    }
                    let id = doc.element_from(&s, source, start)?;
                    doc.append_child(top, id);
                }
                Event::End(e) => {
                    let name = lossy(e.name().as_ref());
                    if stack.len() == 1 {
                        return Err(XmlError::at(
                            source,
                            start,
                            format!("unexpected closing tag </{name}>"),
                        ));
                    }
                    let open = doc.name(top).unwrap_or_default();
                    if open != name {
                        return Err(XmlError::at(
                            source,
                            start,
                            format!("expected </{open}>, found </{name}>"),
                        ));
                    }
                    stack.pop();
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| XmlError::at(source, start, e.to_string()))?;
                    if stack.len() == 1 {
                        if !text.trim().is_empty() {
                            return Err(XmlError::at(
                                source,
                                start,
                                "text outside of the root element",
                            ));
                        }
                        continue;
                    }
                    let id = doc.push(NodeKind::Text(text.into_owned()));
                    doc.append_child(top, id);
                }
                Event::CData(t) => {
                    let id = doc.push(NodeKind::CData(lossy(t.into_inner())));
                    doc.append_child(top, id);
                }
                Event::Comment(t) => {
                    let id = doc.push(NodeKind::Comment(lossy(t.into_inner())));
                    doc.append_child(top, id);
                }
                Event::PI(t) => {
                    let content = format!("{}{}", lossy(t.target()), lossy(t.content()));
                    let id = doc.push(NodeKind::ProcessingInstruction(content));
                    doc.append_child(top, id);
                }
                Event::DocType(t) => {
                    let id = doc.push(NodeKind::DocType(lossy(t.into_inner())));
                    doc.append_child(top, id);
                }
                Event::Eof => break,
            }
        }

        if stack.len() > 1 {
            let open = doc.name(stack[stack.len() - 1]).unwrap_or_default();
            return Err(XmlError::at(
                source,
                source.len(),
                format!("unclosed element <{open}>"),
            ));
        }
        if doc.document_element().is_none() {
            return Err(XmlError::at(source, source.len(), "no root element"));
        }

        Ok(doc)
    }

    fn element_from(
        &mut self,
        start: &BytesStart<'_>,
        source: &[u8],
        offset: usize,
    ) -> Result<NodeId, XmlError> {
        let name = lossy(start.name().as_ref());
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::at(source, offset, e.to_string()))?;
            attributes.push((lossy(attr.key.as_ref()), lossy(attr.value.as_ref())));
        }
        Ok(self.push(NodeKind::Element { name, attributes }))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single top-level element
    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    /// The XML declaration, if the source had one
    pub fn declaration(&self) -> Option<&XmlDeclaration> {
        self.declaration.as_ref()
    }

    /// Number of nodes ever allocated in this document, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    /// Qualified name of an element
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether `id` is an element with the given qualified name (ASCII case-insensitive)
    pub fn is_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id).is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of every text and CDATA descendant
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match &self.nodes[node.0].kind {
                NodeKind::Text(t) | NodeKind::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Unescaped value of an attribute
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, raw)| unescape_lossy(raw).into_owned()),
            _ => None,
        }
    }

    /// All attributes of an element, unescaped, in source order
    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .map(|(key, raw)| (key.clone(), unescape_lossy(raw).into_owned()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child nodes that are elements
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.is_element(child))
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    /// Every node below `id` in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Parent, grandparent and so on up to the document node
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Every attached element with the given name, in document order
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&id| self.is_named(id, name))
            .collect()
    }

    /// Closest ancestor of `id` that is an element named `name`
    pub fn nearest_ancestor_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.is_named(a, name))
    }

    /// Whether `id` can still be reached from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Set an attribute, escaping the value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            let raw = escape_attribute(value).into_owned();
            match attributes.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = raw,
                None => attributes.push((name.to_string(), raw)),
            }
        }
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeKind::Text(content) = &mut self.nodes[id.0].kind {
            *content = text.into();
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `new` immediately before `reference` in its parent
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(reference).ok_or(TreeError::Detached(reference))?;
        self.detach(new);
        let children = &mut self.nodes[parent.0].children;
        let index = children
            .iter()
            .position(|&c| c == reference)
            .ok_or(TreeError::Detached(reference))?;
        children.insert(index, new);
        self.nodes[new.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `new` immediately after `reference` in its parent
    ///
    /// When `reference` is the last child, `new` is appended; otherwise it is
    /// inserted before the reference's next sibling.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(reference).ok_or(TreeError::Detached(reference))?;
        if self.last_child(parent) == Some(reference) {
            self.append_child(parent, new);
            return Ok(());
        }
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, new),
            None => Err(TreeError::Detached(reference)),
        }
    }

    /// Detach `id` (and its subtree) from its parent
    pub fn remove_child(&mut self, id: NodeId) -> Result<(), TreeError> {
        if self.parent(id).is_none() {
            return Err(TreeError::Detached(id));
        }
        self.detach(id);
        Ok(())
    }

    /// Put `new` where `old` is and detach `old`
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        self.insert_before(old, new)?;
        self.remove_child(old)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize the whole document
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str("<?xml version=\"");
            out.push_str(&decl.version);
            out.push('"');
            if let Some(encoding) = &decl.encoding {
                out.push_str(" encoding=\"");
                out.push_str(encoding);
                out.push('"');
            }
            if let Some(standalone) = &decl.standalone {
                out.push_str(" standalone=\"");
                out.push_str(standalone);
                out.push('"');
            }
            out.push_str("?>\n");
        }
        for &child in self.children(self.root()) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize a single node and its subtree
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut steps = vec![Step::Open(id)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Close(node) => {
                    if let Some(name) = self.name(node) {
                        out.push_str("</");
                        out.push_str(name);
                        out.push('>');
                    }
                }
                Step::Open(node) => match &self.nodes[node.0].kind {
                    NodeKind::Document => {
                        for &child in self.children(node).iter().rev() {
                            steps.push(Step::Open(child));
                        }
                    }
                    NodeKind::Element { name, attributes } => {
                        out.push('<');
                        out.push_str(name);
                        for (key, raw) in attributes {
                            let quote = if raw.contains('"') { '\'' } else { '"' };
                            out.push(' ');
                            out.push_str(key);
                            out.push('=');
                            out.push(quote);
                            out.push_str(raw);
                            out.push(quote);
                        }
                        let children = self.children(node);
                        if children.is_empty() {
                            out.push_str("/>");
                        } else {
                            out.push('>');
                            steps.push(Step::Close(node));
                            for &child in children.iter().rev() {
                                steps.push(Step::Open(child));
                            }
                        }
                    }
                    NodeKind::Text(text) => out.push_str(&escape_text(text)),
                    NodeKind::CData(text) => {
                        out.push_str("<![CDATA[");
                        out.push_str(text);
                        out.push_str("]]>");
                    }
                    NodeKind::Comment(text) => {
                        out.push_str("<!--");
                        out.push_str(text);
                        out.push_str("-->");
                    }
                    NodeKind::ProcessingInstruction(text) => {
                        out.push_str("<?");
                        out.push_str(text);
                        out.push_str("?>");
                    }
                    NodeKind::DocType(text) => {
                        out.push_str("<!DOCTYPE");
                        out.push_str(text);
                        out.push('>');
                    }
                },
            }
        }
    }
}

/// Iterator over the descendants of a node, see [`XmlDocument::descendants`]
pub struct Descendants<'a> {
    doc: &'a XmlDocument,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Iterator over the ancestors of a node, see [`XmlDocument::ancestors`]
pub struct Ancestors<'a> {
    doc: &'a XmlDocument,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

/// Escape character data for element content
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Escape a value for use inside a quoted attribute or as printed template output
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

fn unescape_lossy(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

fn lossy(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:office" xmlns:text="urn:text"><office:body><office:text><text:p text:style-name="Standard">Hello &amp; <text:span>world</text:span></text:p><text:p/></office:text></office:body></office:document-content>"#;

    #[test]
    fn test_roundtrip() {
        let doc = XmlDocument::parse_str(SAMPLE).unwrap();
        assert_eq!(doc.to_xml(), SAMPLE);
    }

    #[test]
    fn test_declaration() {
        let doc = XmlDocument::parse_str(SAMPLE).unwrap();
        let decl = doc.declaration().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(decl.standalone, None);
    }

    #[test]
    fn test_queries() {
        let doc = XmlDocument::parse_str(SAMPLE).unwrap();
        let paragraphs = doc.elements_named("text:p");
        assert_eq!(paragraphs.len(), 2);

        let first = paragraphs[0];
        assert_eq!(doc.attribute(first, "text:style-name").as_deref(), Some("Standard"));
        assert_eq!(doc.text_content(first), "Hello & world");
        assert_eq!(doc.next_sibling(first), Some(paragraphs[1]));
        assert_eq!(doc.next_sibling(paragraphs[1]), None);

        let span = doc.elements_named("text:span")[0];
        assert_eq!(doc.nearest_ancestor_named(span, "TEXT:P"), Some(first));
        let names: Vec<_> = doc
            .ancestors(span)
            .filter_map(|a| doc.name(a).map(str::to_owned))
            .collect();
        assert_eq!(
            names,
            vec!["text:p", "office:text", "office:body", "office:document-content"]
        );
    }

    #[test]
    fn test_insert_and_remove() {
        let mut doc = XmlDocument::parse_str("<r><a/><b/></r>").unwrap();
        let root = doc.document_element().unwrap();
        let a = doc.children(root)[0];
        let b = doc.children(root)[1];

        let before = doc.create_text("x");
        doc.insert_before(a, before).unwrap();
        let after = doc.create_text("y");
        doc.insert_after(a, after).unwrap();
        let tail = doc.create_text("z");
        doc.insert_after(b, tail).unwrap();
        assert_eq!(doc.to_xml(), "<r>x<a/>y<b/>z</r>");

        doc.remove_child(a).unwrap();
        assert!(!doc.is_attached(a));
        assert!(doc.is_attached(b));
        assert_eq!(doc.to_xml(), "<r>xy<b/>z</r>");
        assert_eq!(doc.remove_child(a), Err(TreeError::Detached(a)));
    }

    #[test]
    fn test_replace_and_attributes() {
        let mut doc = XmlDocument::parse_str(r#"<r><a k="1 &lt; 2"/></r>"#).unwrap();
        let root = doc.document_element().unwrap();
        let a = doc.children(root)[0];
        assert_eq!(doc.attribute(a, "k").as_deref(), Some("1 < 2"));

        let span = doc.create_element("span");
        doc.set_attribute(span, "title", "\"quoted\" & more");
        let text = doc.create_text("a < b");
        doc.append_child(span, text);
        doc.replace_child(a, span).unwrap();

        assert_eq!(
            doc.to_xml(),
            "<r><span title=\"&quot;quoted&quot; &amp; more\">a &lt; b</span></r>"
        );
    }

    #[test]
    fn test_raw_attribute_values_survive() {
        let source = r#"<r a="line&#13;&#10;next" b='say "hi"'/>"#;
        let doc = XmlDocument::parse_str(source).unwrap();
        assert_eq!(doc.to_xml(), source);
    }

    #[test]
    fn test_comments_cdata_and_pi() {
        let source = "<r><!-- note --><![CDATA[a < b]]><?target data?></r>";
        let doc = XmlDocument::parse_str(source).unwrap();
        assert_eq!(doc.to_xml(), source);
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = XmlDocument::parse_str("<r>\n  <a></b>\n</r>").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unclosed_element() {
        assert!(XmlDocument::parse_str("<r><a>").is_err());
        assert!(XmlDocument::parse_str("<r>").is_err());
    }

    #[test]
    fn test_multiple_roots_and_stray_text() {
        assert!(XmlDocument::parse_str("<a/><b/>").is_err());
        assert!(XmlDocument::parse_str("<a/>tail").is_err());
        assert!(XmlDocument::parse_str("").is_err());
    }

    #[test]
    fn test_descendants_are_document_ordered() {
        let doc = XmlDocument::parse_str("<r><a><b/></a><c/></r>").unwrap();
        let names: Vec<_> = doc
            .descendants(doc.root())
            .filter_map(|id| doc.name(id).map(str::to_owned))
            .collect();
        assert_eq!(names, vec!["r", "a", "b", "c"]);
    }

    #[test]
    fn test_error_location_counts_characters() {
        let source = "<r>\n  é<x";
        let err = XmlError::at(source.as_bytes(), source.len() - 2, "boom");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 4);
        assert_eq!(err.to_string(), "boom at line 2, column 4");
    }
}

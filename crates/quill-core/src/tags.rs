//! Template tag recognition and field scanning
//!
//! A field is a `text:text-input` element whose first child is a text node
//! holding exactly one template tag. The delimiters are configurable, so all
//! patterns are compiled from a [`TagSyntax`].

use quill_odf::names::{TEXT_DESCRIPTION, TEXT_INPUT};
use quill_odf::{NodeId, XmlDocument};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TemplateFault;

/// Delimiters of the template language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSyntax {
    pub variable_start: String,
    pub variable_end: String,
    pub block_start: String,
    pub block_end: String,
    pub comment_start: String,
    pub comment_end: String,
}

impl Default for TagSyntax {
    fn default() -> Self {
        Self {
            variable_start: "{{".to_string(),
            variable_end: "}}".to_string(),
            block_start: "{%".to_string(),
            block_end: "%}".to_string(),
            comment_start: "{#".to_string(),
            comment_end: "#}".to_string(),
        }
    }
}

impl TagSyntax {
    /// Whether these are the stock Jinja delimiters
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Whether a tag prints a value or controls flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `{{ ... }}`
    Print,
    /// `{% ... %}`
    Block,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Print => "print",
            TagKind::Block => "block",
        }
    }
}

/// Compiled tag patterns for one [`TagSyntax`]
#[derive(Debug, Clone)]
pub struct TagMatcher {
    syntax: TagSyntax,
    tag: Regex,
    block: Regex,
}

impl TagMatcher {
    pub fn new(syntax: &TagSyntax) -> Result<Self, regex::Error> {
        let vs = regex::escape(&syntax.variable_start);
        let ve = regex::escape(&syntax.variable_end);
        let bs = regex::escape(&syntax.block_start);
        let be = regex::escape(&syntax.block_end);

        Ok(Self {
            syntax: syntax.clone(),
            tag: Regex::new(&format!(r"(?s)^(?:{vs}|{bs}).*(?:{ve}|{be})$"))?,
            block: Regex::new(&format!(r"(?s)^{bs}.*{be}$"))?,
        })
    }

    pub fn syntax(&self) -> &TagSyntax {
        &self.syntax
    }

    /// Whether `content` is one complete print or block tag
    pub fn is_tag(&self, content: &str) -> bool {
        self.tag.is_match(content)
    }

    pub fn is_block_tag(&self, content: &str) -> bool {
        self.block.is_match(content)
    }

    pub fn is_print_tag(&self, content: &str) -> bool {
        self.is_tag(content) && !self.is_block_tag(content)
    }

    /// Whether `content` starts like a tag, closed or not
    pub fn opens_tag(&self, content: &str) -> bool {
        content.starts_with(&self.syntax.variable_start)
            || content.starts_with(&self.syntax.block_start)
    }

    pub fn kind_of(&self, content: &str) -> Option<TagKind> {
        if self.is_block_tag(content) {
            Some(TagKind::Block)
        } else if self.is_tag(content) {
            Some(TagKind::Print)
        } else {
            None
        }
    }
}

/// An input field holding a template tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The `text:text-input` element
    pub node: NodeId,
    /// Trimmed tag text
    pub content: String,
    pub kind: TagKind,
    /// Trimmed, lower-cased `text:description`, if not empty
    pub hint: Option<String>,
}

impl Field {
    /// Whether the tag pipes its value through the markdown filter
    pub fn is_markdown(&self) -> bool {
        self.content
            .to_lowercase()
            .find("|markdown")
            .is_some_and(|pos| pos > 0)
    }
}

/// Finds fields in a parsed part
#[derive(Debug, Clone)]
pub struct FieldScanner {
    matcher: TagMatcher,
}

impl FieldScanner {
    pub fn new(syntax: &TagSyntax) -> Result<Self, regex::Error> {
        Ok(Self {
            matcher: TagMatcher::new(syntax)?,
        })
    }

    pub fn matcher(&self) -> &TagMatcher {
        &self.matcher
    }

    /// Lazily yield every field of `doc` in document order
    ///
    /// Input fields holding plain text are skipped. A field that starts a tag
    /// without closing it yields [`TemplateFault::UnclosedTag`].
    pub fn fields<'a>(
        &'a self,
        doc: &'a XmlDocument,
    ) -> impl Iterator<Item = Result<Field, TemplateFault>> + 'a {
        doc.descendants(doc.root())
            .filter(move |&id| doc.is_named(id, TEXT_INPUT))
            .filter_map(move |id| self.field_at(doc, id))
    }

    /// Collect all fields, stopping at the first fault
    pub fn scan(&self, doc: &XmlDocument) -> Result<Vec<Field>, TemplateFault> {
        self.fields(doc).collect()
    }

    fn field_at(&self, doc: &XmlDocument, id: NodeId) -> Option<Result<Field, TemplateFault>> {
        let content = doc.text(doc.first_child(id)?)?.trim();

        let Some(kind) = self.matcher.kind_of(content) else {
            if self.matcher.opens_tag(content) {
                return Some(Err(TemplateFault::UnclosedTag {
                    content: content.to_string(),
                }));
            }
            return None;
        };

        let hint = doc
            .attribute(id, TEXT_DESCRIPTION)
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty());

        Some(Ok(Field {
            node: id,
            content: content.to_string(),
            kind,
            hint,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_odf::test_utils::content_xml;

    fn matcher() -> TagMatcher {
        TagMatcher::new(&TagSyntax::default()).unwrap()
    }

    #[test]
    fn test_tag_kinds() {
        let m = matcher();
        assert_eq!(m.kind_of("{{ name }}"), Some(TagKind::Print));
        assert_eq!(m.kind_of("{% for x in xs %}"), Some(TagKind::Block));
        assert_eq!(m.kind_of("{{ a }} and {% b %}"), Some(TagKind::Print));
        assert_eq!(m.kind_of("plain text"), None);
        assert_eq!(m.kind_of("{# comment #}"), None);
        assert!(m.is_print_tag("{{\nmultiline\n}}"));
        assert!(!m.is_print_tag("{% if %}"));
    }

    #[test]
    fn test_custom_syntax() {
        let syntax = TagSyntax {
            variable_start: "[[".into(),
            variable_end: "]]".into(),
            block_start: "[%".into(),
            block_end: "%]".into(),
            ..TagSyntax::default()
        };
        let m = TagMatcher::new(&syntax).unwrap();
        assert_eq!(m.kind_of("[[ name ]]"), Some(TagKind::Print));
        assert_eq!(m.kind_of("[% if x %]"), Some(TagKind::Block));
        assert_eq!(m.kind_of("{{ name }}"), None);
        assert!(!syntax.is_default());
    }

    #[test]
    fn test_markdown_flag() {
        let field = |content: &str| Field {
            node: XmlDocument::new().root(),
            content: content.to_string(),
            kind: TagKind::Print,
            hint: None,
        };
        assert!(field("{{ body|markdown }}").is_markdown());
        assert!(field("{{ body | trim |Markdown }}").is_markdown());
        assert!(!field("{{ body }}").is_markdown());
    }

    #[test]
    fn test_scan_fields() {
        let xml = content_xml(concat!(
            r#"<text:p><text:text-input text:description=" Row ">{% for x in xs %}</text:text-input></text:p>"#,
            r#"<text:p><text:text-input>  {{ x }}  </text:text-input></text:p>"#,
            r#"<text:p><text:text-input>not a tag</text:text-input></text:p>"#,
            r#"<text:p><text:text-input/></text:p>"#,
            r#"<text:p><text:text-input><text:span>{{ y }}</text:span></text:text-input></text:p>"#,
        ));
        let doc = XmlDocument::parse_str(&xml).unwrap();
        let scanner = FieldScanner::new(&TagSyntax::default()).unwrap();
        let fields = scanner.scan(&doc).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].content, "{% for x in xs %}");
        assert_eq!(fields[0].kind, TagKind::Block);
        assert_eq!(fields[0].hint.as_deref(), Some("row"));
        assert_eq!(fields[1].content, "{{ x }}");
        assert_eq!(fields[1].kind, TagKind::Print);
        assert_eq!(fields[1].hint, None);

        // restartable
        assert_eq!(scanner.scan(&doc).unwrap(), fields);
    }

    #[test]
    fn test_unclosed_tag() {
        let xml = content_xml("<text:p><text:text-input>{{ name</text:text-input></text:p>");
        let doc = XmlDocument::parse_str(&xml).unwrap();
        let scanner = FieldScanner::new(&TagSyntax::default()).unwrap();
        assert_eq!(
            scanner.scan(&doc),
            Err(TemplateFault::UnclosedTag {
                content: "{{ name".to_string()
            })
        );
    }
}

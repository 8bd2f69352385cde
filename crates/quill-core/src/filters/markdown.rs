//! The `markdown` filter
//!
//! Converts markdown text into ODF paragraph markup. Fields using the
//! filter are always placed at paragraph level, so the output replaces the
//! field's whole paragraph.

use minijinja::Value;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use quill_odf::dom::{escape_attribute, escape_text};
use quill_odf::names::{
    OFFICE_AUTOMATIC_STYLES, STYLE_FAMILY, STYLE_NAME, STYLE_STYLE, STYLE_TEXT_PROPERTIES,
};
use quill_odf::NodeId;

use crate::job::XmlPart;
use crate::renderer::Renderer;

pub const BOLD_STYLE: &str = "markdown_bold";
pub const ITALIC_STYLE: &str = "markdown_italic";
pub const CODE_STYLE: &str = "markdown_code";

const PARAGRAPH_STYLE: &str = "Standard";
const PREFORMATTED_STYLE: &str = "Preformatted_20_Text";
const RULE_STYLE: &str = "Horizontal_20_Line";
const BULLET_LIST_STYLE: &str = "List_20_1";
const NUMBERED_LIST_STYLE: &str = "Numbering_20_123";

/// Automatic text styles used by the generated spans
const SPAN_STYLES: &[(&str, &[(&str, &str)])] = &[
    (
        BOLD_STYLE,
        &[
            ("fo:font-weight", "bold"),
            ("style:font-weight-asian", "bold"),
            ("style:font-weight-complex", "bold"),
        ],
    ),
    (
        ITALIC_STYLE,
        &[
            ("fo:font-style", "italic"),
            ("style:font-style-asian", "italic"),
            ("style:font-style-complex", "italic"),
        ],
    ),
    (
        CODE_STYLE,
        &[
            ("fo:font-family", "'Liberation Mono'"),
            ("style:font-family-generic", "modern"),
            ("style:font-pitch", "fixed"),
        ],
    ),
];

pub(crate) fn register(renderer: &mut Renderer) {
    renderer.environment_mut().add_filter("markdown", markdown);

    renderer.register_before_part_render("markdown", |job, part| {
        let uses_markdown = job
            .renderer()
            .scanner()
            .fields(&part.doc)
            .filter_map(Result::ok)
            .any(|field| field.is_markdown());
        if uses_markdown {
            add_span_styles(part);
        }
        Ok(())
    });
}

/// Filter entry point; values that are not strings render as nothing
pub fn markdown(value: Value) -> Value {
    let odf = value.as_str().map(markdown_to_odf).unwrap_or_default();
    Value::from_safe_string(odf)
}

/// Convert markdown to a sequence of ODF block elements
pub fn markdown_to_odf(source: &str) -> String {
    let mut writer = OdfWriter::default();
    for event in Parser::new(source) {
        writer.event(event);
    }
    writer.finish()
}

/// Add the span styles missing from the part's automatic styles
fn add_span_styles(part: &mut XmlPart) {
    let Some(styles) = part.doc.elements_named(OFFICE_AUTOMATIC_STYLES).first().copied() else {
        tracing::debug!(part = %part.name, "no automatic styles, markdown spans stay unstyled");
        return;
    };

    for (name, properties) in SPAN_STYLES {
        if has_style(part, styles, name) {
            continue;
        }
        let style = part.doc.create_element(STYLE_STYLE);
        part.doc.set_attribute(style, STYLE_NAME, name);
        part.doc.set_attribute(style, STYLE_FAMILY, "text");

        let props = part.doc.create_element(STYLE_TEXT_PROPERTIES);
        for (attr, value) in *properties {
            part.doc.set_attribute(props, attr, value);
        }
        part.doc.append_child(style, props);
        part.doc.append_child(styles, style);
    }
}

fn has_style(part: &XmlPart, styles: NodeId, name: &str) -> bool {
    part.doc
        .element_children(styles)
        .any(|style| part.doc.attribute(style, STYLE_NAME).as_deref() == Some(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Paragraph or heading
    Text,
    /// Paragraph opened for list item content
    ImplicitText,
    CodeBlock,
    ListItem,
    Container,
    Inline,
    /// Markup with no ODF counterpart, content passes through
    Ignored,
}

#[derive(Debug)]
struct Open {
    scope: Scope,
    close: &'static str,
}

#[derive(Debug, Default)]
struct OdfWriter {
    out: String,
    open: Vec<Open>,
    code: String,
}

impl OdfWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => self.text(&text),
            Event::Code(code) => {
                self.ensure_text();
                self.out.push_str(&format!(
                    "<text:span text:style-name=\"{CODE_STYLE}\">{}</text:span>",
                    escape_text(&code)
                ));
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => {
                self.ensure_text();
                self.out.push_str("<text:line-break/>");
            }
            Event::Rule => {
                self.close_implicit();
                self.out
                    .push_str(&format!("<text:p text:style-name=\"{RULE_STYLE}\"/>"));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit();
                self.push(Scope::Text, paragraph_open(PARAGRAPH_STYLE), "</text:p>");
            }
            Tag::Heading { level, .. } => {
                self.close_implicit();
                let level = level as usize;
                let open = format!(
                    "<text:h text:style-name=\"Heading_20_{level}\" text:outline-level=\"{level}\">"
                );
                self.push(Scope::Text, open, "</text:h>");
            }
            Tag::CodeBlock(kind) => {
                self.close_implicit();
                if let CodeBlockKind::Fenced(lang) = &kind {
                    tracing::trace!(lang = %lang, "code block");
                }
                self.code.clear();
                self.push(Scope::CodeBlock, paragraph_open(PREFORMATTED_STYLE), "</text:p>");
            }
            Tag::List(first) => {
                self.close_implicit();
                let style = if first.is_some() {
                    NUMBERED_LIST_STYLE
                } else {
                    BULLET_LIST_STYLE
                };
                let open = format!("<text:list text:style-name=\"{style}\">");
                self.push(Scope::Container, open, "</text:list>");
            }
            Tag::Item => {
                self.push(Scope::ListItem, "<text:list-item>".into(), "</text:list-item>");
            }
            Tag::BlockQuote(..) => {
                self.close_implicit();
                self.push(Scope::Container, String::new(), "");
            }
            Tag::Emphasis => self.span(ITALIC_STYLE),
            Tag::Strong => self.span(BOLD_STYLE),
            Tag::Link { dest_url, .. } => {
                self.ensure_text();
                let open = format!(
                    "<text:a xlink:type=\"simple\" xlink:href=\"{}\">",
                    escape_attribute(&dest_url)
                );
                self.push(Scope::Inline, open, "</text:a>");
            }
            _ => self.push(Scope::Ignored, String::new(), ""),
        }
    }

    fn end(&mut self) {
        self.close_implicit();
        let Some(open) = self.open.pop() else {
            return;
        };
        if open.scope == Scope::CodeBlock {
            let code = std::mem::take(&mut self.code);
            self.out.push_str(&preformatted(&code));
        }
        self.out.push_str(open.close);
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block() {
            self.code.push_str(text);
            return;
        }
        self.ensure_text();
        self.out.push_str(&escape_text(text));
    }

    fn span(&mut self, style: &str) {
        self.ensure_text();
        let open = format!("<text:span text:style-name=\"{style}\">");
        self.push(Scope::Inline, open, "</text:span>");
    }

    fn push(&mut self, scope: Scope, open: String, close: &'static str) {
        self.out.push_str(&open);
        self.open.push(Open { scope, close });
    }

    /// Innermost scope that decides where character data may go
    fn block_scope(&self) -> Option<Scope> {
        self.open
            .iter()
            .rev()
            .map(|open| open.scope)
            .find(|scope| !matches!(scope, Scope::Inline | Scope::Ignored))
    }

    fn in_code_block(&self) -> bool {
        self.block_scope() == Some(Scope::CodeBlock)
    }

    /// Open a paragraph when character data arrives outside of one
    fn ensure_text(&mut self) {
        if matches!(
            self.block_scope(),
            Some(Scope::Text | Scope::ImplicitText | Scope::CodeBlock)
        ) {
            return;
        }
        self.push(Scope::ImplicitText, paragraph_open(PARAGRAPH_STYLE), "</text:p>");
    }

    fn close_implicit(&mut self) {
        while self
            .open
            .last()
            .is_some_and(|open| open.scope == Scope::ImplicitText)
        {
            if let Some(open) = self.open.pop() {
                self.out.push_str(open.close);
            }
        }
    }

    fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end();
        }
        self.out
    }
}

fn paragraph_open(style: &str) -> String {
    format!("<text:p text:style-name=\"{style}\">")
}

/// Code lines joined by line breaks, each group of four leading spaces as a tab
fn preformatted(code: &str) -> String {
    code.trim_end_matches('\n')
        .split('\n')
        .map(|line| {
            let indent = line.len() - line.trim_start_matches(' ').len();
            let tabs = indent / 4;
            format!(
                "{}{}",
                "<text:tab/>".repeat(tabs),
                escape_text(&line[tabs * 4..])
            )
        })
        .collect::<Vec<_>>()
        .join("<text:line-break/>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use quill_odf::XmlDocument;

    #[test]
    fn test_paragraphs_and_spans() {
        assert_eq!(
            markdown_to_odf("Hello *world* and **you**\n\nBye"),
            concat!(
                "<text:p text:style-name=\"Standard\">Hello ",
                "<text:span text:style-name=\"markdown_italic\">world</text:span> and ",
                "<text:span text:style-name=\"markdown_bold\">you</text:span></text:p>",
                "<text:p text:style-name=\"Standard\">Bye</text:p>"
            )
        );
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            markdown_to_odf("## Title"),
            "<text:h text:style-name=\"Heading_20_2\" text:outline-level=\"2\">Title</text:h>"
        );
    }

    #[test]
    fn test_tight_list_items_get_paragraphs() {
        assert_eq!(
            markdown_to_odf("- a\n- b"),
            concat!(
                "<text:list text:style-name=\"List_20_1\">",
                "<text:list-item><text:p text:style-name=\"Standard\">a</text:p></text:list-item>",
                "<text:list-item><text:p text:style-name=\"Standard\">b</text:p></text:list-item>",
                "</text:list>"
            )
        );
    }

    #[test]
    fn test_nested_list_closes_item_paragraph() {
        let odf = markdown_to_odf("1. a\n   - b");
        assert!(odf.starts_with("<text:list text:style-name=\"Numbering_20_123\"><text:list-item><text:p text:style-name=\"Standard\">a</text:p><text:list "));
        XmlDocument::parse_str(&format!("<r>{odf}</r>")).unwrap();
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            markdown_to_odf("```\nfn main() {\n    x < 1\n}\n```"),
            concat!(
                "<text:p text:style-name=\"Preformatted_20_Text\">",
                "fn main() {<text:line-break/><text:tab/>x &lt; 1<text:line-break/>}",
                "</text:p>"
            )
        );
    }

    #[test]
    fn test_inline_code_link_and_rule() {
        let odf = markdown_to_odf("Run `a&b` at [home](http://x.org/?a=1&b=2)\n\n---");
        assert!(odf.contains("<text:span text:style-name=\"markdown_code\">a&amp;b</text:span>"));
        assert!(odf.contains(
            "<text:a xlink:type=\"simple\" xlink:href=\"http://x.org/?a=1&amp;b=2\">home</text:a>"
        ));
        assert!(odf.ends_with("<text:p text:style-name=\"Horizontal_20_Line\"/>"));
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(
            markdown_to_odf("a  \nb"),
            "<text:p text:style-name=\"Standard\">a<text:line-break/>b</text:p>"
        );
    }

    #[test]
    fn test_filter_output_is_safe() {
        let renderer = Renderer::new().unwrap();
        let out = renderer
            .environment()
            .render_str("{{ text|markdown }}|{{ 3|markdown }}", context! { text => "*x*" })
            .unwrap();
        assert_eq!(
            out,
            "<text:p text:style-name=\"Standard\"><text:span text:style-name=\"markdown_italic\">x</text:span></text:p>|"
        );
    }

    #[test]
    fn test_span_styles_added_once() {
        let mut part = XmlPart {
            name: "content.xml".into(),
            doc: XmlDocument::parse_str(&format!(
                "<office:document-content><office:automatic-styles><style:style {STYLE_NAME}=\"{BOLD_STYLE}\"/></office:automatic-styles></office:document-content>"
            ))
            .unwrap(),
        };
        add_span_styles(&mut part);
        add_span_styles(&mut part);

        let styles = part.doc.elements_named(STYLE_STYLE);
        assert_eq!(styles.len(), 3);
        let xml = part.doc.to_xml();
        assert!(xml.contains("style:name=\"markdown_italic\" style:family=\"text\"><style:text-properties fo:font-style=\"italic\""));
    }
}

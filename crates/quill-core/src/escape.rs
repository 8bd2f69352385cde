//! Text transforms around the template engine
//!
//! Before rendering, entities and editor markup that ended up inside tag
//! delimiters are undone so the engine sees plain tag syntax. After
//! rendering, line feeds and tabs produced by values are turned into ODF
//! markup inside text-bearing elements.

use regex::{Captures, Regex};

use crate::tags::TagSyntax;

/// Entities decoded inside tags, in application order
const ENTITIES: &[(&str, &str)] = &[
    ("&gt;", ">"),
    ("&lt;", "<"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// `text:*` elements that hold other elements rather than character data
const TEXT_CONTAINERS: &[&str] = &[
    "text:list",
    "text:list-item",
    "text:list-header",
    "text:section",
    "text:note",
    "text:note-body",
    "text:index-body",
    "text:table-of-content",
    "text:tracked-changes",
    "text:changed-region",
    "text:sequence-decls",
    "text:variable-decls",
    "text:user-field-decls",
];

/// Pre-render and post-render text transforms for one tag syntax
#[derive(Debug, Clone)]
pub struct Escaper {
    tag_span: Regex,
    inline_markup: Regex,
    entity_rules: Vec<(Regex, &'static str)>,
    link: Regex,
    variable: Regex,
    markup: Regex,
}

impl Escaper {
    pub fn new(syntax: &TagSyntax, link_scheme: &str) -> Result<Self, regex::Error> {
        let vs = regex::escape(&syntax.variable_start);
        let ve = regex::escape(&syntax.variable_end);
        let bs = regex::escape(&syntax.block_start);
        let be = regex::escape(&syntax.block_end);
        let open_chars = char_class(&[&syntax.variable_start, &syntax.block_start]);
        let close_chars = char_class(&[&syntax.variable_end, &syntax.block_end]);

        let entity_rules = ENTITIES
            .iter()
            .map(|(entity, decoded)| {
                let pattern = format!(
                    r"(?s)((?:{vs}|{bs})[^{close_chars}]*?){entity}([^{open_chars}]*?(?:{ve}|{be}))"
                );
                Regex::new(&pattern).map(|re| (re, *decoded))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tag_span: Regex::new(&format!(r"(?s)(?:{vs}|{bs})[^{close_chars}]*?(?:{ve}|{be})"))?,
            inline_markup: Regex::new(r#"<text:s(?:\s[^>]*)?/>|<text:span(?:\s[^>]*)?/>"#)?,
            entity_rules,
            link: Regex::new(&format!(
                r#"(?s)(xlink:href="){}:(.*?)(")"#,
                regex::escape(link_scheme)
            ))?,
            variable: Regex::new(&format!(r"(?s)({vs})(.*?)({ve})"))?,
            markup: Regex::new(r#"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<(?:[^>"']|"[^"]*"|'[^']*')*>"#)?,
        })
    }

    /// Undo XML escaping inside template tags
    ///
    /// Only text between an open and a close delimiter is touched. The
    /// entity rules are swept until none of them matches, and links using the
    /// template scheme are decoded into `SafeValue(..)` print tags.
    pub fn unescape_entities(&self, xml: &str) -> String {
        let mut text = self
            .tag_span
            .replace_all(xml, |caps: &Captures<'_>| {
                self.inline_markup.replace_all(&caps[0], " ").into_owned()
            })
            .into_owned();

        // Decoding `&amp;` can expose another entity, so sweep until stable
        loop {
            let mut changed = false;
            for (rule, decoded) in &self.entity_rules {
                while rule.is_match(&text) {
                    text = rule
                        .replace_all(&text, |caps: &Captures<'_>| {
                            format!("{}{}{}", &caps[1], decoded, &caps[2])
                        })
                        .into_owned();
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        self.unescape_links(&text)
    }

    fn unescape_links(&self, xml: &str) -> String {
        self.link
            .replace_all(xml, |caps: &Captures<'_>| {
                let raw = &caps[2];
                let decoded = urlencoding::decode(raw)
                    .map(|value| value.into_owned())
                    .unwrap_or_else(|_| raw.to_string());
                let safe = self
                    .variable
                    .replace_all(&decoded, "${1} SafeValue(${2}) ${3}");
                format!("{}{}{}", &caps[1], safe, &caps[3])
            })
            .into_owned()
    }

    /// Turn `\n` and `\t` in text-bearing elements into ODF markup
    ///
    /// Character data is attributed to the innermost open element, so
    /// elements with attributes are handled and identical text elsewhere in
    /// the document is left alone. Comments and CDATA are copied verbatim.
    pub fn encode_feed_chars(&self, xml: &str) -> String {
        let mut out = String::with_capacity(xml.len());
        let mut open: Vec<&str> = Vec::new();
        let mut last = 0;

        for token in self.markup.find_iter(xml) {
            push_text(&mut out, &xml[last..token.start()], open.last().copied());

            let tag = token.as_str();
            out.push_str(tag);
            if tag.starts_with("</") {
                open.pop();
            } else if !(tag.starts_with("<?") || tag.starts_with("<!") || tag.ends_with("/>")) {
                open.push(element_name(tag));
            }
            last = token.end();
        }
        push_text(&mut out, &xml[last..], open.last().copied());

        out
    }
}

fn push_text(out: &mut String, text: &str, element: Option<&str>) {
    let bearing = element.is_some_and(is_text_bearing);
    if !bearing || !text.contains(['\n', '\t']) {
        out.push_str(text);
        return;
    }
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("<text:line-break/>"),
            '\t' => out.push_str("<text:tab/>"),
            _ => out.push(ch),
        }
    }
}

fn is_text_bearing(name: &str) -> bool {
    name.starts_with("text:") && !TEXT_CONTAINERS.contains(&name)
}

fn element_name(tag: &str) -> &str {
    tag.trim_start_matches('<')
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or_default()
}

/// Regex character class body holding every character of `parts`
fn char_class(parts: &[&str]) -> String {
    let mut seen = Vec::new();
    for ch in parts.iter().flat_map(|p| p.chars()) {
        if !seen.contains(&ch) {
            seen.push(ch);
        }
    }
    seen.iter()
        .map(|ch| regex::escape(&ch.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaper() -> Escaper {
        Escaper::new(&TagSyntax::default(), "quill").unwrap()
    }

    #[test]
    fn test_unescape_inside_tags_only() {
        let e = escaper();
        assert_eq!(e.unescape_entities("{{ a &gt; b }}"), "{{ a > b }}");
        assert_eq!(e.unescape_entities("a &gt; b"), "a &gt; b");
        assert_eq!(
            e.unescape_entities("x &lt; y {% if a &lt; b and c &gt; d %}z &amp; w"),
            "x &lt; y {% if a < b and c > d %}z &amp; w"
        );
    }

    #[test]
    fn test_unescape_repeats_to_fixed_point() {
        let e = escaper();
        assert_eq!(
            e.unescape_entities("{{ &quot;a&quot; ~ &apos;b&apos; ~ &quot;c&quot; }}"),
            r#"{{ "a" ~ 'b' ~ "c" }}"#
        );
    }

    #[test]
    fn test_ampersand_exposing_entity_is_decoded() {
        let e = escaper();
        assert_eq!(e.unescape_entities("{{ '&amp;gt;' }}"), "{{ '>' }}");
        assert_eq!(e.unescape_entities("{{ a &amp;amp;lt; b }}"), "{{ a < b }}");
    }

    #[test]
    fn test_inline_markup_inside_tag() {
        let e = escaper();
        assert_eq!(
            e.unescape_entities(r#"<text:span>{{<text:s/>name<text:s text:c="2"/>}}</text:span>"#),
            "<text:span>{{ name }}</text:span>"
        );
        assert_eq!(
            e.unescape_entities(r#"{%<text:span text:style-name="T1"/>if x %}"#),
            "{% if x %}"
        );
        assert_eq!(
            e.unescape_entities("<text:p>a<text:s/>b</text:p>"),
            "<text:p>a<text:s/>b</text:p>"
        );
    }

    #[test]
    fn test_links() {
        let e = escaper();
        assert_eq!(
            e.unescape_entities(r#"<text:a xlink:href="quill:http://example.com/%7B%7Bpage%7D%7D">x</text:a>"#),
            r#"<text:a xlink:href="http://example.com/{{ SafeValue(page) }}">x</text:a>"#
        );
        assert_eq!(
            e.unescape_entities(r#"<text:a xlink:href="http://example.com/">x</text:a>"#),
            r#"<text:a xlink:href="http://example.com/">x</text:a>"#
        );
    }

    #[test]
    fn test_unescape_is_idempotent() {
        let e = escaper();
        let source = r#"<text:p>a &amp; b {{ x &gt; 1 }}<text:a xlink:href="quill:%7B%7Burl%7D%7D"/>{%<text:s/>if y %}</text:p>"#;
        let once = e.unescape_entities(source);
        assert_eq!(e.unescape_entities(&once), once);

        let once = e.unescape_entities("{{ '&amp;gt;' }}");
        assert_eq!(e.unescape_entities(&once), once);
    }

    #[test]
    fn test_custom_delimiters() {
        let syntax = TagSyntax {
            variable_start: "[[".into(),
            variable_end: "]]".into(),
            ..TagSyntax::default()
        };
        let e = Escaper::new(&syntax, "quill").unwrap();
        assert_eq!(e.unescape_entities("[[ a &lt; b ]]"), "[[ a < b ]]");
        assert_eq!(e.unescape_entities("{{ a &lt; b }}"), "{{ a &lt; b }}");
    }

    #[test]
    fn test_encode_feed_chars() {
        let e = escaper();
        assert_eq!(
            e.encode_feed_chars("<text:span>Hello\nWorld</text:span>"),
            "<text:span>Hello<text:line-break/>World</text:span>"
        );
        assert_eq!(
            e.encode_feed_chars("<text:p text:style-name=\"P1\">a\tb</text:p>"),
            r#"<text:p text:style-name="P1">a<text:tab/>b</text:p>"#
        );
    }

    #[test]
    fn test_encode_scoped_to_text_elements() {
        let e = escaper();
        let xml = "<office:text>\n<text:list>\n<text:list-item><text:p>x\ny</text:p></text:list-item>\n</text:list>\n</office:text>";
        assert_eq!(
            e.encode_feed_chars(xml),
            "<office:text>\n<text:list>\n<text:list-item><text:p>x<text:line-break/>y</text:p></text:list-item>\n</text:list>\n</office:text>"
        );
        assert_eq!(
            e.encode_feed_chars("<text:p><!-- a\nb --><![CDATA[c\nd]]></text:p>"),
            "<text:p><!-- a\nb --><![CDATA[c\nd]]></text:p>"
        );
        assert_eq!(
            e.encode_feed_chars("<?xml version=\"1.0\"?>\n<r/>"),
            "<?xml version=\"1.0\"?>\n<r/>"
        );
    }

    #[test]
    fn test_encode_is_idempotent() {
        let e = escaper();
        let once = e.encode_feed_chars("<text:p>a\nb\tc<text:span>d\ne</text:span></text:p>");
        assert_eq!(e.encode_feed_chars(&once), once);
    }
}

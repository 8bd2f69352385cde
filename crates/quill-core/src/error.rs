//! Error types for render jobs

use std::fmt;

use quill_odf::{OdfError, XmlError};
use thiserror::Error;

/// Error returned by lifecycle hooks and media loaders
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Number of characters shown on each side of an XML syntax error
pub const CONTEXT_CHARS: usize = 38;

/// Why a template field could not be placed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateFault {
    /// The field opens a tag but never closes it
    #[error("field '{content}' opens a template tag that is never closed")]
    UnclosedTag { content: String },

    /// The field's hint names an ancestor the field does not have
    #[error("field '{content}' has no <{element}> ancestor (placement '{hint}')")]
    MissingAncestor {
        content: String,
        hint: String,
        element: String,
    },

    /// Placement walked off the document while relocating the field
    #[error("field '{content}' lost its parent during placement")]
    Orphaned { content: String },
}

/// Which text failed to parse as XML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlStage {
    /// The part as stored in the template
    Source,
    /// The template engine's output for the part
    Rendered,
}

impl fmt::Display for XmlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlStage::Source => write!(f, "template source"),
            XmlStage::Rendered => write!(f, "rendered output"),
        }
    }
}

/// Lifecycle event a hook was registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    JobStart,
    JobEnd,
    BeforePartRender,
    AfterPartRender,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookEvent::JobStart => "job start",
            HookEvent::JobEnd => "job end",
            HookEvent::BeforePartRender => "before part render",
            HookEvent::AfterPartRender => "after part render",
        };
        f.write_str(name)
    }
}

/// Errors that abort a render job
#[derive(Error, Debug)]
pub enum RenderError {
    /// The template is not a readable package or lacks a required part
    #[error("Archive error: {0}")]
    Archive(#[from] OdfError),

    /// A field could not be relocated
    #[error("Malformed template in {part}: {source}")]
    MalformedTemplate {
        part: String,
        #[source]
        source: TemplateFault,
    },

    /// A part is not well-formed XML
    #[error("Invalid XML in {part} ({stage}) near line {line}, column {column}: {message}\n{context}")]
    XmlSyntax {
        part: String,
        stage: XmlStage,
        line: usize,
        column: usize,
        message: String,
        context: String,
    },

    /// The template engine rejected the prepared part
    #[error("Template error in {part}: {source}")]
    Template {
        part: String,
        #[source]
        source: minijinja::Error,
    },

    /// A lifecycle hook failed
    #[error("Hook '{hook}' failed on {event}: {source}")]
    Filter {
        hook: String,
        event: HookEvent,
        #[source]
        source: HookError,
    },
}

impl RenderError {
    /// Build an [`RenderError::XmlSyntax`] carrying the text around the failure
    pub fn xml_syntax(part: &str, stage: XmlStage, text: &str, error: &XmlError) -> Self {
        RenderError::XmlSyntax {
            part: part.to_string(),
            stage,
            line: error.line,
            column: error.column,
            message: error.message.clone(),
            context: error_context(text, error.line, error.column),
        }
    }
}

/// Slice of `text` around a 1-based line/column, followed by a caret line
///
/// At most [`CONTEXT_CHARS`] characters are kept on each side of the column.
pub fn error_context(text: &str, line: usize, column: usize) -> String {
    let Some(source_line) = text.split('\n').nth(line.saturating_sub(1)) else {
        return String::new();
    };

    let chars: Vec<char> = source_line.chars().collect();
    let offset = column.saturating_sub(1).min(chars.len());
    let lower = offset.saturating_sub(CONTEXT_CHARS);
    let upper = (offset + CONTEXT_CHARS).min(chars.len());

    let window: String = chars[lower..upper].iter().collect();
    format!("{window}\n{}^", "-".repeat(offset - lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_short_line() {
        let context = error_context("<a>\n<b></c>\n</a>", 2, 4);
        assert_eq!(context, "<b></c>\n---^");
    }

    #[test]
    fn test_context_is_bounded() {
        let line = "x".repeat(200);
        let context = error_context(&line, 1, 101);
        let (window, caret) = context.split_once('\n').unwrap();
        assert_eq!(window.chars().count(), 2 * CONTEXT_CHARS);
        assert_eq!(caret, format!("{}^", "-".repeat(CONTEXT_CHARS)));
    }

    #[test]
    fn test_context_out_of_range_line() {
        assert_eq!(error_context("<a/>", 5, 1), "");
    }

    #[test]
    fn test_display() {
        let err = RenderError::MalformedTemplate {
            part: "content.xml".into(),
            source: TemplateFault::Orphaned {
                content: "{% endif %}".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Malformed template in content.xml: field '{% endif %}' lost its parent during placement"
        );
    }
}

//! quill-core - OpenDocument templates with Jinja syntax
//!
//! Template authors put tags like `{{ name }}` or `{% for row in rows %}`
//! into input fields of a word processor document. Rendering moves every
//! field's tag out of its field and into the surrounding markup, so a
//! loop can repeat whole table rows or paragraphs, then evaluates the part
//! with minijinja and checks the result is still well-formed XML.
//!
//! # Example
//!
//! ```
//! use quill_core::Renderer;
//! use quill_odf::test_utils::{create_minimal_odt, extract_content_xml};
//! use serde_json::json;
//!
//! let template = create_minimal_odt(
//!     "<text:p>Dear <text:text-input>{{ name }}</text:text-input>,</text:p>",
//! );
//!
//! let renderer = Renderer::new()?;
//! let output = renderer.render(&template, json!({ "name": "Chris" }))?;
//!
//! let content = extract_content_xml(&output);
//! assert!(content.contains("<text:span>Chris</text:span>"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod census;
pub mod config;
pub mod error;
pub mod escape;
pub mod filters;
pub mod hooks;
pub mod job;
pub mod media;
pub mod placement;
pub mod renderer;
pub mod tags;

pub use census::{Census, TagCount};
pub use config::{ConfigError, MediaSettings, RenderSettings, RendererConfig};
pub use error::{HookError, HookEvent, RenderError, TemplateFault, XmlStage};
pub use escape::Escaper;
pub use job::{RenderJob, XmlPart};
pub use media::{FsLoader, Media, MediaLoader, MediaRequest};
pub use placement::{locate, place_fields, Placement, PlacementReport};
pub use renderer::Renderer;
pub use tags::{Field, FieldScanner, TagKind, TagMatcher, TagSyntax};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

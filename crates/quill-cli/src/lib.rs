//! quill CLI - Command-line interface library
//!
//! This library provides the CLI functionality for quill:
//! - Render: fill an ODT or flat ODT template with JSON or TOML data
//! - Fields: list the template fields of a document and their placement
//!
//! # Library Usage
//!
//! ```ignore
//! use quill_cli::{render_command, RenderOptions};
//!
//! let written = render_command(&RenderOptions {
//!     template: "letter.odt".into(),
//!     data: Some("letter.json".into()),
//!     ..Default::default()
//! })?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Render a letter
//! quill render letter.odt --data letter.json --output out.odt
//!
//! # Override a value and raise the log level
//! quill render letter.odt -d letter.json --var name=Chris -v
//!
//! # See where every field will end up
//! quill fields letter.odt --format json
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    fields_command, load_data, parse_var, render_command, run_cli, FieldReport, OutputFormat,
    RenderOptions,
};

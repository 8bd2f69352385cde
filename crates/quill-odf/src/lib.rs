//! # quill-odf
//!
//! OpenDocument package handling for quill.
//!
//! This crate provides functionality to:
//! - Unpack and repack ODT packages without disturbing untouched parts
//! - Parse package parts into a mutable XML tree and serialize them back
//! - Read and extend the package manifest when media files are added
//!
//! ## Example: Reading a Part
//!
//! ```no_run
//! use quill_odf::{OdfArchive, XmlDocument};
//!
//! let archive = OdfArchive::open("letter.odt")?;
//! let content = XmlDocument::parse(archive.content_xml()?)
//!     .map_err(|source| quill_odf::OdfError::Xml { part: "content.xml".into(), source })?;
//!
//! for field in content.elements_named(quill_odf::names::TEXT_INPUT) {
//!     println!("{}", content.text_content(field));
//! }
//! # Ok::<(), quill_odf::OdfError>(())
//! ```

pub mod archive;
pub mod dom;
pub mod error;
pub mod manifest;
pub mod media;
pub mod names;
pub mod test_utils;

pub use archive::OdfArchive;
pub use dom::{NodeId, NodeKind, TreeError, XmlDeclaration, XmlDocument, XmlError};
pub use error::{OdfError, Result};
pub use manifest::{Manifest, ManifestEntry};
pub use media::{content_type_for_extension, content_type_for_path, media_path};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

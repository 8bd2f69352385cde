//! Error types for OpenDocument package operations

use thiserror::Error;

use crate::dom::XmlError;

/// Errors that can occur while reading or writing an OpenDocument package
#[derive(Error, Debug)]
pub enum OdfError {
    /// The input is not a readable ZIP container
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A package part is not well-formed XML
    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },

    /// Required part not found in the package
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// The part exists but does not have the expected structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),
}

/// Result type for package operations
pub type Result<T> = std::result::Result<T, OdfError>;

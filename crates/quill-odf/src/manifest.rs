//! Package manifest handling
//!
//! `META-INF/manifest.xml` lists every file of an OpenDocument package with
//! its media type. Files added to the package (pictures produced while
//! rendering) must be registered here or office suites refuse to load them.

use crate::dom::{NodeId, XmlDocument};
use crate::error::{OdfError, Result};
use crate::names::{
    MANIFEST_FILE_ENTRY, MANIFEST_FULL_PATH, MANIFEST_MEDIA_TYPE, MANIFEST_PART, MANIFEST_ROOT,
};

/// A single `manifest:file-entry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub full_path: String,
    pub media_type: String,
}

/// The parsed package manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    doc: XmlDocument,
    root: NodeId,
}

impl Manifest {
    /// Parse the manifest part
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(bytes).map_err(|source| OdfError::Xml {
            part: MANIFEST_PART.to_string(),
            source,
        })?;

        let root = doc
            .document_element()
            .filter(|&root| doc.is_named(root, MANIFEST_ROOT))
            .ok_or_else(|| {
                OdfError::InvalidStructure(format!("{MANIFEST_PART} has no <{MANIFEST_ROOT}> root"))
            })?;

        Ok(Self { doc, root })
    }

    fn file_entries(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.doc
            .element_children(self.root)
            .filter(|&id| self.doc.is_named(id, MANIFEST_FILE_ENTRY))
    }

    /// All registered files, in manifest order
    pub fn entries(&self) -> Vec<ManifestEntry> {
        self.file_entries()
            .map(|id| ManifestEntry {
                full_path: self.doc.attribute(id, MANIFEST_FULL_PATH).unwrap_or_default(),
                media_type: self.doc.attribute(id, MANIFEST_MEDIA_TYPE).unwrap_or_default(),
            })
            .collect()
    }

    /// Whether a file with this path is registered
    pub fn contains(&self, full_path: &str) -> bool {
        self.file_entries()
            .any(|id| self.doc.attribute(id, MANIFEST_FULL_PATH).as_deref() == Some(full_path))
    }

    /// Register a file, updating the media type if it is already listed
    pub fn register(&mut self, full_path: &str, media_type: &str) {
        let existing = self
            .file_entries()
            .find(|&id| self.doc.attribute(id, MANIFEST_FULL_PATH).as_deref() == Some(full_path));

        let entry = match existing {
            Some(id) => id,
            None => {
                let id = self.doc.create_element(MANIFEST_FILE_ENTRY);
                self.doc.set_attribute(id, MANIFEST_FULL_PATH, full_path);
                self.doc.append_child(self.root, id);
                id
            }
        };
        self.doc.set_attribute(entry, MANIFEST_MEDIA_TYPE, media_type);
        tracing::debug!(full_path, media_type, "registered manifest entry");
    }

    /// Serialize the manifest back to XML
    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

    #[test]
    fn test_entries() {
        let manifest = Manifest::parse(MANIFEST.as_bytes()).unwrap();
        let entries = manifest.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].full_path, "content.xml");
        assert_eq!(entries[1].media_type, "text/xml");
        assert!(manifest.contains("/"));
        assert!(!manifest.contains("Pictures/a.png"));
    }

    #[test]
    fn test_register_new_and_existing() {
        let mut manifest = Manifest::parse(MANIFEST.as_bytes()).unwrap();
        manifest.register("Pictures/a.png", "image/png");
        manifest.register("Pictures/a.png", "image/jpeg");
        manifest.register("content.xml", "text/xml");

        let entries = manifest.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[2],
            ManifestEntry {
                full_path: "Pictures/a.png".to_string(),
                media_type: "image/jpeg".to_string(),
            }
        );

        let reparsed = Manifest::parse(&manifest.to_bytes()).unwrap();
        assert!(reparsed.contains("Pictures/a.png"));
    }

    #[test]
    fn test_wrong_root() {
        match Manifest::parse(b"<other/>") {
            Err(OdfError::InvalidStructure(msg)) => assert!(msg.contains("manifest:manifest")),
            other => panic!("Expected InvalidStructure, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed() {
        let result = Manifest::parse(b"<manifest:manifest>");
        assert!(matches!(result, Err(OdfError::Xml { .. })));
    }
}

//! Shared test utilities for quill-odf and its dependents
//!
//! Fixtures build small but complete OpenDocument text documents so tests
//! can focus on the body markup they care about.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::archive::OdfArchive;

/// Namespace declarations shared by every fixture root element
pub const NAMESPACES: &str = concat!(
    r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
    r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
    r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
    r#"xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" "#,
    r#"xmlns:draw="urn:oasis:names:tc:opendocument:xmlns:drawing:1.0" "#,
    r#"xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" "#,
    r#"xmlns:xlink="http://www.w3.org/1999/xlink" "#,
    r#"xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0""#,
);

/// Wrap `office:text` body markup into a full content.xml
pub fn content_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content {NAMESPACES} office:version="1.2"><office:automatic-styles/><office:body><office:text>{body}</office:text></office:body></office:document-content>"#
    )
}

/// A styles.xml with a single paragraph style
pub fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles {NAMESPACES} office:version="1.2"><office:styles><style:style style:name="Standard" style:family="paragraph"/></office:styles></office:document-styles>"#
    )
}

/// A manifest listing the parts written by [`create_odt`]
pub fn manifest_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/><manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/></manifest:manifest>"#
}

/// Create a minimal valid ODT whose body holds `body`
///
/// # Example
/// ```ignore
/// use quill_odf::test_utils::create_minimal_odt;
/// let odt = create_minimal_odt("<text:p>Hello</text:p>");
/// ```
pub fn create_minimal_odt(body: &str) -> Vec<u8> {
    create_odt(&content_xml(body), &styles_xml())
}

/// Create an ODT from complete content.xml and styles.xml texts
pub fn create_odt(content: &str, styles: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/vnd.oasis.opendocument.text")
        .unwrap();

    zip.start_file("content.xml", deflated).unwrap();
    zip.write_all(content.as_bytes()).unwrap();

    zip.start_file("styles.xml", deflated).unwrap();
    zip.write_all(styles.as_bytes()).unwrap();

    zip.start_file("META-INF/manifest.xml", deflated).unwrap();
    zip.write_all(manifest_xml().as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Create a flat (single XML file) text document whose body holds `body`
pub fn create_minimal_fodt(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document {NAMESPACES} office:version="1.2" office:mimetype="application/vnd.oasis.opendocument.text"><office:styles/><office:automatic-styles/><office:body><office:text>{body}</office:text></office:body></office:document>"#
    )
}

/// Extract content.xml from an ODT byte array
pub fn extract_content_xml(odt: &[u8]) -> String {
    extract_part(odt, "content.xml").unwrap()
}

/// Extract any part from an ODT byte array
pub fn extract_part(odt: &[u8], path: &str) -> Option<String> {
    let archive = OdfArchive::from_bytes(odt).unwrap();
    archive.get_string(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;

    #[test]
    fn test_create_minimal_odt() {
        let odt = create_minimal_odt("<text:p>Hello</text:p>");
        let archive = OdfArchive::from_bytes(&odt).unwrap();

        assert!(archive.contains("mimetype"));
        assert!(archive.contains("content.xml"));
        assert!(archive.contains("styles.xml"));
        assert!(archive.contains("META-INF/manifest.xml"));

        let content = extract_content_xml(&odt);
        assert!(content.contains("<text:p>Hello</text:p>"));
    }

    #[test]
    fn test_fixtures_are_well_formed() {
        assert!(XmlDocument::parse_str(&content_xml("<text:p/>")).is_ok());
        assert!(XmlDocument::parse_str(&styles_xml()).is_ok());
        assert!(XmlDocument::parse_str(manifest_xml()).is_ok());
        assert!(XmlDocument::parse_str(&create_minimal_fodt("<text:p/>")).is_ok());
    }
}

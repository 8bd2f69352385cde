//! Package round-trip tests
//!
//! A package that is unpacked, parsed part by part, serialized and repacked
//! must come back with the same parts, the same order and the same markup.

// =============================================================================
// PART 1: ARCHIVE FIDELITY
// =============================================================================

mod archive_fidelity {
    use quill_odf::test_utils::{create_minimal_odt, extract_part};
    use quill_odf::OdfArchive;

    #[test]
    fn test_untouched_parts_survive_write() {
        let odt = create_minimal_odt("<text:p>Hello</text:p>");
        let mut archive = OdfArchive::from_bytes(&odt).unwrap();
        archive.set_string("Pictures/extra.png", "not really a png");

        let bytes = archive.to_bytes().unwrap();
        assert_eq!(
            extract_part(&bytes, "styles.xml"),
            extract_part(&odt, "styles.xml")
        );
        assert_eq!(
            extract_part(&bytes, "Pictures/extra.png").as_deref(),
            Some("not really a png")
        );
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.odt");

        let archive = OdfArchive::from_bytes(&create_minimal_odt("")).unwrap();
        archive.write_to_file(&path).unwrap();

        let reopened = OdfArchive::open(&path).unwrap();
        let names: Vec<_> = reopened.part_names().collect();
        assert_eq!(
            names,
            vec!["mimetype", "content.xml", "styles.xml", "META-INF/manifest.xml"]
        );
    }
}

// =============================================================================
// PART 2: XML PART FIDELITY
// =============================================================================

mod xml_fidelity {
    use quill_odf::names::{TEXT_INPUT, TEXT_P};
    use quill_odf::test_utils::{content_xml, create_minimal_fodt};
    use quill_odf::XmlDocument;

    #[test]
    fn test_content_roundtrip_is_identical() {
        let source = content_xml(
            r#"<text:p text:style-name="P1">Dear <text:text-input text:description="">{{ name }}</text:text-input>,</text:p><table:table><table:table-row><table:table-cell><text:p>a &amp; b</text:p></table:table-cell></table:table-row></table:table>"#,
        );
        let doc = XmlDocument::parse_str(&source).unwrap();
        assert_eq!(doc.to_xml(), source);
    }

    #[test]
    fn test_flat_document_roundtrip() {
        let source = create_minimal_fodt("<text:p>Hi</text:p>");
        let doc = XmlDocument::parse_str(&source).unwrap();
        assert_eq!(doc.to_xml(), source);
    }

    #[test]
    fn test_fields_are_found_in_document_order() {
        let source = content_xml(
            r#"<text:p><text:text-input>{{ a }}</text:text-input></text:p><text:p><text:span><text:text-input>{{ b }}</text:text-input></text:span></text:p>"#,
        );
        let doc = XmlDocument::parse_str(&source).unwrap();
        let fields: Vec<_> = doc
            .elements_named(TEXT_INPUT)
            .into_iter()
            .map(|id| doc.text_content(id))
            .collect();
        assert_eq!(fields, vec!["{{ a }}", "{{ b }}"]);

        let second = doc.elements_named(TEXT_INPUT)[1];
        let paragraph = doc.nearest_ancestor_named(second, TEXT_P).unwrap();
        assert_eq!(doc.elements_named(TEXT_P)[1], paragraph);
    }

    #[test]
    fn test_moving_a_node_between_parents() {
        let mut doc = XmlDocument::parse_str("<r><a><x/></a><b/></r>").unwrap();
        let x = doc.elements_named("x")[0];
        let b = doc.elements_named("b")[0];
        doc.append_child(b, x);
        assert_eq!(doc.to_xml(), "<r><a/><b><x/></b></r>");
    }
}

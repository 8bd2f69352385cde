//! OpenDocument part and element names used across the workspace

/// Package part holding the document body
pub const CONTENT_PART: &str = "content.xml";
/// Package part holding styles, master pages, headers and footers
pub const STYLES_PART: &str = "styles.xml";
/// Package manifest
pub const MANIFEST_PART: &str = "META-INF/manifest.xml";
/// Uncompressed media type marker, always the first entry
pub const MIMETYPE_PART: &str = "mimetype";
/// Folder media files are added under
pub const PICTURES_DIR: &str = "Pictures";

/// Input field element used as a template placeholder
pub const TEXT_INPUT: &str = "text:text-input";
/// Attribute of an input field carrying the placement hint
pub const TEXT_DESCRIPTION: &str = "text:description";
pub const TEXT_P: &str = "text:p";
pub const TEXT_H: &str = "text:h";
pub const TEXT_SPAN: &str = "text:span";
pub const TEXT_A: &str = "text:a";
pub const TEXT_LINE_BREAK: &str = "text:line-break";
pub const TEXT_TAB: &str = "text:tab";
pub const TEXT_SPACE: &str = "text:s";
pub const TEXT_STYLE_NAME: &str = "text:style-name";

pub const TABLE_ROW: &str = "table:table-row";
pub const TABLE_CELL: &str = "table:table-cell";

pub const DRAW_FRAME: &str = "draw:frame";
pub const DRAW_IMAGE: &str = "draw:image";
pub const DRAW_NAME: &str = "draw:name";
pub const XLINK_HREF: &str = "xlink:href";
pub const OFFICE_BINARY_DATA: &str = "office:binary-data";
pub const OFFICE_AUTOMATIC_STYLES: &str = "office:automatic-styles";

pub const STYLE_STYLE: &str = "style:style";
pub const STYLE_NAME: &str = "style:name";
pub const STYLE_FAMILY: &str = "style:family";
pub const STYLE_TEXT_PROPERTIES: &str = "style:text-properties";

pub const MANIFEST_ROOT: &str = "manifest:manifest";
pub const MANIFEST_FILE_ENTRY: &str = "manifest:file-entry";
pub const MANIFEST_FULL_PATH: &str = "manifest:full-path";
pub const MANIFEST_MEDIA_TYPE: &str = "manifest:media-type";

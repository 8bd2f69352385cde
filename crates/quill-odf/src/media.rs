//! Media type helpers for files embedded in a package

use std::path::Path;

use crate::names::PICTURES_DIR;

/// Get the MIME content type for an image extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "tiff" | "tif" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Guess the content type of a file from its path
pub fn content_type_for_path(path: impl AsRef<Path>) -> &'static str {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or("application/octet-stream", content_type_for_extension)
}

/// Get the file extension (with the leading dot) for a MIME content type
///
/// Unknown types yield an empty string.
pub fn extension_for_content_type(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        "image/x-emf" => ".emf",
        "image/x-wmf" => ".wmf",
        "image/tiff" => ".tiff",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        _ => "",
    }
}

/// Path inside the package for a media file with the given stem and type
pub fn media_path(stem: &str, mime_type: &str) -> String {
    format!("{PICTURES_DIR}/{stem}{}", extension_for_content_type(mime_type))
}

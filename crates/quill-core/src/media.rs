//! Media loading for the `image` filter

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use minijinja::Value;
use quill_odf::content_type_for_path;

use crate::error::HookError;

/// Image bytes handed back by a [`MediaLoader`]
pub struct Media {
    pub stream: Box<dyn Read + Send>,
    pub mime_type: String,
}

impl Media {
    pub fn new(stream: impl Read + Send + 'static, mime_type: impl Into<String>) -> Self {
        Self {
            stream: Box::new(stream),
            mime_type: mime_type.into(),
        }
    }

    /// Media backed by an in-memory buffer
    pub fn from_bytes(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::new(Cursor::new(data), mime_type)
    }
}

impl fmt::Debug for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Media")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// One image placeholder being resolved
///
/// Attribute maps hold the frame's and the image's current attributes.
/// Loaders may edit them; changed entries are written back to the part.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    /// The value the filter was applied to
    pub value: Value,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
    pub frame_attrs: BTreeMap<String, String>,
    pub image_attrs: BTreeMap<String, String>,
}

/// Resolves image filter values to media
pub trait MediaLoader: Send + Sync {
    /// Return the media for `request`, or `None` to leave the frame alone
    fn load(&self, request: &mut MediaRequest) -> Result<Option<Media>, HookError>;
}

impl<F> MediaLoader for F
where
    F: Fn(&mut MediaRequest) -> Result<Option<Media>, HookError> + Send + Sync,
{
    fn load(&self, request: &mut MediaRequest) -> Result<Option<Media>, HookError> {
        self(request)
    }
}

/// Loads images from the filesystem
///
/// Values are paths. A path naming an existing file is used as is, other
/// paths are resolved against the configured media directory.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    media_path: Option<PathBuf>,
}

impl FsLoader {
    pub fn new(media_path: Option<PathBuf>) -> Self {
        Self { media_path }
    }

    pub fn media_path(&self) -> Option<&Path> {
        self.media_path.as_deref()
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        let joined = self.media_path.as_ref()?.join(name);
        joined.is_file().then_some(joined)
    }
}

impl MediaLoader for FsLoader {
    fn load(&self, request: &mut MediaRequest) -> Result<Option<Media>, HookError> {
        let Some(name) = request.value.as_str() else {
            tracing::debug!(value = %request.value, "image value is not a path");
            return Ok(None);
        };

        let Some(path) = self.resolve(name) else {
            tracing::debug!(name, media_path = ?self.media_path, "image not found");
            return Ok(None);
        };

        let file = File::open(&path)?;
        let mime_type = content_type_for_path(&path);
        tracing::debug!(path = %path.display(), mime_type, "image loaded");
        Ok(Some(Media::new(file, mime_type)))
    }
}

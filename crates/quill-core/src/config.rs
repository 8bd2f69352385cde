//! Renderer configuration
//!
//! Loaded from a `quill.toml` file:
//!
//! ```toml
//! [syntax]
//! variable_start = "[["
//! variable_end = "]]"
//!
//! [render]
//! strict_undefined = true
//! parts = ["content.xml"]
//!
//! [media]
//! path = "images"
//! ```

use std::path::PathBuf;

use quill_odf::names::{CONTENT_PART, STYLES_PART};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tags::TagSyntax;

/// URL scheme marking links whose target is a template expression
pub const DEFAULT_LINK_SCHEME: &str = "quill";

/// Errors raised while building a renderer from configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file is not valid TOML for [`RendererConfig`]
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The template engine rejected the delimiters
    #[error("Invalid template syntax: {0}")]
    Syntax(#[from] minijinja::Error),

    /// The delimiters could not be turned into tag patterns
    #[error("Invalid tag pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Top-level renderer settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Template delimiters
    pub syntax: TagSyntax,
    /// Rendering behaviour
    pub render: RenderSettings,
    /// Image loading
    pub media: MediaSettings,
}

impl RendererConfig {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// Rendering behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Fail on undefined variables instead of printing nothing
    pub strict_undefined: bool,
    /// Scheme of links carrying template expressions
    pub link_scheme: String,
    /// Package parts rendered as templates, in order
    pub parts: Vec<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            strict_undefined: false,
            link_scheme: DEFAULT_LINK_SCHEME.to_string(),
            parts: vec![CONTENT_PART.to_string(), STYLES_PART.to_string()],
        }
    }
}

/// Image loading
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MediaSettings {
    /// Base directory relative image paths are resolved against
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert!(config.syntax.is_default());
        assert!(!config.render.strict_undefined);
        assert_eq!(config.render.link_scheme, "quill");
        assert_eq!(config.render.parts, vec!["content.xml", "styles.xml"]);
        assert_eq!(config.media.path, None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = RendererConfig::from_toml_str("").unwrap();
        assert_eq!(config, RendererConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = RendererConfig::from_toml_str(
            r#"
            [syntax]
            variable_start = "[["
            variable_end = "]]"

            [render]
            strict_undefined = true

            [media]
            path = "images"
            "#,
        )
        .unwrap();

        assert_eq!(config.syntax.variable_start, "[[");
        assert_eq!(config.syntax.block_start, "{%");
        assert!(config.render.strict_undefined);
        assert_eq!(config.render.parts.len(), 2);
        assert_eq!(config.media.path, Some(PathBuf::from("images")));
    }

    #[test]
    fn test_invalid_toml() {
        let result = RendererConfig::from_toml_str("[render]\nstrict_undefined = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}

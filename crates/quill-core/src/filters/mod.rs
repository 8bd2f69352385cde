//! Built-in template filters
//!
//! - `pad`: zero-fill a value to a width
//! - `image`: replace a frame's picture with loaded media
//! - `markdown`: convert markdown text to ODF paragraphs

pub mod image;
pub mod markdown;
pub mod pad;

use crate::renderer::Renderer;

/// Register every built-in filter and its hooks
pub(crate) fn register_builtin(renderer: &mut Renderer) {
    pad::register(renderer);
    image::register(renderer);
    markdown::register(renderer);
}

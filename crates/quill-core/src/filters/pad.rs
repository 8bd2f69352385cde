//! The `pad` filter

use minijinja::Value;

use crate::renderer::Renderer;

/// Width used when the filter is called without one
pub const DEFAULT_WIDTH: usize = 5;

pub(crate) fn register(renderer: &mut Renderer) {
    renderer.environment_mut().add_filter("pad", pad);
}

/// Zero-fill the string form of `value` to `length` characters
pub fn pad(value: Value, length: Option<usize>) -> String {
    let text = if value.is_undefined() || value.is_none() {
        String::new()
    } else {
        value.to_string()
    };
    zero_fill(&text, length.unwrap_or(DEFAULT_WIDTH))
}

/// Left-pad with zeros, keeping a leading sign in front
pub fn zero_fill(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let zeros = "0".repeat(width - len);
    match text.strip_prefix(['+', '-']) {
        Some(rest) => format!("{}{zeros}{rest}", &text[..1]),
        None => format!("{zeros}{text}"),
    }
}

//! The renderer
//!
//! A [`Renderer`] owns everything that does not change between jobs: the
//! configured template environment, the field scanner and escaper built for
//! the configured delimiters, registered hooks and the media loader.

use minijinja::syntax::SyntaxConfig;
use minijinja::value::Value;
use minijinja::{Environment, Error, Output, State, UndefinedBehavior};
use quill_odf::dom::escape_attribute;
use serde::Serialize;

use crate::census::Census;
use crate::config::{ConfigError, RendererConfig};
use crate::error::{HookError, RenderError};
use crate::escape::Escaper;
use crate::filters;
use crate::hooks::{Hook, Hooks};
use crate::job::{RenderJob, XmlPart};
use crate::media::{FsLoader, MediaLoader};
use crate::placement::place_fields;
use crate::tags::{FieldScanner, TagSyntax};

/// Renders ODF templates
pub struct Renderer {
    config: RendererConfig,
    env: Environment<'static>,
    scanner: FieldScanner,
    escaper: Escaper,
    hooks: Hooks,
    media_loader: Box<dyn MediaLoader>,
}

impl Renderer {
    /// Renderer with default delimiters and settings
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(RendererConfig::default())
    }

    /// Build a renderer and register the built-in filters
    pub fn with_config(config: RendererConfig) -> Result<Self, ConfigError> {
        let mut env = Environment::new();
        if !config.syntax.is_default() {
            env.set_syntax(syntax_config(&config.syntax)?);
        }
        env.set_undefined_behavior(if config.render.strict_undefined {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Chainable
        });
        env.set_formatter(format_xml_value);
        env.add_function("SafeValue", safe_value);

        let scanner = FieldScanner::new(&config.syntax)?;
        let escaper = Escaper::new(&config.syntax, &config.render.link_scheme)?;
        let media_loader = Box::new(FsLoader::new(config.media.path.clone()));

        let mut renderer = Self {
            config,
            env,
            scanner,
            escaper,
            hooks: Hooks::default(),
            media_loader,
        };
        filters::register_builtin(&mut renderer);

        tracing::debug!(hooks = renderer.hooks.len(), "renderer ready");
        Ok(renderer)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Template environment, for registering custom filters and globals
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    pub fn scanner(&self) -> &FieldScanner {
        &self.scanner
    }

    pub fn escaper(&self) -> &Escaper {
        &self.escaper
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn register_job_start<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut RenderJob<'_>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.job_start.push(Hook {
            name: name.into(),
            callback: Box::new(hook),
        });
    }

    pub fn register_job_end<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut RenderJob<'_>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.job_end.push(Hook {
            name: name.into(),
            callback: Box::new(hook),
        });
    }

    pub fn register_before_part_render<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut RenderJob<'_>, &mut XmlPart) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.before_part.push(Hook {
            name: name.into(),
            callback: Box::new(hook),
        });
    }

    pub fn register_after_part_render<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut RenderJob<'_>, &mut XmlPart) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.after_part.push(Hook {
            name: name.into(),
            callback: Box::new(hook),
        });
    }

    /// Replace the loader used by the `image` filter
    pub fn set_media_loader(&mut self, loader: impl MediaLoader + 'static) {
        self.media_loader = Box::new(loader);
    }

    pub fn media_loader(&self) -> &dyn MediaLoader {
        self.media_loader.as_ref()
    }

    /// Render a packaged template (`.odt`)
    pub fn render<S: Serialize>(&self, template: &[u8], context: S) -> Result<Vec<u8>, RenderError> {
        RenderJob::package(self, template, Value::from_serialize(&context))?.run()
    }

    /// Render a flat template (`.fodt`)
    pub fn render_flat<S: Serialize>(
        &self,
        template: &[u8],
        context: S,
    ) -> Result<Vec<u8>, RenderError> {
        RenderJob::flat(self, template, Value::from_serialize(&context)).run()
    }

    /// Relocate the fields of `part` and return the text to evaluate
    pub fn prepare_part(&self, part: &mut XmlPart) -> Result<String, RenderError> {
        let name = part.name.clone();
        let malformed = |source| RenderError::MalformedTemplate {
            part: name.clone(),
            source,
        };

        let fields = self.scanner.scan(&part.doc).map_err(malformed)?;
        let census = Census::take(&part.doc, &fields);
        let report = place_fields(&mut part.doc, &fields, &census).map_err(malformed)?;
        tracing::debug!(part = %name, fields = fields.len(), placed = report.placed, "part prepared");

        Ok(self.escaper.unescape_entities(&part.doc.to_xml()))
    }
}

fn syntax_config(syntax: &TagSyntax) -> Result<SyntaxConfig, Error> {
    SyntaxConfig::builder()
        .block_delimiters(syntax.block_start.clone(), syntax.block_end.clone())
        .variable_delimiters(syntax.variable_start.clone(), syntax.variable_end.clone())
        .comment_delimiters(syntax.comment_start.clone(), syntax.comment_end.clone())
        .build()
}

/// Print values as XML character data
fn format_xml_value(out: &mut Output<'_>, _state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(());
    }
    let text = value.to_string();
    if value.is_safe() {
        out.write_str(&text)?;
    } else {
        out.write_str(&escape_attribute(&text))?;
    }
    Ok(())
}

fn safe_value(value: Value) -> Value {
    if value.is_undefined() || value.is_none() {
        return Value::from_safe_string(String::new());
    }
    Value::from_safe_string(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_values_are_xml_escaped() {
        let renderer = Renderer::new().unwrap();
        let out = renderer
            .environment()
            .render_str("{{ x }}", context! { x => "<a & 'b'>" })
            .unwrap();
        assert_eq!(out, "&lt;a &amp; &apos;b&apos;&gt;");
    }

    #[test]
    fn test_safe_value_is_raw() {
        let renderer = Renderer::new().unwrap();
        let out = renderer
            .environment()
            .render_str("{{ SafeValue(x) }}", context! { x => "a&b" })
            .unwrap();
        assert_eq!(out, "a&b");
    }

    #[test]
    fn test_undefined_and_none_print_nothing() {
        let renderer = Renderer::new().unwrap();
        let out = renderer
            .environment()
            .render_str("[{{ missing }}|{{ missing.attr }}|{{ n }}]", context! { n => () })
            .unwrap();
        assert_eq!(out, "[||]");
    }

    #[test]
    fn test_strict_undefined() {
        let mut config = RendererConfig::default();
        config.render.strict_undefined = true;
        let renderer = Renderer::with_config(config).unwrap();
        assert!(renderer
            .environment()
            .render_str("{{ missing }}", context! {})
            .is_err());
    }

    #[test]
    fn test_custom_syntax() {
        let config = RendererConfig::from_toml_str(
            "[syntax]\nvariable_start = \"[[\"\nvariable_end = \"]]\"",
        )
        .unwrap();
        let renderer = Renderer::with_config(config).unwrap();
        let out = renderer
            .environment()
            .render_str("[[ x ]] {{ x }}", context! { x => 1 })
            .unwrap();
        assert_eq!(out, "1 {{ x }}");
    }

    #[test]
    fn test_builtin_hooks_registered() {
        let renderer = Renderer::new().unwrap();
        assert!(!renderer.hooks().is_empty());
    }
}

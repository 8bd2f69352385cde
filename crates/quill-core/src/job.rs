//! Render jobs
//!
//! A job renders one template with one context. Package templates go
//! through every configured part that exists in the archive; flat templates
//! are a single XML document. Each part follows the same path:
//!
//! 1. parse, then run before-part hooks
//! 2. relocate fields and undo escaping inside tags
//! 3. evaluate the template
//! 4. encode line feeds and tabs, parse the result, run after-part hooks
//! 5. serialize

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use minijinja::Value;
use quill_odf::names::{MANIFEST_PART, OFFICE_BINARY_DATA, XLINK_HREF};
use quill_odf::{media_path, Manifest, NodeId, OdfArchive, XmlDocument};
use tracing::{debug, info, trace};

use crate::error::{HookError, HookEvent, RenderError, XmlStage};
use crate::media::Media;
use crate::renderer::Renderer;

/// Part name reported for flat documents
pub const FLAT_PART: &str = "document.fodt";

/// A parsed document part handed to hooks
#[derive(Debug, Clone)]
pub struct XmlPart {
    /// Path of the part inside the package
    pub name: String,
    pub doc: XmlDocument,
}

enum Target {
    Package {
        archive: OdfArchive,
        manifest: Manifest,
    },
    Flat {
        document: Vec<u8>,
    },
}

/// State of one render
pub struct RenderJob<'r> {
    renderer: &'r Renderer,
    context: Value,
    target: Target,
    part_exit: Vec<Box<dyn FnOnce()>>,
}

impl<'r> RenderJob<'r> {
    /// Unpack a packaged template
    ///
    /// Fails with [`RenderError::Archive`] when the bytes are not a ZIP
    /// container or the content, styles or manifest part is missing.
    pub fn package(
        renderer: &'r Renderer,
        template: &[u8],
        context: Value,
    ) -> Result<Self, RenderError> {
        let archive = OdfArchive::from_bytes(template)?;
        archive.content_xml()?;
        archive.styles_xml()?;
        let manifest = Manifest::parse(archive.manifest_xml()?)?;

        Ok(Self {
            renderer,
            context,
            target: Target::Package { archive, manifest },
            part_exit: Vec::new(),
        })
    }

    /// Wrap a flat template
    pub fn flat(renderer: &'r Renderer, template: &[u8], context: Value) -> Self {
        Self {
            renderer,
            context,
            target: Target::Flat {
                document: template.to_vec(),
            },
            part_exit: Vec::new(),
        }
    }

    pub fn renderer(&self) -> &'r Renderer {
        self.renderer
    }

    /// The values templates are evaluated with
    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.target, Target::Flat { .. })
    }

    /// The unpacked template, for package jobs
    pub fn archive(&self) -> Option<&OdfArchive> {
        match &self.target {
            Target::Package { archive, .. } => Some(archive),
            Target::Flat { .. } => None,
        }
    }

    pub fn archive_mut(&mut self) -> Option<&mut OdfArchive> {
        match &mut self.target {
            Target::Package { archive, .. } => Some(archive),
            Target::Flat { .. } => None,
        }
    }

    /// The package manifest as it will be written
    pub fn manifest(&self) -> Option<&Manifest> {
        match &self.target {
            Target::Package { manifest, .. } => Some(manifest),
            Target::Flat { .. } => None,
        }
    }

    /// Run `cleanup` when the current part is done, whether it rendered or failed
    pub fn on_part_exit<F>(&mut self, cleanup: F)
    where
        F: FnOnce() + 'static,
    {
        self.part_exit.push(Box::new(cleanup));
    }

    /// Render every part and return the finished document
    pub fn run(mut self) -> Result<Vec<u8>, RenderError> {
        info!(flat = self.is_flat(), "render job started");
        self.notify_job(HookEvent::JobStart)?;

        for (name, source) in self.pending_parts() {
            let rendered = self.render_part(&name, &source)?;
            match &mut self.target {
                Target::Package { archive, .. } => archive.set(name, rendered),
                Target::Flat { document } => *document = rendered,
            }
        }

        self.notify_job(HookEvent::JobEnd)?;

        let output = match self.target {
            Target::Package {
                mut archive,
                manifest,
            } => {
                archive.set(MANIFEST_PART, manifest.to_bytes());
                archive.to_bytes()?
            }
            Target::Flat { document } => document,
        };

        info!(bytes = output.len(), "render job finished");
        Ok(output)
    }

    fn pending_parts(&self) -> Vec<(String, Vec<u8>)> {
        match &self.target {
            Target::Package { archive, .. } => self
                .renderer
                .config()
                .render
                .parts
                .iter()
                .filter_map(|name| archive.get(name).map(|bytes| (name.clone(), bytes.to_vec())))
                .collect(),
            Target::Flat { document } => vec![(FLAT_PART.to_string(), document.clone())],
        }
    }

    fn render_part(&mut self, name: &str, source: &[u8]) -> Result<Vec<u8>, RenderError> {
        let result = self.process_part(name, source);
        for cleanup in self.part_exit.drain(..) {
            cleanup();
        }
        result
    }

    fn process_part(&mut self, name: &str, source: &[u8]) -> Result<Vec<u8>, RenderError> {
        let renderer = self.renderer;
        debug!(part = name, "rendering part");

        let doc = XmlDocument::parse(source).map_err(|e| {
            RenderError::xml_syntax(name, XmlStage::Source, &String::from_utf8_lossy(source), &e)
        })?;
        let mut part = XmlPart {
            name: name.to_string(),
            doc,
        };

        self.notify_part(HookEvent::BeforePartRender, &mut part)?;

        let prepared = renderer.prepare_part(&mut part)?;
        let rendered = renderer
            .environment()
            .render_str(&prepared, &self.context)
            .map_err(|source| RenderError::Template {
                part: name.to_string(),
                source,
            })?;
        let encoded = renderer.escaper().encode_feed_chars(&rendered);

        part.doc = XmlDocument::parse_str(&encoded)
            .map_err(|e| RenderError::xml_syntax(name, XmlStage::Rendered, &encoded, &e))?;

        self.notify_part(HookEvent::AfterPartRender, &mut part)?;

        debug!(part = name, "part rendered");
        Ok(part.doc.to_xml().into_bytes())
    }

    fn notify_job(&mut self, event: HookEvent) -> Result<(), RenderError> {
        let renderer = self.renderer;
        for hook in renderer.hooks().job_hooks(event) {
            trace!(hook = %hook.name, %event, "running hook");
            (hook.callback)(self).map_err(|source| RenderError::Filter {
                hook: hook.name.clone(),
                event,
                source,
            })?;
        }
        Ok(())
    }

    fn notify_part(&mut self, event: HookEvent, part: &mut XmlPart) -> Result<(), RenderError> {
        let renderer = self.renderer;
        for hook in renderer.hooks().part_hooks(event) {
            trace!(hook = %hook.name, %event, part = %part.name, "running hook");
            (hook.callback)(self, part).map_err(|source| RenderError::Filter {
                hook: hook.name.clone(),
                event,
                source,
            })?;
        }
        Ok(())
    }

    /// Attach `media` to the document and point `image` at it
    ///
    /// Packages store the bytes as `Pictures/<name><ext>`, list them in the
    /// manifest and set the image's `xlink:href`; the stored path is
    /// returned. Flat documents embed the bytes base64-encoded in an
    /// `office:binary-data` child of `image`, replacing any existing one.
    pub fn add_document_media(
        &mut self,
        part: &mut XmlPart,
        image: NodeId,
        mut media: Media,
        name: &str,
    ) -> Result<Option<String>, HookError> {
        let mut data = Vec::new();
        media.stream.read_to_end(&mut data)?;

        match &mut self.target {
            Target::Package { archive, manifest } => {
                let path = media_path(name, &media.mime_type);
                debug!(path = %path, mime_type = %media.mime_type, bytes = data.len(), "adding media");
                archive.set(path.clone(), data);
                manifest.register(&path, &media.mime_type);
                part.doc.set_attribute(image, XLINK_HREF, &path);
                Ok(Some(path))
            }
            Target::Flat { .. } => {
                debug!(mime_type = %media.mime_type, bytes = data.len(), "embedding media");
                let binary = part.doc.create_element(OFFICE_BINARY_DATA);
                let encoded = part.doc.create_text(STANDARD.encode(&data));
                part.doc.append_child(binary, encoded);

                let existing = part
                    .doc
                    .element_children(image)
                    .find(|&child| part.doc.is_named(child, OFFICE_BINARY_DATA));
                match existing {
                    Some(old) => part.doc.replace_child(old, binary)?,
                    None => part.doc.append_child(image, binary),
                }
                Ok(None)
            }
        }
    }
}

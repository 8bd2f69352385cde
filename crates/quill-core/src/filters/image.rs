//! The `image` filter
//!
//! Inside a template the filter only hands out a placeholder key: a frame
//! named `{{ logo|image }}` renders with a random `draw:name`. Once the part
//! has been rendered the key is looked up again, the value is resolved by
//! the renderer's [`MediaLoader`](crate::media::MediaLoader) and the media is
//! attached to the frame's image.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use minijinja::value::{Kwargs, Rest};
use minijinja::{Error, ErrorKind, Value};
use quill_odf::names::{DRAW_FRAME, DRAW_NAME};
use quill_odf::NodeId;
use uuid::Uuid;

use crate::error::HookError;
use crate::job::{RenderJob, XmlPart};
use crate::media::MediaRequest;
use crate::renderer::Renderer;

/// Arguments captured by one filter call
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub value: Value,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
}

/// Placeholders handed out while one part renders
#[derive(Debug, Default)]
pub struct PlaceholderRegistry {
    entries: HashMap<String, Placeholder>,
}

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `placeholder` under a fresh key and return the key
    pub fn insert(&mut self, placeholder: Placeholder) -> String {
        let key = Uuid::new_v4().simple().to_string();
        self.entries.insert(key.clone(), placeholder);
        key
    }

    pub fn take(&mut self, key: &str) -> Option<Placeholder> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registries of the parts currently rendering, one per thread
type SharedRegistry = Arc<Mutex<HashMap<ThreadId, PlaceholderRegistry>>>;

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, HashMap<ThreadId, PlaceholderRegistry>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn register(renderer: &mut Renderer) {
    let registry = SharedRegistry::default();

    let filter_registry = Arc::clone(&registry);
    renderer
        .environment_mut()
        .add_filter("image", move |value: Value, args: Rest<Value>, kwargs: Kwargs| {
            image(&filter_registry, value, args, kwargs)
        });

    let before_registry = Arc::clone(&registry);
    renderer.register_before_part_render("image", move |job, _part| {
        let thread = thread::current().id();
        lock(&before_registry).insert(thread, PlaceholderRegistry::new());

        let exit_registry = Arc::clone(&before_registry);
        job.on_part_exit(move || {
            lock(&exit_registry).remove(&thread);
        });
        Ok(())
    });

    renderer.register_after_part_render("image", move |job, part| {
        let pending = lock(&registry).remove(&thread::current().id());
        match pending {
            Some(pending) if !pending.is_empty() => replace_images(job, part, pending),
            _ => Ok(()),
        }
    });
}

fn image(
    registry: &SharedRegistry,
    value: Value,
    args: Rest<Value>,
    kwargs: Kwargs,
) -> Result<String, Error> {
    let names: Vec<String> = kwargs.args().map(str::to_string).collect();
    let mut named = BTreeMap::new();
    for name in names {
        let arg: Value = kwargs.get(&name)?;
        named.insert(name, arg);
    }

    let mut guard = lock(registry);
    let pending = guard.get_mut(&thread::current().id()).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            "image filter used outside of a document render",
        )
    })?;

    Ok(pending.insert(Placeholder {
        value,
        args: args.0,
        kwargs: named,
    }))
}

fn replace_images(
    job: &mut RenderJob<'_>,
    part: &mut XmlPart,
    mut pending: PlaceholderRegistry,
) -> Result<(), HookError> {
    let loader = job.renderer().media_loader();

    for frame in part.doc.elements_named(DRAW_FRAME) {
        let Some(key) = part.doc.attribute(frame, DRAW_NAME) else {
            continue;
        };
        let Some(image) = part.doc.element_children(frame).next() else {
            continue;
        };
        let Some(placeholder) = pending.take(&key) else {
            continue;
        };

        let frame_attrs = attribute_map(part, frame);
        let image_attrs = attribute_map(part, image);
        let mut request = MediaRequest {
            value: placeholder.value,
            args: placeholder.args,
            kwargs: placeholder.kwargs,
            frame_attrs: frame_attrs.clone(),
            image_attrs: image_attrs.clone(),
        };

        let media = loader.load(&mut request)?;

        write_changed(part, frame, &frame_attrs, &request.frame_attrs);
        write_changed(part, image, &image_attrs, &request.image_attrs);
        if let Some(name) = request.value.as_str() {
            part.doc.set_attribute(frame, DRAW_NAME, name);
        }

        match media {
            Some(media) => {
                job.add_document_media(part, image, media, &key)?;
            }
            None => tracing::debug!(key = %key, "no media for image placeholder"),
        }
    }

    if !pending.is_empty() {
        tracing::debug!(unused = pending.len(), "image placeholders not attached to a frame");
    }
    Ok(())
}

fn attribute_map(part: &XmlPart, id: NodeId) -> BTreeMap<String, String> {
    part.doc.attributes(id).into_iter().collect()
}

fn write_changed(
    part: &mut XmlPart,
    id: NodeId,
    before: &BTreeMap<String, String>,
    after: &BTreeMap<String, String>,
) {
    for (name, value) in after {
        if before.get(name) != Some(value) {
            part.doc.set_attribute(id, name, value);
        }
    }
}

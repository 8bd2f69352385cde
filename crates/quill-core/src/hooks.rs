//! Lifecycle hooks
//!
//! Filters that need to act outside of template evaluation register named
//! callbacks for four events. Callbacks of one event run in registration
//! order and the first failure aborts the job.

use crate::error::{HookError, HookEvent};
use crate::job::{RenderJob, XmlPart};

/// Callback run at the start or end of a job
pub type JobHookFn = dyn Fn(&mut RenderJob<'_>) -> Result<(), HookError> + Send + Sync;

/// Callback run before or after a part is rendered
pub type PartHookFn =
    dyn Fn(&mut RenderJob<'_>, &mut XmlPart) -> Result<(), HookError> + Send + Sync;

/// A callback with the name reported when it fails
pub struct Hook<F: ?Sized> {
    pub name: String,
    pub callback: Box<F>,
}

/// Ordered hook lists, one per event
#[derive(Default)]
pub struct Hooks {
    pub(crate) job_start: Vec<Hook<JobHookFn>>,
    pub(crate) job_end: Vec<Hook<JobHookFn>>,
    pub(crate) before_part: Vec<Hook<PartHookFn>>,
    pub(crate) after_part: Vec<Hook<PartHookFn>>,
}

impl Hooks {
    /// Hooks registered for a job event
    pub fn job_hooks(&self, event: HookEvent) -> &[Hook<JobHookFn>] {
        match event {
            HookEvent::JobStart => &self.job_start,
            HookEvent::JobEnd => &self.job_end,
            _ => &[],
        }
    }

    /// Hooks registered for a part event
    pub fn part_hooks(&self, event: HookEvent) -> &[Hook<PartHookFn>] {
        match event {
            HookEvent::BeforePartRender => &self.before_part,
            HookEvent::AfterPartRender => &self.after_part,
            _ => &[],
        }
    }

    /// Total number of registered hooks
    pub fn len(&self) -> usize {
        self.job_start.len() + self.job_end.len() + self.before_part.len() + self.after_part.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

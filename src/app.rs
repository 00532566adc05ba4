use crate::{
    component::{Component, ComponentElement},
    environment::with_runtime,
    instance::InstanceId,
    runtime::DEFAULT_FLUSH_LIMIT,
};
use ratatui::{
    prelude::{Buffer, Rect},
    widgets::WidgetRef,
};
use std::any::Any;

pub struct App {
    root: ComponentElement,
    flush_limit: usize,
}

impl App {
    pub fn new<P: PartialEq + 'static>(component: &Component<P>, props: P) -> Self {
        Self {
            root: ComponentElement::new(component, props),
            flush_limit: DEFAULT_FLUSH_LIMIT,
        }
    }

    /// Maximum number of render/commit passes a single flush may take
    pub fn with_flush_limit(mut self, limit: usize) -> Self {
        self.flush_limit = limit.max(1);
        self
    }

    pub(crate) fn root_element(&self) -> ComponentElement {
        self.root.clone()
    }

    /// Mount the root component and settle every update it schedules
    pub fn render(self) -> MountedApp {
        with_runtime(|r| {
            r.flush_limit.set(self.flush_limit);
            let root = r.mount(None, self.root);
            r.flush();
            MountedApp { root }
        })
    }
}

/// Handle to a mounted root component
#[derive(Debug, Clone, Copy)]
pub struct MountedApp {
    root: InstanceId,
}

impl MountedApp {
    /// Render everything made dirty since the last flush and run its effects
    pub fn flush(&self) -> usize {
        with_runtime(|r| r.flush())
    }

    /// Hand an event to every `use_event` listener of the type, then flush
    pub fn dispatch<T: Any + 'static>(&self, event: T) {
        with_runtime(|r| r.dispatch(&event));
        self.flush();
    }

    /// Force the root to render again
    pub fn rerender(&self) {
        with_runtime(|r| r.mark_dirty(self.root));
        self.flush();
    }

    pub fn is_mounted(&self) -> bool {
        with_runtime(|r| r.instances.contains(self.root))
    }

    pub fn unmount(self) {
        with_runtime(|r| r.unmount(self.root))
    }
}

impl WidgetRef for MountedApp {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        with_runtime(|r| r.draw(self.root, area, buf))
    }
}

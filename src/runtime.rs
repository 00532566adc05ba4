use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
};

use ratatui::prelude::{Buffer, Rect};
use slotmap::{SecondaryMap, SlotMap};

use crate::{
    component::{ComponentElement, Element},
    hooks::StateId,
    instance::{Frame, Instance, InstanceId, Instances},
};

pub(crate) type Cleanup = Box<dyn FnOnce()>;
pub(crate) type Effect = Box<dyn FnOnce()>;
pub(crate) type Listener = Rc<dyn Fn(&dyn Any)>;

pub const DEFAULT_FLUSH_LIMIT: usize = 100;

#[derive(Clone)]
pub struct Runtime {
    pub(crate) instances: Instances,
    /// Stack of instances currently rendering, the last one owns hook calls
    pub(crate) frames: Rc<RefCell<Vec<Frame>>>,
    pub(crate) states: Rc<RefCell<SlotMap<StateId, (InstanceId, Box<dyn Any>)>>>,
    pub(crate) dirty: Rc<RefCell<Vec<InstanceId>>>,
    pub(crate) effects: Rc<RefCell<Vec<(InstanceId, Effect)>>>,
    pub(crate) cleanup: Rc<RefCell<SecondaryMap<InstanceId, Vec<Cleanup>>>>,
    pub(crate) listeners: Rc<RefCell<SecondaryMap<InstanceId, Vec<Listener>>>>,
    pub(crate) flush_limit: Rc<Cell<usize>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            instances: Instances::default(),
            frames: Rc::default(),
            states: Rc::default(),
            dirty: Rc::default(),
            effects: Rc::default(),
            cleanup: Rc::default(),
            listeners: Rc::default(),
            flush_limit: Rc::new(Cell::new(DEFAULT_FLUSH_LIMIT)),
        }
    }
}

impl Runtime {
    pub(crate) fn with_frame<R>(&self, f: impl FnOnce(&mut Frame) -> R) -> R {
        let mut frames = self.frames.borrow_mut();
        let frame = frames
            .last_mut()
            .expect("Hooks can only be called while a component renders");
        f(frame)
    }

    pub(crate) fn current_instance(&self) -> InstanceId {
        self.with_frame(|f| f.id)
    }

    pub(crate) fn mount(&self, parent: Option<InstanceId>, element: ComponentElement) -> InstanceId {
        let depth = parent
            .and_then(|p| self.instances.depth(p))
            .map(|d| d + 1)
            .unwrap_or_default();
        let name = element.component.name();
        let id = self.instances.insert(Instance {
            component: element.component,
            props: element.props,
            hooks: vec![],
            output: Default::default(),
            parent,
            children: vec![],
            depth,
            renders: 0,
        });
        tracing::debug!(?id, component = name, depth, "mount");
        self.render(id);
        id
    }

    /// Render an instance and reconcile its children against the new output
    pub(crate) fn render(&self, id: InstanceId) {
        self.dirty.borrow_mut().retain(|d| *d != id);
        let Some((component, props, hooks)) = self.instances.with(id, |i| {
            (
                i.component.clone(),
                i.props.clone(),
                std::mem::take(&mut i.hooks),
            )
        }) else {
            return;
        };

        tracing::trace!(?id, component = component.name(), "render");
        self.listeners.borrow_mut().remove(id);
        self.frames.borrow_mut().push(Frame::new(id, hooks));
        let output = component.render(&*props);
        let frame = self
            .frames
            .borrow_mut()
            .pop()
            .expect("Render frame popped by someone else");

        self.instances.with(id, |i| {
            i.hooks = frame.hooks;
            i.output = output.clone();
            i.renders += 1;
        });
        self.reconcile(id, &output);
    }

    /// Match the component elements of `output` to the previous children by
    /// position and component identity
    fn reconcile(&self, id: InstanceId, output: &Element) {
        let elements = output.components();
        let previous = self.instances.take_children(id);
        let mut children = Vec::with_capacity(elements.len());

        for (index, element) in elements.into_iter().enumerate() {
            let existing = previous.get(index).copied();
            let same = existing
                .filter(|c| self.instances.component_id(*c) == Some(element.component.id()));

            match same {
                Some(child) => {
                    let unchanged = element.component.is_memo()
                        && !self.is_dirty(child)
                        && self
                            .instances
                            .with(child, |i| element.component.props_eq(&*i.props, &*element.props))
                            .unwrap_or(false);
                    if !unchanged {
                        self.instances.with(child, |i| i.props = element.props.clone());
                        self.render(child);
                    }
                    children.push(child);
                }
                None => {
                    if let Some(stale) = existing {
                        self.unmount(stale);
                    }
                    children.push(self.mount(Some(id), element));
                }
            }
        }

        for stale in previous.into_iter().skip(children.len()) {
            self.unmount(stale);
        }
        self.instances.with(id, |i| i.children = children);
    }

    /// Remove an instance and everything below it, running effect cleanups
    pub(crate) fn unmount(&self, id: InstanceId) {
        for child in self.instances.take_children(id) {
            self.unmount(child);
        }
        self.run_cleanups(id);
        self.listeners.borrow_mut().remove(id);
        self.states.borrow_mut().retain(|_, (owner, _)| *owner != id);
        self.dirty.borrow_mut().retain(|d| *d != id);
        if let Some(instance) = self.instances.remove(id) {
            tracing::debug!(?id, component = instance.component.name(), "unmount");
        }
    }

    pub(crate) fn mark_dirty(&self, id: InstanceId) {
        let mut dirty = self.dirty.borrow_mut();
        if !dirty.contains(&id) {
            dirty.push(id);
        }
    }

    pub(crate) fn is_dirty(&self, id: InstanceId) -> bool {
        self.dirty.borrow().contains(&id)
    }

    /// Shallowest dirty instance, so parents render before their children
    fn next_dirty(&self) -> Option<InstanceId> {
        let mut dirty = self.dirty.borrow_mut();
        dirty.retain(|id| self.instances.contains(*id));
        let (index, _) = dirty
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| self.instances.depth(**id).unwrap_or_default())?;
        Some(dirty.remove(index))
    }

    pub(crate) fn queue_effect(&self, id: InstanceId, effect: impl FnOnce() + 'static) {
        self.effects.borrow_mut().push((id, Box::new(effect)));
    }

    /// Render every dirty instance, then run the effects queued by those
    /// renders. Repeats until nothing is left or the flush limit is reached.
    /// Returns the number of passes.
    pub fn flush(&self) -> usize {
        let limit = self.flush_limit.get();
        let mut passes = 0;
        loop {
            let pending = !self.dirty.borrow().is_empty() || !self.effects.borrow().is_empty();
            if !pending {
                break;
            }
            if passes >= limit {
                tracing::error!(
                    passes,
                    dirty = self.dirty.borrow().len(),
                    "flush limit reached, updates keep scheduling renders"
                );
                self.dirty.borrow_mut().clear();
                self.effects.borrow_mut().clear();
                break;
            }
            passes += 1;

            while let Some(id) = self.next_dirty() {
                self.render(id);
            }

            let effects = std::mem::take(&mut *self.effects.borrow_mut());
            tracing::debug!(pass = passes, effects = effects.len(), "commit");
            for (id, effect) in effects {
                if self.instances.contains(id) {
                    effect();
                }
            }
        }
        passes
    }

    pub(crate) fn add_cleanup(&self, id: InstanceId, f: impl FnOnce() + 'static) {
        let mut cleanups = self.cleanup.borrow_mut();
        match cleanups.get_mut(id) {
            Some(v) => v.push(Box::new(f)),
            None => {
                cleanups.insert(id, vec![Box::new(f)]);
            }
        }
    }

    fn run_cleanups(&self, id: InstanceId) {
        let cleanups = self.cleanup.borrow_mut().remove(id).unwrap_or_default();
        for cleanup in cleanups {
            cleanup()
        }
    }

    pub(crate) fn add_listener(&self, id: InstanceId, listener: Listener) {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.get_mut(id) {
            Some(v) => v.push(listener),
            None => {
                listeners.insert(id, vec![listener]);
            }
        }
    }

    /// Hand an event to every listener registered by a mounted instance
    pub(crate) fn dispatch(&self, event: &dyn Any) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .values()
            .flat_map(|l| l.iter().cloned())
            .collect();
        for listener in listeners {
            listener(event)
        }
    }

    pub(crate) fn draw(&self, id: InstanceId, area: Rect, buf: &mut Buffer) {
        let Some((output, children)) = self.instances.output(id) else {
            return;
        };
        let mut children = children.into_iter();
        output.draw(area, buf, &mut |area, buf| {
            if let Some(child) = children.next() {
                self.draw(child, area, buf)
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use ratatui::widgets::Paragraph;

    use crate::{
        app::App,
        component::{Component, Element},
        environment::with_runtime,
        hooks::{use_effect, use_state, State},
    };

    fn leaf(name: &'static str, memo: bool, renders: Rc<Cell<usize>>) -> Component<u32> {
        let render = move |n: &u32| {
            renders.set(renders.get() + 1);
            Element::widget(Paragraph::new(n.to_string()))
        };
        match memo {
            true => Component::memo(name, render),
            false => Component::new(name, render),
        }
    }

    #[test]
    fn test_memo_child_skips_equal_props() {
        let renders = Rc::new(Cell::new(0));
        let value: Rc<Cell<Option<State<u32>>>> = Rc::default();

        let child = leaf("Child", true, renders.clone());
        let value_c = value.clone();
        let parent = Component::new("Parent", move |_: &()| {
            let v = use_state(7u32);
            value_c.set(Some(v));
            Element::component(&child, v.get())
        });

        let app = App::new(&parent, ()).render();
        app.rerender();
        assert_eq!(renders.get(), 1, "equal props keep the previous output");

        value.get().expect("rendered").set(8);
        app.flush();
        assert_eq!(renders.get(), 2);
        app.unmount();
    }

    #[test]
    fn test_plain_child_rerenders_with_parent() {
        let renders = Rc::new(Cell::new(0));
        let child = leaf("Child", false, renders.clone());
        let parent = Component::new("Parent", move |_: &()| Element::component(&child, 1));

        let app = App::new(&parent, ()).render();
        app.rerender();
        assert_eq!(renders.get(), 2);
        app.unmount();
    }

    #[test]
    fn test_parent_renders_before_dirty_child() {
        let order = Rc::new(std::cell::RefCell::new(vec![]));
        let states: Rc<std::cell::RefCell<Vec<State<u8>>>> = Rc::default();

        let (order_c, states_c) = (order.clone(), states.clone());
        let child = Component::memo("Child", move |_: &()| {
            states_c.borrow_mut().push(use_state(0u8));
            order_c.borrow_mut().push("child");
            Element::Empty
        });
        let (order_c, states_c) = (order.clone(), states.clone());
        let parent = Component::new("Parent", move |_: &()| {
            states_c.borrow_mut().push(use_state(0u8));
            order_c.borrow_mut().push("parent");
            Element::component(&child, ())
        });

        let app = App::new(&parent, ()).render();
        order.borrow_mut().clear();

        let (parent_state, child_state) = (states.borrow()[0], states.borrow()[1]);
        child_state.set(1);
        parent_state.set(1);
        app.flush();

        assert_eq!(*order.borrow(), vec!["parent", "child"]);
        app.unmount();
    }

    #[test]
    fn test_changed_identity_remounts() {
        let mounts = Rc::new(Cell::new(0));
        let unmounts = Rc::new(Cell::new(0));
        let make = |mounts: Rc<Cell<usize>>, unmounts: Rc<Cell<usize>>| {
            Component::new("Leaf", move |_: &()| {
                let (mounts, unmounts) = (mounts.clone(), unmounts.clone());
                use_effect((), move || {
                    mounts.set(mounts.get() + 1);
                    move || unmounts.set(unmounts.get() + 1)
                });
                Element::Empty
            })
        };
        let a = make(mounts.clone(), unmounts.clone());
        let b = make(mounts.clone(), unmounts.clone());

        let flag: Rc<Cell<Option<State<bool>>>> = Rc::default();
        let flag_c = flag.clone();
        let parent = Component::new("Parent", move |_: &()| {
            let flag = use_state(false);
            flag_c.set(Some(flag));
            match flag.get() {
                false => Element::component(&a, ()),
                true => Element::component(&b, ()),
            }
        });

        let app = App::new(&parent, ()).render();
        app.rerender();
        assert_eq!((mounts.get(), unmounts.get()), (1, 0), "same component keeps its instance");

        flag.get().expect("rendered").set(true);
        app.flush();
        assert_eq!((mounts.get(), unmounts.get()), (2, 1));

        app.unmount();
        assert_eq!(unmounts.get(), 2);
        with_runtime(|r| assert_eq!(r.instances.len(), 0));
    }

    #[test]
    fn test_effects_of_unmounted_instance_are_dropped() {
        let ran = Rc::new(Cell::new(false));
        let show: Rc<Cell<Option<State<bool>>>> = Rc::default();

        let ran_c = ran.clone();
        let child = Component::new("Child", move |_: &()| {
            let ran = ran_c.clone();
            let tick = use_state(0u8);
            use_effect(tick.get(), move || ran.set(true));
            Element::Empty
        });
        let show_c = show.clone();
        let parent = Component::new("Parent", move |_: &()| {
            let show = use_state(true);
            show_c.set(Some(show));
            match show.get() {
                true => Element::component(&child, ()),
                false => Element::Empty,
            }
        });

        with_runtime(|r| {
            let app = App::new(&parent, ());
            // mount without flushing, then hide the child before effects run
            let root = r.mount(None, app.root_element());
            show.get().expect("rendered").set(false);
            r.flush();
            assert!(!ran.get());
            r.unmount(root);
        });
    }

    #[test]
    fn test_flush_limit_stops_render_loop() {
        let looping = Component::new("Loop", |_: &()| {
            let count = use_state(0u64);
            use_effect(count.get(), move || count.update(|c| *c += 1));
            Element::Empty
        });

        let app = App::new(&looping, ()).with_flush_limit(5).render();
        with_runtime(|r| {
            assert!(r.dirty.borrow().is_empty());
            assert!(r.effects.borrow().is_empty());
        });
        assert_eq!(app.flush(), 0);
        app.rerender();
        app.unmount();
    }
}

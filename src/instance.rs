use slotmap::{new_key_type, SlotMap};
use std::{any::Any, cell::RefCell, rc::Rc};

use crate::component::{AnyComponent, Element};

new_key_type! {
    pub struct InstanceId;
}

/// A mounted component
pub(crate) struct Instance {
    /// Component this instance renders
    pub(crate) component: Rc<dyn AnyComponent>,
    /// Props of the latest render
    pub(crate) props: Rc<dyn Any>,
    /// Hook slots in call order
    pub(crate) hooks: Vec<Box<dyn Any>>,
    /// Output of the latest render
    pub(crate) output: Element,
    /// Instance of the parent component
    pub(crate) parent: Option<InstanceId>,
    /// Child instances in the order they appear in `output`
    pub(crate) children: Vec<InstanceId>,
    pub(crate) depth: usize,
    pub(crate) renders: usize,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("component", &self.component.name())
            .field("hooks", &self.hooks.len())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("depth", &self.depth)
            .field("renders", &self.renders)
            .finish()
    }
}

#[derive(Default, Debug, Clone)]
pub(crate) struct Instances(pub(crate) Rc<RefCell<SlotMap<InstanceId, Instance>>>);

impl Instances {
    pub(crate) fn insert(&self, instance: Instance) -> InstanceId {
        self.0.borrow_mut().insert(instance)
    }

    pub(crate) fn with<R>(&self, id: InstanceId, f: impl FnOnce(&mut Instance) -> R) -> Option<R> {
        self.0.borrow_mut().get_mut(id).map(f)
    }

    pub(crate) fn contains(&self, id: InstanceId) -> bool {
        self.0.borrow().contains_key(id)
    }

    pub(crate) fn depth(&self, id: InstanceId) -> Option<usize> {
        self.0.borrow().get(id).map(|i| i.depth)
    }

    pub(crate) fn component_id(&self, id: InstanceId) -> Option<usize> {
        self.0.borrow().get(id).map(|i| i.component.id())
    }

    pub(crate) fn take_children(&self, id: InstanceId) -> Vec<InstanceId> {
        self.with(id, |i| std::mem::take(&mut i.children))
            .unwrap_or_default()
    }

    pub(crate) fn output(&self, id: InstanceId) -> Option<(Element, Vec<InstanceId>)> {
        self.0
            .borrow()
            .get(id)
            .map(|i| (i.output.clone(), i.children.clone()))
    }

    pub(crate) fn remove(&self, id: InstanceId) -> Option<Instance> {
        self.0.borrow_mut().remove(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Hook slots of the instance currently rendering
pub(crate) struct Frame {
    pub(crate) id: InstanceId,
    pub(crate) hooks: Vec<Box<dyn Any>>,
    pub(crate) cursor: usize,
}

impl Frame {
    pub(crate) fn new(id: InstanceId, hooks: Vec<Box<dyn Any>>) -> Self {
        Self {
            id,
            hooks,
            cursor: 0,
        }
    }

    /// Value of the next slot, `None` when the slot has not been created yet
    pub(crate) fn next_slot<T: Clone + 'static>(&mut self) -> Option<T> {
        let slot = self.hooks.get(self.cursor)?;
        let value = slot.downcast_ref::<T>().unwrap_or_else(|| {
            panic!(
                "Hook {} changed type between renders, hooks must be called in the same order",
                self.cursor
            )
        });
        self.cursor += 1;
        Some(value.clone())
    }

    pub(crate) fn push_slot<T: 'static>(&mut self, value: T) {
        self.hooks.push(Box::new(value));
        self.cursor += 1;
    }
}

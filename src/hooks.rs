//! Hooks give a component state that outlives a single render.
//!
//! Every hook occupies a slot of the instance that is rendering, so hooks must
//! be called unconditionally and in the same order on every render.

use std::{
    any::Any,
    cell::{Ref as CellRef, RefCell, RefMut},
    marker::PhantomData,
    rc::Rc,
};

use slotmap::new_key_type;

use crate::{environment::with_runtime, handler::Handler};

new_key_type! {
    pub struct StateId;
}

/// Value of the hook slot at the current position, created with `init` on
/// the first render
pub fn use_hook<T: Clone + 'static>(init: impl FnOnce() -> T) -> T {
    if let Some(value) = with_runtime(|r| r.with_frame(|f| f.next_slot::<T>())) {
        return value;
    }
    let value = init();
    with_runtime(|r| r.with_frame(|f| f.push_slot(value.clone())));
    value
}

/// Handle to a state owned by a component instance. Writing to it schedules
/// the owner for re-render.
pub struct State<T> {
    id: StateId,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for State<T> {}

impl<T> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("State").field(&self.id).finish()
    }
}

impl<T: 'static> State<T> {
    /// Run `f` against the value, `None` once the owner has unmounted
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let value = self.take()?;
        let result = value.downcast_ref::<T>().map(f);
        self.restore(value);
        result
    }

    pub fn try_get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with(|v| v.clone())
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.try_get()
            .unwrap_or_else(|| panic!("State {:?} has been disposed", self.id))
    }

    /// Mutate the value in place and schedule the owner. No-op once disposed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let Some(mut value) = self.take() else {
            return;
        };
        if let Some(v) = value.downcast_mut::<T>() {
            f(v)
        }
        self.restore(value);
        with_runtime(|r| {
            let owner = r.states.borrow().get(self.id).map(|(owner, _)| *owner);
            if let Some(owner) = owner {
                r.mark_dirty(owner)
            }
        });
    }

    pub fn set(&self, value: T) {
        self.update(|v| *v = value)
    }

    fn take(&self) -> Option<Box<dyn Any>> {
        with_runtime(|r| {
            r.states
                .borrow_mut()
                .get_mut(self.id)
                .map(|(_, v)| std::mem::replace(v, Box::new(())))
        })
    }

    fn restore(&self, value: Box<dyn Any>) {
        with_runtime(|r| {
            if let Some((_, v)) = r.states.borrow_mut().get_mut(self.id) {
                *v = value
            }
        })
    }
}

pub fn use_state<T: 'static>(value: T) -> State<T> {
    use_hook(|| {
        let id = with_runtime(|r| {
            let owner = r.current_instance();
            r.states.borrow_mut().insert((owner, Box::new(value)))
        });
        State {
            id,
            phantom: PhantomData,
        }
    })
}

/// Mutable value kept across renders. Writing to it never schedules a render.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Ref<T> {
    pub fn borrow(&self) -> CellRef<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Ref<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Ref<T> {
    use_hook(|| Ref(Rc::new(RefCell::new(init()))))
}

/// Value computed by `f`, recomputed only when `deps` changes
pub fn use_memo<D, T>(deps: D, f: impl FnOnce(&D) -> T) -> T
where
    D: PartialEq + 'static,
    T: Clone + 'static,
{
    let slot = use_hook(|| Rc::new(RefCell::new(None::<(D, T)>)));
    let cached = match &*slot.borrow() {
        Some((previous, value)) if *previous == deps => Some(value.clone()),
        _ => None,
    };
    if let Some(value) = cached {
        return value;
    }
    let value = f(&deps);
    slot.replace(Some((deps, value.clone())));
    value
}

/// What an effect leaves behind to run before its next run or on unmount
pub trait EffectCleanup {
    fn into_cleanup(self) -> Option<Box<dyn FnOnce()>>;
}

impl EffectCleanup for () {
    fn into_cleanup(self) -> Option<Box<dyn FnOnce()>> {
        None
    }
}

impl<F: FnOnce() + 'static> EffectCleanup for F {
    fn into_cleanup(self) -> Option<Box<dyn FnOnce()>> {
        Some(Box::new(self))
    }
}

struct EffectSlot<D> {
    deps: Option<D>,
    cleanup: Option<Box<dyn FnOnce()>>,
}

/// Run `f` after the current render commits, on mount and whenever `deps`
/// differs from the previous render
pub fn use_effect<D, C>(deps: D, f: impl FnOnce() -> C + 'static)
where
    D: PartialEq + 'static,
    C: EffectCleanup + 'static,
{
    let slot = use_hook(|| {
        let slot = Rc::new(RefCell::new(EffectSlot::<D> {
            deps: None,
            cleanup: None,
        }));
        let on_unmount = slot.clone();
        with_runtime(|r| {
            r.add_cleanup(r.current_instance(), move || {
                let cleanup = on_unmount.borrow_mut().cleanup.take();
                if let Some(cleanup) = cleanup {
                    cleanup()
                }
            })
        });
        slot
    });

    if slot.borrow().deps.as_ref() == Some(&deps) {
        return;
    }
    slot.borrow_mut().deps = Some(deps);

    with_runtime(|r| {
        r.queue_effect(r.current_instance(), move || {
            let previous = slot.borrow_mut().cleanup.take();
            if let Some(cleanup) = previous {
                cleanup()
            }
            let cleanup = f().into_cleanup();
            slot.borrow_mut().cleanup = cleanup;
        })
    });
}

/// Handler with the same identity for the whole life of the instance that
/// always calls the closure from the latest render
pub fn use_handler<A: 'static>(f: impl Fn(A) + 'static) -> Handler<A> {
    let latest = use_hook(|| Rc::new(RefCell::new(None::<Rc<dyn Fn(A)>>)));
    latest.replace(Some(Rc::new(f) as Rc<dyn Fn(A)>));
    use_hook(move || {
        Handler::new(move |arg| {
            let f = latest.borrow().clone();
            if let Some(f) = f {
                f(arg)
            }
        })
    })
}

/// Listen for events of type `T` handed to the app with `dispatch`
pub fn use_event<T: 'static>(f: impl Fn(&T) + 'static) {
    with_runtime(|r| {
        r.add_listener(
            r.current_instance(),
            Rc::new(move |event: &dyn Any| {
                if let Some(event) = event.downcast_ref::<T>() {
                    f(event)
                }
            }),
        )
    });
}

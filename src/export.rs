//! Components that publish a snapshot of their state to whoever mounts them.
//!
//! ```ignore
//! #[derive(Serialize)]
//! struct Counter {
//!     count: u32,
//!     increment: Handler,
//! }
//!
//! let counter = export_component("Counter", |_: &(), exporter: &Exporter<Counter>| {
//!     let count = use_state(0);
//!     let increment = use_handler(move |_| count.update(|c| *c += 1));
//!     exporter.export(|| Counter { count: count.get(), increment });
//!     Element::widget(Paragraph::new(count.get().to_string()))
//! });
//! ```

use std::rc::Rc;

use serde::Serialize;

use crate::{
    component::{Component, Element},
    fingerprint::fingerprint,
    hooks::{use_effect, use_ref, Ref, State},
};

/// Callback a parent hands to an exported component to receive its snapshot
pub struct Setter<E>(Rc<dyn Fn(Option<Rc<E>>)>);

impl<E> Clone for Setter<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E> PartialEq for Setter<E> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> std::fmt::Debug for Setter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Setter")
    }
}

impl<E: 'static> Setter<E> {
    pub fn new(f: impl Fn(Option<Rc<E>>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn set(&self, snapshot: Option<Rc<E>>) {
        (self.0)(snapshot)
    }

    /// Setter writing into `state`, skipping writes of the snapshot it
    /// already holds
    pub(crate) fn from_state(state: State<Option<Rc<E>>>) -> Self {
        Self::new(move |next| {
            let same = state
                .with(|current| match (current, &next) {
                    (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                    (None, None) => true,
                    _ => false,
                })
                .unwrap_or(true);
            if !same {
                state.set(next)
            }
        })
    }
}

/// Props of an exported component: the component's own props plus the
/// injected setter
pub struct ExportProps<P, E> {
    pub props: P,
    pub set_exported: Setter<E>,
}

impl<P, E> ExportProps<P, E> {
    pub fn new(props: P, set_exported: Setter<E>) -> Self {
        Self {
            props,
            set_exported,
        }
    }
}

impl<P: Clone, E> Clone for ExportProps<P, E> {
    fn clone(&self) -> Self {
        Self {
            props: self.props.clone(),
            set_exported: self.set_exported.clone(),
        }
    }
}

impl<P: PartialEq, E> PartialEq for ExportProps<P, E> {
    fn eq(&self, other: &Self) -> bool {
        self.props == other.props && self.set_exported == other.set_exported
    }
}

struct StoredSnapshot<E> {
    value: Option<Rc<E>>,
    fingerprint: Option<String>,
    revision: u64,
}

impl<E> Default for StoredSnapshot<E> {
    fn default() -> Self {
        Self {
            value: None,
            fingerprint: None,
            revision: 0,
        }
    }
}

/// Registrar passed to the render function of an exported component
pub struct Exporter<E> {
    stored: Ref<StoredSnapshot<E>>,
}

impl<E> Clone for Exporter<E> {
    fn clone(&self) -> Self {
        Self {
            stored: self.stored.clone(),
        }
    }
}

impl<E: Serialize> Exporter<E> {
    /// Compute the snapshot for this render. It replaces the stored one only
    /// if it serializes differently; a snapshot that cannot be serialized
    /// always replaces it.
    pub fn export(&self, producer: impl FnOnce() -> E) {
        let next = producer();
        let fingerprint = match fingerprint(&next) {
            Ok(f) => Some(f),
            Err(error) => {
                tracing::warn!(%error, "snapshot cannot be serialized, treating it as changed");
                None
            }
        };

        let mut stored = self.stored.borrow_mut();
        if fingerprint.is_some() && stored.fingerprint == fingerprint {
            return;
        }
        stored.value = Some(Rc::new(next));
        stored.fingerprint = fingerprint;
        stored.revision += 1;
        tracing::trace!(revision = stored.revision, "snapshot replaced");
    }
}

/// Wrap `render` into a memoized component that forwards the snapshot it
/// exports to the `set_exported` prop after every render that changed it
pub fn export_component<P, E>(
    name: &'static str,
    render: impl Fn(&P, &Exporter<E>) -> Element + 'static,
) -> Component<ExportProps<P, E>>
where
    P: PartialEq + 'static,
    E: Serialize + 'static,
{
    Component::memo(name, move |props: &ExportProps<P, E>| {
        let stored = use_ref(StoredSnapshot::<E>::default);
        let exporter = Exporter {
            stored: stored.clone(),
        };
        let element = render(&props.props, &exporter);

        let (revision, snapshot) = {
            let stored = stored.borrow();
            (stored.revision, stored.value.clone())
        };
        let setter = props.set_exported.clone();
        use_effect(revision, move || setter.set(snapshot));

        element
    })
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
    };

    use ratatui::widgets::Paragraph;
    use serde::Serialize;

    use super::*;
    use crate::{app::App, hooks::use_state};

    #[derive(Serialize, Debug, PartialEq)]
    struct Snapshot {
        state: String,
    }

    type Received = Rc<RefCell<Vec<Option<Rc<Snapshot>>>>>;

    /// Exported component whose state can be driven from the test, mounted
    /// directly with a recording setter
    fn mount_recorded(
        rerender_on: Rc<Cell<Option<State<u32>>>>,
        text: Rc<Cell<Option<State<String>>>>,
    ) -> (crate::app::MountedApp, Received) {
        let component = export_component("Child", move |_: &(), exporter: &Exporter<Snapshot>| {
            let tick = use_state(0u32);
            let state = use_state("x".to_string());
            rerender_on.set(Some(tick));
            text.set(Some(state));
            exporter.export(|| Snapshot { state: state.get() });
            Element::widget(Paragraph::new(format!("{} {}", state.get(), tick.get())))
        });

        let received: Received = Rc::default();
        let received_c = received.clone();
        let setter = Setter::new(move |s| received_c.borrow_mut().push(s));
        let app = App::new(&component, ExportProps::new((), setter)).render();
        (app, received)
    }

    #[test]
    fn test_first_render_propagates_once() {
        let (app, received) = mount_recorded(Rc::default(), Rc::default());
        let received = received.borrow();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].as_deref(),
            Some(&Snapshot {
                state: "x".to_string()
            })
        );
        app.unmount();
    }

    #[test]
    fn test_identical_export_does_not_propagate() {
        let tick: Rc<Cell<Option<State<u32>>>> = Rc::default();
        let (app, received) = mount_recorded(tick.clone(), Rc::default());

        let tick = tick.get().expect("rendered");
        tick.set(1);
        app.flush();
        tick.set(2);
        app.flush();

        assert_eq!(received.borrow().len(), 1, "snapshot serialized the same");
        app.unmount();
    }

    #[test]
    fn test_changed_export_propagates_exactly_once() {
        let text: Rc<Cell<Option<State<String>>>> = Rc::default();
        let (app, received) = mount_recorded(Rc::default(), text.clone());

        text.get().expect("rendered").set("y".to_string());
        app.flush();

        let received = received.borrow();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].as_ref().map(|s| s.state.as_str()), Some("y"));
        app.unmount();
    }

    #[test]
    fn test_export_back_to_old_value_propagates() {
        let text: Rc<Cell<Option<State<String>>>> = Rc::default();
        let (app, received) = mount_recorded(Rc::default(), text.clone());

        let text = text.get().expect("rendered");
        text.set("y".to_string());
        app.flush();
        text.set("x".to_string());
        app.flush();

        let states: Vec<_> = received
            .borrow()
            .iter()
            .map(|s| s.as_ref().map(|s| s.state.clone()))
            .collect();
        assert_eq!(
            states,
            vec![Some("x".into()), Some("y".into()), Some("x".into())]
        );
        app.unmount();
    }

    #[test]
    fn test_no_export_sends_absent_snapshot() {
        let silent = export_component("Silent", |_: &(), _: &Exporter<Snapshot>| Element::Empty);
        let received: Received = Rc::default();
        let received_c = received.clone();
        let setter = Setter::new(move |s| received_c.borrow_mut().push(s));

        let app = App::new(&silent, ExportProps::new((), setter)).render();
        assert_eq!(*received.borrow(), vec![None]);
        app.unmount();
    }

    #[test]
    fn test_fresh_handler_propagates_every_render() {
        #[derive(Serialize)]
        struct WithHandler {
            click: crate::handler::Handler,
        }

        let tick: Rc<Cell<Option<State<u8>>>> = Rc::default();
        let tick_c = tick.clone();
        let component = export_component("Fresh", move |_: &(), exporter: &Exporter<WithHandler>| {
            tick_c.set(Some(use_state(0u8)));
            exporter.export(|| WithHandler {
                click: crate::handler::Handler::new(|_| {}),
            });
            Element::Empty
        });

        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        let setter = Setter::new(move |_| count_c.set(count_c.get() + 1));
        let app = App::new(&component, ExportProps::new((), setter)).render();

        tick.get().expect("rendered").set(1);
        app.flush();
        assert_eq!(count.get(), 2);
        app.unmount();
    }

    #[test]
    fn test_unserializable_snapshot_always_replaces() {
        let tick: Rc<Cell<Option<State<u8>>>> = Rc::default();
        let tick_c = tick.clone();
        let component = export_component(
            "Unserializable",
            move |_: &(), exporter: &Exporter<HashMap<Vec<u8>, u8>>| {
                tick_c.set(Some(use_state(0u8)));
                exporter.export(|| HashMap::from([(vec![1], 1)]));
                Element::Empty
            },
        );

        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        let setter = Setter::new(move |_| count_c.set(count_c.get() + 1));
        let app = App::new(&component, ExportProps::new((), setter)).render();

        tick.get().expect("rendered").set(1);
        app.flush();
        assert_eq!(count.get(), 2);
        app.unmount();
    }

    #[test]
    fn test_setter_from_state_skips_same_snapshot() {
        let state: Rc<Cell<Option<State<Option<Rc<Snapshot>>>>>> = Rc::default();
        let renders = Rc::new(Cell::new(0));

        let (state_c, renders_c) = (state.clone(), renders.clone());
        let holder = Component::new("Holder", move |_: &()| {
            renders_c.set(renders_c.get() + 1);
            state_c.set(Some(use_state(None)));
            Element::Empty
        });

        let app = App::new(&holder, ()).render();
        let setter = Setter::from_state(state.get().expect("rendered"));
        let snapshot = Rc::new(Snapshot {
            state: "x".into(),
        });

        setter.set(None);
        app.flush();
        assert_eq!(renders.get(), 1);

        setter.set(Some(snapshot.clone()));
        app.flush();
        setter.set(Some(snapshot));
        app.flush();
        assert_eq!(renders.get(), 2);
        app.unmount();
    }
}

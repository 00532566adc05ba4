use std::rc::Rc;

use crate::{
    component::{Component, Element},
    export::{ExportProps, Setter},
    hooks::{use_effect, use_memo, use_state},
};

/// What [`use_component`] hands back to the parent
pub struct UseComponent<P, E> {
    /// Latest snapshot exported by the child, `None` until it exported once
    pub exported: Option<Rc<E>>,
    /// Renders the child with the setter injected. Stable for the life of
    /// the calling instance.
    pub component: Component<P>,
    /// Becomes true once a snapshot arrived and stays true
    pub mounted: bool,
}

impl<P, E> std::fmt::Debug for UseComponent<P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseComponent")
            .field("exported", &self.exported.is_some())
            .field("component", &self.component)
            .field("mounted", &self.mounted)
            .finish()
    }
}

/// Mount point for an exported component inside the calling component.
///
/// The handle is built on the first call and reused afterwards, a different
/// `exported` passed on a later render is ignored.
pub fn use_component<P, E>(exported: &Component<ExportProps<P, E>>) -> UseComponent<P, E>
where
    P: Clone + PartialEq + 'static,
    E: 'static,
{
    let snapshot = use_state::<Option<Rc<E>>>(None);
    let mounted = use_state(false);

    let present = snapshot.with(|s| s.is_some()).unwrap_or(false);
    use_effect(present, move || {
        if present && mounted.try_get() == Some(false) {
            mounted.set(true)
        }
    });

    let component = use_memo((), |_| {
        let target = exported.clone();
        let setter = Setter::from_state(snapshot);
        Component::new(exported.name(), move |props: &P| {
            Element::component(&target, ExportProps::new(props.clone(), setter.clone()))
        })
    });

    UseComponent {
        exported: snapshot.get(),
        component,
        mounted: mounted.get(),
    }
}

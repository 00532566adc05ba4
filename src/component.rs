use ratatui::{
    prelude::{Buffer, Constraint, Layout, Rect},
    widgets::WidgetRef,
};
use std::{any::Any, rc::Rc};

/// Type erased component, stored by every mounted instance
pub(crate) trait AnyComponent {
    fn name(&self) -> &'static str;
    fn id(&self) -> usize;
    fn is_memo(&self) -> bool;
    fn render(&self, props: &dyn Any) -> Element;
    fn props_eq(&self, a: &dyn Any, b: &dyn Any) -> bool;
}

struct ComponentFn<P> {
    name: &'static str,
    memo: bool,
    render: Box<dyn Fn(&P) -> Element>,
}

impl<P: PartialEq + 'static> AnyComponent for ComponentFn<P> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn id(&self) -> usize {
        self as *const Self as *const () as usize
    }

    fn is_memo(&self) -> bool {
        self.memo
    }

    fn render(&self, props: &dyn Any) -> Element {
        let props = props
            .downcast_ref::<P>()
            .unwrap_or_else(|| panic!("Props of {} have the wrong type", self.name));
        (self.render)(props)
    }

    fn props_eq(&self, a: &dyn Any, b: &dyn Any) -> bool {
        match (a.downcast_ref::<P>(), b.downcast_ref::<P>()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// A render function from props to an [`Element`].
///
/// Components are compared by identity: two clones of the same `Component`
/// mount onto the same instance, two separately built components never do.
pub struct Component<P> {
    inner: Rc<ComponentFn<P>>,
}

impl<P> Clone for Component<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P> std::fmt::Debug for Component<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.inner.name)
            .field("memo", &self.inner.memo)
            .finish()
    }
}

impl<P: PartialEq + 'static> Component<P> {
    pub fn new(name: &'static str, render: impl Fn(&P) -> Element + 'static) -> Self {
        Self::build(name, false, render)
    }

    /// Component that skips re-rendering when its parent renders it with equal props
    pub fn memo(name: &'static str, render: impl Fn(&P) -> Element + 'static) -> Self {
        Self::build(name, true, render)
    }

    fn build(name: &'static str, memo: bool, render: impl Fn(&P) -> Element + 'static) -> Self {
        Self {
            inner: Rc::new(ComponentFn {
                name,
                memo,
                render: Box::new(render),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn is_memo(&self) -> bool {
        self.inner.memo
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn erased(&self) -> Rc<dyn AnyComponent> {
        self.inner.clone()
    }
}

/// A component paired with the props to render it with
#[derive(Clone)]
pub struct ComponentElement {
    pub(crate) component: Rc<dyn AnyComponent>,
    pub(crate) props: Rc<dyn Any>,
}

impl ComponentElement {
    pub(crate) fn new<P: PartialEq + 'static>(component: &Component<P>, props: P) -> Self {
        Self {
            component: component.erased(),
            props: Rc::new(props),
        }
    }
}

impl std::fmt::Debug for ComponentElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.component.name())
    }
}

/// Output of a render
#[derive(Clone, Default)]
pub enum Element {
    #[default]
    Empty,
    Widget(Rc<dyn WidgetRef>),
    Component(ComponentElement),
    Column(Vec<Element>),
    Row(Vec<Element>),
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Empty => write!(f, "Empty"),
            Element::Widget(_) => write!(f, "Widget"),
            Element::Component(c) => std::fmt::Debug::fmt(c, f),
            Element::Column(c) => f.debug_tuple("Column").field(c).finish(),
            Element::Row(c) => f.debug_tuple("Row").field(c).finish(),
        }
    }
}

impl Element {
    pub fn widget(widget: impl WidgetRef + 'static) -> Self {
        Element::Widget(Rc::new(widget))
    }

    pub fn component<P: PartialEq + 'static>(component: &Component<P>, props: P) -> Self {
        Element::Component(ComponentElement::new(component, props))
    }

    pub fn column(children: impl IntoIterator<Item = Element>) -> Self {
        Element::Column(children.into_iter().collect())
    }

    pub fn row(children: impl IntoIterator<Item = Element>) -> Self {
        Element::Row(children.into_iter().collect())
    }

    /// Component elements in draw order
    pub(crate) fn components(&self) -> Vec<ComponentElement> {
        fn collect(element: &Element, out: &mut Vec<ComponentElement>) {
            match element {
                Element::Empty | Element::Widget(_) => {}
                Element::Component(c) => out.push(c.clone()),
                Element::Column(children) | Element::Row(children) => {
                    for child in children {
                        collect(child, out)
                    }
                }
            }
        }
        let mut out = vec![];
        collect(self, &mut out);
        out
    }

    /// Draw this element, resolving component elements through `draw_child`
    /// in the same order as [`Element::components`]
    pub(crate) fn draw(
        &self,
        area: Rect,
        buf: &mut Buffer,
        draw_child: &mut dyn FnMut(Rect, &mut Buffer),
    ) {
        match self {
            Element::Empty => {}
            Element::Widget(w) => w.render_ref(area, buf),
            Element::Component(_) => draw_child(area, buf),
            Element::Column(children) => {
                let areas = Layout::vertical(vec![Constraint::Fill(1); children.len()]).split(area);
                for (child, area) in children.iter().zip(areas.iter()) {
                    child.draw(*area, buf, draw_child)
                }
            }
            Element::Row(children) => {
                let areas =
                    Layout::horizontal(vec![Constraint::Fill(1); children.len()]).split(area);
                for (child, area) in children.iter().zip(areas.iter()) {
                    child.draw(*area, buf, draw_child)
                }
            }
        }
    }
}


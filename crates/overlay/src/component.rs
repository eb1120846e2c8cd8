//! Runtime-instantiated UI components.
//!
//! Components are looked up by descriptor in a [`ComponentRegistry`], receive
//! their parameters through [`Component::configure`], and are attached to a
//! [`RenderTree`] that drives their renders. [`ComponentHost`] keeps at most one
//! live instance: creating a new one destroys the previous one first.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use scene::{FeatureProperties, PropertyValue};
use tracing::debug;

use crate::dom::{Document, DomError, Element};

/// Value accepted by [`Component::configure`].
pub type ParamValue = PropertyValue;

/// Named parameters copied onto a new instance.
pub type Params = FeatureProperties;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// Queried or configured before any instance was created.
    NoInstance,
    UnknownComponent(String),
    UnknownParameter(String),
    InvalidParameter {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    AlreadyAttached(ViewId),
    Dom(DomError),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::NoInstance => write!(f, "no component instance"),
            ComponentError::UnknownComponent(d) => write!(f, "unknown component: {d}"),
            ComponentError::UnknownParameter(name) => write!(f, "unknown parameter: {name}"),
            ComponentError::InvalidParameter {
                name,
                expected,
                found,
            } => write!(f, "parameter {name}: expected {expected}, found {found}"),
            ComponentError::AlreadyAttached(id) => {
                write!(f, "view {} is already attached", id.0)
            }
            ComponentError::Dom(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ComponentError {}

impl From<DomError> for ComponentError {
    fn from(e: DomError) -> Self {
        ComponentError::Dom(e)
    }
}

/// A renderable with named, typed configuration.
pub trait Component<E: Element> {
    /// Applies one named parameter. Components reject names they do not know
    /// and values of the wrong kind.
    fn configure(&mut self, name: &str, value: ParamValue) -> Result<(), ComponentError>;

    /// Current value of a parameter.
    fn parameter(&self, name: &str) -> Option<ParamValue>;

    /// Brings `root` up to date with the component's state.
    fn render(&mut self, root: &E) -> Result<(), DomError>;

    fn destroy(&mut self) {}
}

type SharedComponent<E> = Rc<RefCell<Box<dyn Component<E>>>>;

#[derive(Clone)]
struct ComponentView<E: Element> {
    id: ViewId,
    component: SharedComponent<E>,
    root: E,
}

/// Views whose components are rendered on every [`RenderTree::tick`].
///
/// Clones share the same set of views.
pub struct RenderTree<E: Element> {
    views: Rc<RefCell<Vec<ComponentView<E>>>>,
}

impl<E: Element> Clone for RenderTree<E> {
    fn clone(&self) -> Self {
        Self {
            views: Rc::clone(&self.views),
        }
    }
}

impl<E: Element> Default for RenderTree<E> {
    fn default() -> Self {
        Self {
            views: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<E: Element> fmt::Debug for RenderTree<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ViewId> = self.views.borrow().iter().map(|v| v.id).collect();
        f.debug_struct("RenderTree").field("views", &ids).finish()
    }
}

impl<E: Element> RenderTree<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches and runs the view's first render.
    fn attach_view(&self, view: ComponentView<E>) -> Result<(), ComponentError> {
        if self.is_attached(view.id) {
            return Err(ComponentError::AlreadyAttached(view.id));
        }
        self.views.borrow_mut().push(view.clone());
        let rendered = view.component.borrow_mut().render(&view.root);
        if let Err(err) = rendered {
            self.detach_view(view.id);
            return Err(err.into());
        }
        Ok(())
    }

    fn detach_view(&self, id: ViewId) -> bool {
        let mut views = self.views.borrow_mut();
        let before = views.len();
        views.retain(|v| v.id != id);
        views.len() != before
    }

    pub fn is_attached(&self, id: ViewId) -> bool {
        self.views.borrow().iter().any(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.views.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-renders every attached view; returns how many rendered.
    pub fn tick(&self) -> Result<usize, DomError> {
        let snapshot: Vec<ComponentView<E>> = self.views.borrow().clone();
        let mut rendered = 0;
        for view in snapshot {
            let Ok(mut component) = view.component.try_borrow_mut() else {
                continue;
            };
            component.render(&view.root)?;
            rendered += 1;
        }
        Ok(rendered)
    }
}

type Factory<E> = Box<dyn Fn() -> Box<dyn Component<E>>>;

/// Descriptor to factory table.
pub struct ComponentRegistry<E: Element> {
    factories: BTreeMap<String, Factory<E>>,
}

impl<E: Element> Default for ComponentRegistry<E> {
    fn default() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }
}

impl<E: Element> fmt::Debug for ComponentRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("descriptors", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E: Element> ComponentRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `descriptor`, replacing any previous entry.
    pub fn register<F>(&mut self, descriptor: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Component<E>> + 'static,
    {
        self.factories.insert(descriptor.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, descriptor: &str) -> bool {
        self.factories.contains_key(descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, descriptor: &str) -> Result<Box<dyn Component<E>>, ComponentError> {
        let factory = self
            .factories
            .get(descriptor)
            .ok_or_else(|| ComponentError::UnknownComponent(descriptor.to_string()))?;
        Ok(factory())
    }
}

/// The live instance of a [`ComponentHost`].
pub struct ComponentRef<E: Element> {
    id: ViewId,
    descriptor: String,
    component: SharedComponent<E>,
    root: E,
}

impl<E: Element> fmt::Debug for ComponentRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("root", &self.root)
            .finish()
    }
}

impl<E: Element> ComponentRef<E> {
    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn root(&self) -> &E {
        &self.root
    }
}

/// Creates components on demand, keeping at most one alive.
#[derive(Debug)]
pub struct ComponentHost<D: Document> {
    document: D,
    registry: ComponentRegistry<D::Element>,
    tree: RenderTree<D::Element>,
    live: Option<ComponentRef<D::Element>>,
    next_id: u64,
}

impl<D: Document> Drop for ComponentHost<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<D: Document> ComponentHost<D> {
    pub fn new(document: D, registry: ComponentRegistry<D::Element>) -> Self {
        Self::with_tree(document, registry, RenderTree::new())
    }

    /// Shares `tree` with the caller so it can drive re-renders.
    pub fn with_tree(
        document: D,
        registry: ComponentRegistry<D::Element>,
        tree: RenderTree<D::Element>,
    ) -> Self {
        Self {
            document,
            registry,
            tree,
            live: None,
            next_id: 0,
        }
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry<D::Element> {
        &mut self.registry
    }

    pub fn tree(&self) -> &RenderTree<D::Element> {
        &self.tree
    }

    /// Destroys the live instance, then instantiates `descriptor`, applies
    /// every entry of `params`, attaches it, and returns its root element.
    ///
    /// Parameters are applied before the first render.
    pub fn create_instance(
        &mut self,
        descriptor: &str,
        params: &Params,
    ) -> Result<D::Element, ComponentError> {
        self.destroy();

        let mut component = self.registry.create(descriptor)?;
        let root = match self.document.create_element("div") {
            Ok(root) => root,
            Err(err) => {
                component.destroy();
                return Err(err.into());
            }
        };
        root.add_class(descriptor);

        for (name, value) in params.iter() {
            if let Err(err) = component.configure(name, value.clone()) {
                component.destroy();
                return Err(err);
            }
        }

        let id = ViewId(self.next_id);
        self.next_id += 1;
        let component: SharedComponent<D::Element> = Rc::new(RefCell::new(component));
        let view = ComponentView {
            id,
            component: Rc::clone(&component),
            root: root.clone(),
        };
        if let Err(err) = self.tree.attach_view(view) {
            component.borrow_mut().destroy();
            return Err(err);
        }

        debug!(descriptor, view = id.0, params = params.len(), "component created");
        self.live = Some(ComponentRef {
            id,
            descriptor: descriptor.to_string(),
            component,
            root: root.clone(),
        });
        Ok(root)
    }

    pub fn has_instance(&self) -> bool {
        self.live.is_some()
    }

    pub fn live(&self) -> Result<&ComponentRef<D::Element>, ComponentError> {
        self.live.as_ref().ok_or(ComponentError::NoInstance)
    }

    pub fn instance(&self) -> Result<Ref<'_, Box<dyn Component<D::Element>>>, ComponentError> {
        Ok(self.live()?.component.borrow())
    }

    pub fn instance_mut(
        &mut self,
    ) -> Result<RefMut<'_, Box<dyn Component<D::Element>>>, ComponentError> {
        Ok(self.live()?.component.borrow_mut())
    }

    /// Configures the live instance. The change shows on the next tick.
    pub fn set_parameter(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ComponentError> {
        let live = self.live()?;
        live.component.borrow_mut().configure(name, value.into())
    }

    pub fn set_parameters(&mut self, params: &Params) -> Result<(), ComponentError> {
        let live = self.live()?;
        let mut component = live.component.borrow_mut();
        for (name, value) in params.iter() {
            component.configure(name, value.clone())?;
        }
        Ok(())
    }

    /// Detaches and disposes the live instance, if any.
    pub fn destroy(&mut self) {
        let Some(live) = self.live.take() else {
            return;
        };
        self.tree.detach_view(live.id);
        if let Ok(mut component) = live.component.try_borrow_mut() {
            component.destroy();
        }
        live.root.remove();
        debug!(descriptor = %live.descriptor, view = live.id.0, "component destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_dom::{MemoryDocument, MemoryElement};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Records configure/render/destroy calls into a shared log.
    struct Probe {
        serial: usize,
        log: Rc<RefCell<Vec<String>>>,
        destroyed: Rc<RefCell<Vec<usize>>>,
        fields: BTreeMap<String, ParamValue>,
    }

    impl Component<MemoryElement> for Probe {
        fn configure(&mut self, name: &str, value: ParamValue) -> Result<(), ComponentError> {
            if name == "reject" {
                return Err(ComponentError::UnknownParameter(name.to_string()));
            }
            self.log.borrow_mut().push(format!("configure {name}"));
            self.fields.insert(name.to_string(), value);
            Ok(())
        }

        fn parameter(&self, name: &str) -> Option<ParamValue> {
            self.fields.get(name).cloned()
        }

        fn render(&mut self, root: &MemoryElement) -> Result<(), DomError> {
            self.log.borrow_mut().push("render".to_string());
            let text: Vec<String> = self.fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
            root.set_inner_html(&text.join(","));
            Ok(())
        }

        fn destroy(&mut self) {
            self.destroyed.borrow_mut().push(self.serial);
        }
    }

    struct Fixture {
        host: ComponentHost<MemoryDocument>,
        log: Rc<RefCell<Vec<String>>>,
        destroyed: Rc<RefCell<Vec<usize>>>,
    }

    fn fixture() -> Fixture {
        let log = Rc::new(RefCell::new(Vec::new()));
        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let serial = Rc::new(Cell::new(0));
        let mut registry = ComponentRegistry::new();
        let (l, d) = (Rc::clone(&log), Rc::clone(&destroyed));
        registry.register("probe", move || {
            let n = serial.get();
            serial.set(n + 1);
            Box::new(Probe {
                serial: n,
                log: Rc::clone(&l),
                destroyed: Rc::clone(&d),
                fields: BTreeMap::new(),
            }) as Box<dyn Component<MemoryElement>>
        });
        Fixture {
            host: ComponentHost::new(MemoryDocument::new(), registry),
            log,
            destroyed,
        }
    }

    fn params(pairs: &[(&str, ParamValue)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn empty_host_reports_no_instance() {
        let mut f = fixture();
        assert_eq!(f.host.instance().err(), Some(ComponentError::NoInstance));
        assert_eq!(f.host.instance_mut().err(), Some(ComponentError::NoInstance));
        assert_eq!(
            f.host.set_parameter("a", 1),
            Err(ComponentError::NoInstance)
        );
        assert_eq!(
            f.host.set_parameters(&Params::new()),
            Err(ComponentError::NoInstance)
        );
        f.host.destroy();
        assert!(f.destroyed.borrow().is_empty());
    }

    #[test]
    fn parameters_are_injected_before_first_render() {
        let mut f = fixture();
        let root = f
            .host
            .create_instance(
                "probe",
                &params(&[("a", ParamValue::from(1)), ("b", ParamValue::from("x"))]),
            )
            .expect("create");

        assert_eq!(
            *f.log.borrow(),
            vec!["configure a", "configure b", "render"]
        );
        let instance = f.host.instance().expect("live");
        assert_eq!(instance.parameter("a"), Some(ParamValue::Number(1.0)));
        assert_eq!(instance.parameter("b"), Some(ParamValue::Text("x".into())));
        drop(instance);
        assert_eq!(root.inner_html(), "a=1,b=x");
        f.host
            .instance_mut()
            .expect("live")
            .configure("c", ParamValue::Bool(true))
            .expect("configure");
        assert_eq!(f.host.tree().tick(), Ok(1));
        assert_eq!(root.inner_html(), "a=1,b=x,c=true");
        assert!(root.has_class("probe"));
    }

    #[test]
    fn only_the_latest_instance_stays_attached() {
        let mut f = fixture();
        for _ in 0..3 {
            f.host.create_instance("probe", &Params::new()).expect("create");
        }
        assert_eq!(f.host.tree().len(), 1);
        assert_eq!(f.host.live().expect("live").id().get(), 2);
        assert_eq!(*f.destroyed.borrow(), vec![0, 1]);

        f.host.destroy();
        f.host.destroy();
        assert_eq!(*f.destroyed.borrow(), vec![0, 1, 2]);
        assert!(f.host.tree().is_empty());
        assert!(!f.host.has_instance());
    }

    #[test]
    fn unknown_descriptor_is_a_configuration_error() {
        let mut f = fixture();
        f.host.create_instance("probe", &Params::new()).expect("create");
        let err = f.host.create_instance("missing", &Params::new()).unwrap_err();
        assert_eq!(err, ComponentError::UnknownComponent("missing".into()));
        assert!(!f.host.has_instance());
        assert_eq!(*f.destroyed.borrow(), vec![0]);
    }

    #[test]
    fn rejected_parameter_aborts_creation() {
        let mut f = fixture();
        let err = f
            .host
            .create_instance("probe", &params(&[("reject", ParamValue::Null)]))
            .unwrap_err();
        assert_eq!(err, ComponentError::UnknownParameter("reject".into()));
        assert!(!f.host.has_instance());
        assert!(f.host.tree().is_empty());
        assert_eq!(*f.destroyed.borrow(), vec![0]);
    }

    #[test]
    fn parameter_changes_show_on_tick() {
        let mut f = fixture();
        let root = f
            .host
            .create_instance("probe", &params(&[("a", ParamValue::from(1))]))
            .expect("create");
        f.host.set_parameter("a", 2).expect("live");
        assert_eq!(root.inner_html(), "a=1");
        assert_eq!(f.host.tree().tick(), Ok(1));
        assert_eq!(root.inner_html(), "a=2");
    }

    #[test]
    fn destroy_detaches_mounted_root() {
        let mut f = fixture();
        let root = f.host.create_instance("probe", &Params::new()).expect("create");
        let parent = MemoryElement::new("div");
        parent.append_child(&root).expect("append");
        f.host.destroy();
        assert!(parent.children().is_empty());
    }
}

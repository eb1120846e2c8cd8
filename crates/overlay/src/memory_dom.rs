//! In-process DOM used by the native viewer and by tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use foundation::math::Vec2;

use crate::dom::{ClickHandler, Document, DomError, Element};

type SharedHandler = Rc<RefCell<ClickHandler>>;

struct Node {
    tag: String,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    inner_html: String,
    children: Vec<MemoryElement>,
    parent: Option<Weak<RefCell<Node>>>,
    size: Vec2,
    click: Option<SharedHandler>,
}

#[derive(Clone)]
pub struct MemoryElement {
    node: Rc<RefCell<Node>>,
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        f.debug_struct("MemoryElement")
            .field("tag", &node.tag)
            .field("classes", &node.classes)
            .field("children", &node.children.len())
            .finish()
    }
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self::with_size(tag, Vec2::default())
    }

    pub fn with_size(tag: &str, size: Vec2) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                tag: tag.to_string(),
                classes: Vec::new(),
                style: BTreeMap::new(),
                inner_html: String::new(),
                children: Vec::new(),
                parent: None,
                size,
                click: None,
            })),
        }
    }

    pub fn tag(&self) -> String {
        self.node.borrow().tag.clone()
    }

    pub fn inner_html(&self) -> String {
        self.node.borrow().inner_html.clone()
    }

    pub fn children(&self) -> Vec<MemoryElement> {
        self.node.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<MemoryElement> {
        let node = self.node.borrow();
        let parent = node.parent.as_ref()?.upgrade()?;
        Some(MemoryElement { node: parent })
    }

    pub fn classes(&self) -> Vec<String> {
        self.node.borrow().classes.clone()
    }

    /// Stands in for layout; `offset_size` reports this value.
    pub fn set_offset_size(&self, size: Vec2) {
        self.node.borrow_mut().size = size;
    }

    pub fn has_click_handler(&self) -> bool {
        self.node.borrow().click.is_some()
    }

    /// Dispatches a click. Returns `false` when no handler is installed.
    ///
    /// The handler may remove itself (or detach the element) while running.
    pub fn click(&self) -> bool {
        let handler = self.node.borrow().click.clone();
        match handler {
            Some(handler) => {
                let Ok(mut f) = handler.try_borrow_mut() else {
                    return false;
                };
                (*f)();
                true
            }
            None => false,
        }
    }

    /// Depth-first search for the first descendant carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Option<MemoryElement> {
        for child in self.children() {
            if child.has_class(class) {
                return Some(child);
            }
            if let Some(found) = child.find_by_class(class) {
                return Some(found);
            }
        }
        None
    }
}

impl Element for MemoryElement {
    fn append_child(&self, child: &Self) -> Result<(), DomError> {
        if self.same_node(child) {
            return Err(DomError::AppendChild("element cannot contain itself".into()));
        }
        child.remove();
        child.node.borrow_mut().parent = Some(Rc::downgrade(&self.node));
        self.node.borrow_mut().children.push(child.clone());
        Ok(())
    }

    fn remove(&self) -> bool {
        let Some(parent) = self.parent() else {
            self.node.borrow_mut().parent = None;
            return false;
        };
        parent
            .node
            .borrow_mut()
            .children
            .retain(|c| !c.same_node(self));
        self.node.borrow_mut().parent = None;
        true
    }

    fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    fn set_inner_html(&self, html: &str) {
        let children = std::mem::take(&mut self.node.borrow_mut().children);
        for child in children {
            child.node.borrow_mut().parent = None;
        }
        self.node.borrow_mut().inner_html = html.to_string();
    }

    fn add_class(&self, name: &str) {
        let mut node = self.node.borrow_mut();
        if !node.classes.iter().any(|c| c == name) {
            node.classes.push(name.to_string());
        }
    }

    fn remove_class(&self, name: &str) {
        self.node.borrow_mut().classes.retain(|c| c != name);
    }

    fn has_class(&self, name: &str) -> bool {
        self.node.borrow().classes.iter().any(|c| c == name)
    }

    fn set_style(&self, property: &str, value: &str) {
        self.node
            .borrow_mut()
            .style
            .insert(property.to_string(), value.to_string());
    }

    fn style(&self, property: &str) -> Option<String> {
        self.node.borrow().style.get(property).cloned()
    }

    fn offset_size(&self) -> Vec2 {
        self.node.borrow().size
    }

    fn set_click_handler(&self, handler: Option<ClickHandler>) {
        self.node.borrow_mut().click = handler.map(|h| Rc::new(RefCell::new(h)));
    }

    fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

/// Factory for [`MemoryElement`]s. Every created element starts with `element_size`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryDocument {
    pub element_size: Vec2,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element_size(width: f64, height: f64) -> Self {
        Self {
            element_size: Vec2::new(width, height),
        }
    }
}

impl Document for MemoryDocument {
    type Element = MemoryElement;

    fn create_element(&self, tag: &str) -> Result<MemoryElement, DomError> {
        Ok(MemoryElement::with_size(tag, self.element_size))
    }
}

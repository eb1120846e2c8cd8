//! `web-sys` backend for the overlay DOM traits.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use foundation::math::Vec2;
use overlay::{ClickHandler, Document, DomError, Element};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn from_window() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(DomError::Unavailable("document"))?;
        Ok(Self { document })
    }

    pub fn raw(&self) -> &web_sys::Document {
        &self.document
    }

    pub fn element_by_id(&self, id: &str) -> Option<WebElement> {
        let element = self.document.get_element_by_id(id)?;
        element.dyn_into::<web_sys::HtmlElement>().ok().map(WebElement::new)
    }
}

impl Document for WebDocument {
    type Element = WebElement;

    fn create_element(&self, tag: &str) -> Result<WebElement, DomError> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|e| DomError::CreateElement {
                tag: tag.to_string(),
                reason: format!("{e:?}"),
            })?;
        let element = element
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| DomError::CreateElement {
                tag: tag.to_string(),
                reason: "not an HTML element".to_string(),
            })?;
        Ok(WebElement::new(element))
    }
}

type ClickSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// An `HtmlElement` plus the click closure installed through this handle.
#[derive(Clone)]
pub struct WebElement {
    element: web_sys::HtmlElement,
    click: ClickSlot,
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebElement")
            .field("tag", &self.element.tag_name())
            .field("class", &self.element.class_name())
            .finish()
    }
}

impl WebElement {
    pub fn new(element: web_sys::HtmlElement) -> Self {
        Self {
            element,
            click: Rc::new(RefCell::new(None)),
        }
    }

    pub fn raw(&self) -> &web_sys::HtmlElement {
        &self.element
    }

    fn detach_click(&self) {
        let Some(closure) = self.click.borrow_mut().take() else {
            return;
        };
        let _ = self
            .element
            .remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        // The handler may be the one running right now (a close button
        // closing its own popup); drop it once the current task is done.
        wasm_bindgen_futures::spawn_local(async move { drop(closure) });
    }
}

impl Element for WebElement {
    fn append_child(&self, child: &Self) -> Result<(), DomError> {
        self.element
            .append_child(&child.element)
            .map(|_| ())
            .map_err(|e| DomError::AppendChild(format!("{e:?}")))
    }

    fn remove(&self) -> bool {
        if self.element.parent_node().is_none() {
            return false;
        }
        self.element.remove();
        true
    }

    fn has_parent(&self) -> bool {
        self.element.parent_node().is_some()
    }

    fn set_inner_html(&self, html: &str) {
        self.element.set_inner_html(html);
    }

    fn add_class(&self, name: &str) {
        let _ = self.element.class_list().add_1(name);
    }

    fn remove_class(&self, name: &str) {
        let _ = self.element.class_list().remove_1(name);
    }

    fn has_class(&self, name: &str) -> bool {
        self.element.class_list().contains(name)
    }

    fn set_style(&self, property: &str, value: &str) {
        let _ = self.element.style().set_property(property, value);
    }

    fn style(&self, property: &str) -> Option<String> {
        self.element
            .style()
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn offset_size(&self) -> Vec2 {
        Vec2::new(
            f64::from(self.element.offset_width()),
            f64::from(self.element.offset_height()),
        )
    }

    fn set_click_handler(&self, handler: Option<ClickHandler>) {
        self.detach_click();
        let Some(handler) = handler else {
            return;
        };
        let closure = Closure::<dyn FnMut()>::wrap(handler);
        if self
            .element
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .is_ok()
        {
            *self.click.borrow_mut() = Some(closure);
        }
    }

    fn same_node(&self, other: &Self) -> bool {
        self.element.is_same_node(Some(other.element.as_ref()))
    }
}

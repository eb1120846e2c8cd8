//! Narrow DOM surface the overlay needs.
//!
//! Two backends exist: [`crate::memory_dom`] for native use and tests, and the
//! `web-sys` backend in the web viewer.

use std::fmt;

use foundation::math::Vec2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    CreateElement { tag: String, reason: String },
    AppendChild(String),
    Unavailable(&'static str),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::CreateElement { tag, reason } => {
                write!(f, "failed to create <{tag}> element: {reason}")
            }
            DomError::AppendChild(reason) => write!(f, "failed to append child: {reason}"),
            DomError::Unavailable(what) => write!(f, "{what} is unavailable"),
        }
    }
}

impl std::error::Error for DomError {}

/// Click callback installed on an element. At most one per element.
pub type ClickHandler = Box<dyn FnMut()>;

/// Handle to a DOM element. Clones refer to the same node.
pub trait Element: Clone + fmt::Debug + 'static {
    /// Appends `child`, moving it out of any previous parent.
    fn append_child(&self, child: &Self) -> Result<(), DomError>;

    /// Detaches from the parent. Returns `false` if there was no parent.
    fn remove(&self) -> bool;

    fn has_parent(&self) -> bool;

    fn set_inner_html(&self, html: &str);

    fn add_class(&self, name: &str);

    fn remove_class(&self, name: &str);

    fn has_class(&self, name: &str) -> bool;

    /// Sets an inline style property, e.g. `("left", "12px")`.
    fn set_style(&self, property: &str, value: &str);

    fn style(&self, property: &str) -> Option<String>;

    /// Laid-out width and height in pixels.
    fn offset_size(&self) -> Vec2;

    /// Installs (or with `None`, removes) the click handler.
    fn set_click_handler(&self, handler: Option<ClickHandler>);

    fn same_node(&self, other: &Self) -> bool;
}

/// Element factory.
pub trait Document: Clone + fmt::Debug + 'static {
    type Element: Element;

    fn create_element(&self, tag: &str) -> Result<Self::Element, DomError>;
}

/// Inline `display` helpers shared by the overlay components.
pub fn set_displayed<E: Element>(element: &E, displayed: bool) {
    element.set_style("display", if displayed { "block" } else { "none" });
}

pub fn is_displayed<E: Element>(element: &E) -> bool {
    element.style("display").as_deref() == Some("block")
}

/// Minimal markup escaping for text placed inside element bodies.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_html;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }
}

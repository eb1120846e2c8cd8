use std::fmt;

use crate::component::ComponentError;
use crate::dom::DomError;

/// Errors surfaced by overlay workflows that touch both the DOM and components.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
    Dom(DomError),
    Component(ComponentError),
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::Dom(e) => write!(f, "dom: {e}"),
            OverlayError::Component(e) => write!(f, "component: {e}"),
        }
    }
}

impl std::error::Error for OverlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OverlayError::Dom(e) => Some(e),
            OverlayError::Component(e) => Some(e),
        }
    }
}

impl From<DomError> for OverlayError {
    fn from(e: DomError) -> Self {
        OverlayError::Dom(e)
    }
}

impl From<ComponentError> for OverlayError {
    fn from(e: ComponentError) -> Self {
        OverlayError::Component(e)
    }
}

//! Screen-space overlays for a globe viewer.
//!
//! - [`popup::Popup`]: an info bubble pinned to a world position, re-placed on
//!   every rendered frame and hidden when its anchor turns to the far side of
//!   the globe.
//! - [`component::ComponentHost`]: instantiates registered components with
//!   injected parameters, keeping a single live instance.
//! - [`inspector::FeatureInspector`]: the two wired to feature picking.
//!
//! DOM access goes through [`dom::Document`] and [`dom::Element`]; the
//! [`memory_dom`] backend runs anywhere.

pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod feature_details;
pub mod host;
pub mod inspector;
pub mod memory_dom;
pub mod popup;

pub use component::*;
pub use config::*;
pub use dom::*;
pub use error::*;
pub use feature_details::*;
pub use host::*;
pub use inspector::*;
pub use memory_dom::*;
pub use popup::*;

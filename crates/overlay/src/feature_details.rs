use scene::FeatureProperties;

use crate::component::{Component, ComponentError, ComponentRegistry, ParamValue};
use crate::dom::{DomError, Element, escape_html};

/// Registry descriptor of [`FeatureDetails`].
pub const FEATURE_DETAILS: &str = "feature-details";

/// Attribute table for a picked feature. Every parameter becomes a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureDetails {
    properties: FeatureProperties,
}

impl FeatureDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn properties(&self) -> &FeatureProperties {
        &self.properties
    }

    pub fn markup(&self) -> String {
        if self.properties.is_empty() {
            return r#"<p class="feature-details-empty">No attributes</p>"#.to_string();
        }
        let mut html = String::from(r#"<table class="feature-details"><tbody>"#);
        for (name, value) in self.properties.iter() {
            html.push_str("<tr><th>");
            html.push_str(&escape_html(name));
            html.push_str("</th><td>");
            html.push_str(&escape_html(&value.to_string()));
            html.push_str("</td></tr>");
        }
        html.push_str("</tbody></table>");
        html
    }
}

impl<E: Element> Component<E> for FeatureDetails {
    fn configure(&mut self, name: &str, value: ParamValue) -> Result<(), ComponentError> {
        if name.trim().is_empty() {
            return Err(ComponentError::UnknownParameter(name.to_string()));
        }
        self.properties.insert(name, value);
        Ok(())
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.properties.get(name).cloned()
    }

    fn render(&mut self, root: &E) -> Result<(), DomError> {
        root.set_inner_html(&self.markup());
        Ok(())
    }
}

/// Registers the components this crate ships.
pub fn register_builtin_components<E: Element>(registry: &mut ComponentRegistry<E>) {
    registry.register(FEATURE_DETAILS, || Box::new(FeatureDetails::new()) as Box<dyn Component<E>>);
}

#[cfg(test)]
mod tests {
    use super::{FEATURE_DETAILS, FeatureDetails, register_builtin_components};
    use crate::component::{ComponentError, ComponentHost, ComponentRegistry, ParamValue, Params};
    use crate::memory_dom::{MemoryDocument, MemoryElement};

    fn host() -> ComponentHost<MemoryDocument> {
        let mut registry = ComponentRegistry::<MemoryElement>::new();
        register_builtin_components(&mut registry);
        ComponentHost::new(MemoryDocument::new(), registry)
    }

    #[test]
    fn renders_one_row_per_property() {
        let mut host = host();
        let params: Params = [("name", ParamValue::from("Pump <3>")), ("flow", ParamValue::from(12.5))]
            .into_iter()
            .collect();
        let root = host.create_instance(FEATURE_DETAILS, &params).expect("create");
        assert_eq!(
            root.inner_html(),
            "<table class=\"feature-details\"><tbody>\
             <tr><th>flow</th><td>12.5</td></tr>\
             <tr><th>name</th><td>Pump &lt;3&gt;</td></tr>\
             </tbody></table>"
        );
    }

    #[test]
    fn empty_properties_render_placeholder() {
        assert!(FeatureDetails::new().markup().contains("No attributes"));
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut host = host();
        host.create_instance(FEATURE_DETAILS, &Params::new()).expect("create");
        assert_eq!(
            host.set_parameter(" ", 1),
            Err(ComponentError::UnknownParameter(" ".into()))
        );
    }
}

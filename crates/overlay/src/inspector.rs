use foundation::math::{Vec2, Vec3};
use scene::{Feature, PickOptions};
use tracing::debug;

use crate::component::{ComponentHost, ComponentRegistry};
use crate::config::PopupConfig;
use crate::dom::Document;
use crate::error::OverlayError;
use crate::feature_details::{FEATURE_DETAILS, register_builtin_components};
use crate::host::{MountedViewer, SceneHost};
use crate::popup::Popup;

/// Click-to-inspect: picks a feature, renders its attributes through a
/// component, and shows the result in a popup pinned to the picked position.
#[derive(Debug)]
pub struct FeatureInspector<D: Document> {
    popup: Popup<D::Element>,
    components: ComponentHost<D>,
    descriptor: String,
    pick_options: PickOptions,
}

impl<D: Document> FeatureInspector<D> {
    /// Uses the built-in feature details component.
    pub fn new(document: D, config: &PopupConfig) -> Self {
        let mut registry = ComponentRegistry::new();
        register_builtin_components(&mut registry);
        Self::with_parts(
            Popup::from_config(config),
            ComponentHost::new(document, registry),
            FEATURE_DETAILS,
        )
    }

    pub fn with_parts(
        popup: Popup<D::Element>,
        components: ComponentHost<D>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            popup,
            components,
            descriptor: descriptor.into(),
            pick_options: PickOptions::default(),
        }
    }

    pub fn set_pick_options(&mut self, pick_options: PickOptions) -> &mut Self {
        self.pick_options = pick_options;
        self
    }

    pub fn popup(&self) -> &Popup<D::Element> {
        &self.popup
    }

    pub fn popup_mut(&mut self) -> &mut Popup<D::Element> {
        &mut self.popup
    }

    pub fn components(&self) -> &ComponentHost<D> {
        &self.components
    }

    /// Returns the id of the picked feature, or `None` when nothing was hit.
    /// A miss leaves any open popup as it is.
    pub fn handle_click(
        &mut self,
        scene: &MountedViewer<D>,
        window: Vec2,
    ) -> Result<Option<String>, OverlayError> {
        let Some(hit) = scene.pick(window, self.pick_options) else {
            debug!(x = window.x, y = window.y, "click hit nothing");
            return Ok(None);
        };
        let Some(feature) = hit.resolve(scene.viewer().tilesets()) else {
            return Ok(None);
        };
        self.show_feature(scene, feature, hit.position)?;
        Ok(Some(feature.id.clone()))
    }

    pub fn show_feature<S>(
        &mut self,
        scene: &S,
        feature: &Feature,
        position: Vec3,
    ) -> Result<(), OverlayError>
    where
        S: SceneHost<Document = D>,
    {
        let params = feature.all_properties();
        let root = self.components.create_instance(&self.descriptor, &params)?;
        self.popup
            .set_world_position(position)
            .set_content_node(root)
            .attach(scene)?;
        debug!(feature = %feature.id, "feature popup shown");
        Ok(())
    }

    pub fn close(&mut self) {
        self.popup.close();
        self.components.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureInspector;
    use crate::config::PopupConfig;
    use crate::dom::Element;
    use crate::host::{MountedViewer, SceneHost};
    use crate::memory_dom::MemoryDocument;
    use crate::popup::ContentKind;
    use foundation::math::Vec2;
    use scene::{Tileset, Viewer};

    fn scene() -> MountedViewer<MemoryDocument> {
        let mut viewer = Viewer::new(800.0, 600.0);
        viewer.fly_to(120.0, 30.0, 5_000.0, 0.0, -90f64.to_radians());
        viewer.add_tileset(
            Tileset::from_json_str(
                r#"{"features": [
                    {"id": "pump-1", "position": {"lon_deg": 120.0, "lat_deg": 30.0},
                     "properties": {"name": "Pump 1"}}
                ]}"#,
            )
            .expect("tileset"),
        );
        MountedViewer::new(viewer, MemoryDocument::with_element_size(160.0, 90.0)).expect("mount")
    }

    fn px(style: Option<String>) -> f64 {
        style
            .as_deref()
            .and_then(|s| s.strip_suffix("px"))
            .and_then(|s| s.parse().ok())
            .expect("pixel value")
    }

    #[test]
    fn click_on_feature_opens_popup_with_details() {
        let mut scene = scene();
        let mut inspector = FeatureInspector::new(*scene.document(), &PopupConfig::default());

        let picked = inspector
            .handle_click(&scene, Vec2::new(400.0, 300.0))
            .expect("no errors");
        assert_eq!(picked.as_deref(), Some("pump-1"));

        let popup = inspector.popup();
        assert_eq!(popup.content_kind(), ContentKind::Node);
        let content = popup.content_element().expect("content");
        assert!(content.inner_html().contains("Pump 1"));

        scene.render();
        assert!(popup.is_visible());
        let panel = popup.panel().expect("panel");
        // 160x90 panel centered above the window center (400, 300).
        assert!((px(panel.style("left")) - 320.0).abs() < 1e-6);
        assert!((px(panel.style("top")) - 200.0).abs() < 1e-6);
    }

    #[test]
    fn second_click_replaces_the_instance() {
        let scene = scene();
        let mut inspector = FeatureInspector::new(*scene.document(), &PopupConfig::default());
        inspector.handle_click(&scene, Vec2::new(400.0, 300.0)).expect("first");
        let first = inspector.popup().content_element().expect("content");
        inspector.handle_click(&scene, Vec2::new(401.0, 300.0)).expect("second");
        let second = inspector.popup().content_element().expect("content");

        assert!(!first.has_parent());
        assert_eq!(inspector.components().tree().len(), 1);
        assert_eq!(scene.container().children().len(), 1);
        assert_eq!(scene.post_render().len(), 1);
        assert!(second.has_parent());
    }

    #[test]
    fn miss_keeps_popup_and_close_releases_all() {
        let scene = scene();
        let mut inspector = FeatureInspector::new(*scene.document(), &PopupConfig::default());
        inspector.handle_click(&scene, Vec2::new(400.0, 300.0)).expect("hit");
        assert_eq!(
            inspector.handle_click(&scene, Vec2::new(10.0, 10.0)).expect("miss"),
            None
        );
        assert!(inspector.popup().is_attached());

        inspector.close();
        assert!(!inspector.popup().is_attached());
        assert!(!inspector.components().has_instance());
        assert!(scene.post_render().is_empty());
    }
}

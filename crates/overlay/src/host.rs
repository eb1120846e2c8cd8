use foundation::math::{Ellipsoid, Vec2, Vec3};
use runtime::Frame;
use scene::{PickHit, PickOptions, PostRenderEvent, SceneView, Viewer};

use crate::dom::{Document, DomError, Element};

/// A rendered scene that overlays can mount into.
pub trait SceneHost: SceneView {
    type Document: Document;

    fn document(&self) -> &Self::Document;

    /// Element overlay panels are appended to.
    fn container(&self) -> &<Self::Document as Document>::Element;

    fn post_render(&self) -> &PostRenderEvent;
}

/// A [`Viewer`] paired with a document and the element overlays mount into.
#[derive(Debug)]
pub struct MountedViewer<D: Document> {
    viewer: Viewer,
    document: D,
    container: D::Element,
}

impl<D: Document> MountedViewer<D> {
    /// Creates a fresh `div` container for overlays.
    pub fn new(viewer: Viewer, document: D) -> Result<Self, DomError> {
        let container = document.create_element("div")?;
        container.add_class("globe-viewer-container");
        Ok(Self::with_container(viewer, document, container))
    }

    pub fn with_container(viewer: Viewer, document: D, container: D::Element) -> Self {
        Self {
            viewer,
            document,
            container,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        &mut self.viewer
    }

    pub fn render(&mut self) -> Frame {
        self.viewer.render()
    }

    pub fn pick(&self, window: Vec2, opts: PickOptions) -> Option<PickHit> {
        self.viewer.pick(window, opts)
    }
}

impl<D: Document> SceneView for MountedViewer<D> {
    fn world_to_window(&self, position: Vec3) -> Option<Vec2> {
        self.viewer.world_to_window(position)
    }

    fn camera_position(&self) -> Vec3 {
        self.viewer.camera_position()
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        self.viewer.ellipsoid()
    }
}

impl<D: Document> SceneHost for MountedViewer<D> {
    type Document = D;

    fn document(&self) -> &D {
        &self.document
    }

    fn container(&self) -> &D::Element {
        &self.container
    }

    fn post_render(&self) -> &PostRenderEvent {
        self.viewer.post_render()
    }
}

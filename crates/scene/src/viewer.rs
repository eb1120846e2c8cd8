use foundation::math::{Camera, Cartographic, Ellipsoid, Vec2, Vec3};
use runtime::{Frame, FrameEvent};

use crate::picking::{PickHit, PickOptions, pick_feature};
use crate::tileset::Tileset;
use crate::view::SceneView;

/// Post-render event of a scene; listeners get a read-only view of the frame just rendered.
pub type PostRenderEvent = FrameEvent<dyn SceneView>;

/// Minimal globe scene: a camera over an ellipsoid, loaded tilesets, and a
/// post-render event raised once per [`Viewer::render`].
#[derive(Debug)]
pub struct Viewer {
    pub camera: Camera,
    pub ellipsoid: Ellipsoid,
    post_render: PostRenderEvent,
    frame: Frame,
    tilesets: Vec<Tileset>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            ellipsoid: Ellipsoid::WGS84,
            post_render: PostRenderEvent::new(),
            frame: Frame::default(),
            tilesets: Vec::new(),
        }
    }
}

impl Viewer {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        let mut viewer = Self::default();
        viewer.camera.set_viewport(canvas_width, canvas_height);
        viewer
    }

    pub fn post_render(&self) -> &PostRenderEvent {
        &self.post_render
    }

    /// The next frame to be rendered.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn add_tileset(&mut self, tileset: Tileset) -> usize {
        self.tilesets.push(tileset);
        self.tilesets.len() - 1
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn fly_to(&mut self, lon_deg: f64, lat_deg: f64, height_m: f64, heading_rad: f64, pitch_rad: f64) {
        let destination = Cartographic::from_degrees(lon_deg, lat_deg, height_m);
        self.camera
            .fly_to(&self.ellipsoid, destination, heading_rad, pitch_rad);
    }

    pub fn resize(&mut self, canvas_width: f64, canvas_height: f64) {
        self.camera.set_viewport(canvas_width, canvas_height);
    }

    /// Renders one frame: post-render listeners run, then the frame counter advances.
    pub fn render(&mut self) -> Frame {
        let frame = self.frame;
        let event = self.post_render.clone();
        let view: &dyn SceneView = &*self;
        event.raise(view);
        self.frame = frame.next();
        frame
    }

    pub fn pick(&self, window: Vec2, opts: PickOptions) -> Option<PickHit> {
        pick_feature(self, &self.tilesets, window, opts)
    }
}

impl SceneView for Viewer {
    fn world_to_window(&self, position: Vec3) -> Option<Vec2> {
        self.camera.world_to_window(position)
    }

    fn camera_position(&self) -> Vec3 {
        self.camera.position
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

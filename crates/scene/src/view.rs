use foundation::math::{Ellipsoid, Vec2, Vec3};

/// Read-only view of a rendered scene, handed to post-render listeners.
pub trait SceneView {
    /// World (ECEF) to window pixels; `None` when the point is not representable.
    fn world_to_window(&self, position: Vec3) -> Option<Vec2>;

    fn camera_position(&self) -> Vec3;

    fn ellipsoid(&self) -> &Ellipsoid;

    /// Camera height above the ellipsoid, when defined.
    fn camera_height(&self) -> Option<f64> {
        self.ellipsoid()
            .cartesian_to_cartographic(self.camera_position())
            .map(|c| c.height_m)
    }
}

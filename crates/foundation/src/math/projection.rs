use super::{Cartographic, Ellipsoid, Vec2, Vec3};

/// Perspective camera in ECEF space with a pixel viewport.
///
/// Window coordinates follow DOM conventions: origin top-left, +y down.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction.
    pub direction: Vec3,
    /// Unit up vector, orthogonal to `direction`.
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub near: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for Camera {
    fn default() -> Self {
        // Three Earth radii out over (0°, 0°), looking at the center.
        let position = Vec3::new(3.0 * super::WGS84_A, 0.0, 0.0);
        Self {
            position,
            direction: Vec3::new(-1.0, 0.0, 0.0),
            up: Vec3::UNIT_Z,
            fov_y_rad: 60f64.to_radians(),
            near: 1.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }
}

impl Camera {
    /// Camera at `eye` looking at `target`. Returns `None` when the basis is degenerate.
    pub fn look_at(eye: Vec3, target: Vec3, up_hint: Vec3) -> Option<Self> {
        let direction = (target - eye).normalize()?;
        let right = direction.cross(up_hint).normalize()?;
        let up = right.cross(direction);
        Some(Self {
            position: eye,
            direction,
            up,
            ..Self::default()
        })
    }

    /// Places the camera at `destination` oriented by heading (clockwise from north)
    /// and pitch (negative looks down), both in the local east-north-up frame.
    pub fn fly_to(&mut self, ellipsoid: &Ellipsoid, destination: Cartographic, heading_rad: f64, pitch_rad: f64) {
        let (sin_lon, cos_lon) = destination.lon_rad.sin_cos();
        let (sin_lat, cos_lat) = destination.lat_rad.sin_cos();
        let east = Vec3::new(-sin_lon, cos_lon, 0.0);
        let north = Vec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = ellipsoid.geodetic_surface_normal(destination);

        let (sin_h, cos_h) = heading_rad.sin_cos();
        let (sin_p, cos_p) = pitch_rad.sin_cos();

        self.position = ellipsoid.cartographic_to_cartesian(destination);
        self.direction = east.scale(sin_h * cos_p) + north.scale(cos_h * cos_p) + up.scale(sin_p);
        self.up = east.scale(-sin_h * sin_p) + north.scale(-cos_h * sin_p) + up.scale(cos_p);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Spins the camera frame about the Earth's axis, as a globe orbit would.
    pub fn orbit_z(&mut self, angle_rad: f64) {
        self.position = self.position.rotate_z(angle_rad);
        self.direction = self.direction.rotate_z(angle_rad);
        self.up = self.up.rotate_z(angle_rad);
    }

    fn aspect(&self) -> f64 {
        if self.viewport_height <= 0.0 {
            1.0
        } else {
            (self.viewport_width / self.viewport_height).max(1e-6)
        }
    }

    /// Projects a world point to window pixels.
    ///
    /// Returns `None` for points at or behind the near plane, or when the
    /// camera basis is degenerate. Points outside the viewport still project.
    pub fn world_to_window(&self, world: Vec3) -> Option<Vec2> {
        let right = self.direction.cross(self.up).normalize()?;
        let up = right.cross(self.direction);

        let d = world - self.position;
        let z = d.dot(self.direction);
        if !(z > self.near) {
            return None;
        }

        let f = 1.0 / (0.5 * self.fov_y_rad).tan();
        let ndc_x = d.dot(right) * f / (self.aspect() * z);
        let ndc_y = d.dot(up) * f / z;

        let window = Vec2::new(
            (ndc_x + 1.0) * 0.5 * self.viewport_width,
            (1.0 - ndc_y) * 0.5 * self.viewport_height,
        );
        window.is_finite().then_some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::Camera;
    use crate::math::{Cartographic, Ellipsoid, Vec2, Vec3, WGS84_A};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_of_view_projects_to_viewport_center() {
        let cam = Camera::default();
        let p = cam.world_to_window(Vec3::ZERO).expect("in front");
        assert_close(p.x, 640.0, 1e-9);
        assert_close(p.y, 360.0, 1e-9);
    }

    #[test]
    fn up_is_toward_top_of_window() {
        let cam = Camera::default();
        let above = cam.world_to_window(Vec3::new(0.0, 0.0, 1000.0)).expect("in front");
        assert!(above.y < 360.0);
        let east = cam.world_to_window(Vec3::new(0.0, 1000.0, 0.0)).expect("in front");
        // Looking down -X with +Z up, +Y is to the right.
        assert!(east.x > 640.0);
    }

    #[test]
    fn behind_camera_is_not_representable() {
        let cam = Camera::default();
        assert_eq!(cam.world_to_window(Vec3::new(4.0 * WGS84_A, 0.0, 0.0)), None);
    }

    #[test]
    fn look_at_rejects_parallel_up() {
        assert!(Camera::look_at(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn fly_to_straight_down_sees_nadir_at_center() {
        let e = Ellipsoid::WGS84;
        let mut cam = Camera::default();
        cam.fly_to(&e, Cartographic::from_degrees(10.0, 45.0, 1000.0), 0.0, -std::f64::consts::FRAC_PI_2);
        let nadir = e.from_degrees(10.0, 45.0, 0.0);
        let p = cam.world_to_window(nadir).expect("below camera");
        assert_close(p.x, 640.0, 1e-6);
        assert_close(p.y, 360.0, 1e-6);
        assert!(cam.up.dot(cam.direction).abs() < 1e-12);
    }

    #[test]
    fn orbit_keeps_center_in_view() {
        let mut cam = Camera::default();
        cam.orbit_z(1.0);
        let p = cam.world_to_window(Vec3::ZERO).expect("in front");
        assert!(p.distance(Vec2::new(640.0, 360.0)) < 1e-6);
    }
}

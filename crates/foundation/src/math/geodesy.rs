use super::Vec3;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// Geographic position: longitude and latitude in radians, height in meters above the ellipsoid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cartographic {
    pub lon_rad: f64,
    pub lat_rad: f64,
    pub height_m: f64,
}

impl Cartographic {
    pub fn new(lon_rad: f64, lat_rad: f64, height_m: f64) -> Self {
        Self {
            lon_rad,
            lat_rad,
            height_m,
        }
    }

    pub fn from_degrees(lon_deg: f64, lat_deg: f64, height_m: f64) -> Self {
        Self::new(lon_deg.to_radians(), lat_deg.to_radians(), height_m)
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }
}

/// Oblate ellipsoid of revolution about +Z.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius (meters).
    pub a: f64,
    /// Polar radius (meters).
    pub b: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

impl Ellipsoid {
    pub const WGS84: Self = Self {
        a: WGS84_A,
        b: WGS84_B,
    };

    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    pub fn maximum_radius(&self) -> f64 {
        self.a.max(self.b)
    }

    /// First eccentricity squared.
    fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }

    /// Second eccentricity squared.
    fn ep2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.b * self.b)
    }

    /// Geodetic surface normal at `carto`.
    pub fn geodetic_surface_normal(&self, carto: Cartographic) -> Vec3 {
        let cos_lat = carto.lat_rad.cos();
        Vec3::new(
            cos_lat * carto.lon_rad.cos(),
            cos_lat * carto.lon_rad.sin(),
            carto.lat_rad.sin(),
        )
    }

    pub fn cartographic_to_cartesian(&self, carto: Cartographic) -> Vec3 {
        let sin_lat = carto.lat_rad.sin();
        let cos_lat = carto.lat_rad.cos();
        let sin_lon = carto.lon_rad.sin();
        let cos_lon = carto.lon_rad.cos();
        let e2 = self.e2();

        let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        Vec3::new(
            (n + carto.height_m) * cos_lat * cos_lon,
            (n + carto.height_m) * cos_lat * sin_lon,
            (n * (1.0 - e2) + carto.height_m) * sin_lat,
        )
    }

    /// Shorthand for a point given in degrees, as picked positions and camera destinations usually are.
    pub fn from_degrees(&self, lon_deg: f64, lat_deg: f64, height_m: f64) -> Vec3 {
        self.cartographic_to_cartesian(Cartographic::from_degrees(lon_deg, lat_deg, height_m))
    }

    /// Bowring's closed form. Returns `None` near the ellipsoid center where
    /// latitude and longitude are undefined.
    pub fn cartesian_to_cartographic(&self, p: Vec3) -> Option<Cartographic> {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) || p.length() < 1.0 {
            return None;
        }
        let (a, b) = (self.a, self.b);
        let e2 = self.e2();
        let ep2 = self.ep2();

        let r = (p.x * p.x + p.y * p.y).sqrt();
        let lon = p.y.atan2(p.x);

        let theta = (p.z * a).atan2(r * b);
        let (sin_theta, cos_theta) = theta.sin_cos();
        let lat = (p.z + ep2 * b * sin_theta * sin_theta * sin_theta)
            .atan2(r - e2 * a * cos_theta * cos_theta * cos_theta);

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        // Near the poles `r / cos_lat` degenerates; use the z form there.
        let height = if cos_lat.abs() > 1e-10 {
            r / cos_lat - n
        } else {
            p.z.abs() - b
        };

        Some(Cartographic::new(lon, lat, height))
    }
}

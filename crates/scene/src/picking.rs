use foundation::math::{Vec2, Vec3};

use crate::tileset::{Feature, Tileset};
use crate::view::SceneView;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    /// Maximum window-space distance between the click and a feature anchor.
    pub tolerance_px: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self { tolerance_px: 8.0 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub tileset: usize,
    pub feature: usize,
    /// World position of the picked feature's anchor.
    pub position: Vec3,
    /// Where the anchor projected this frame.
    pub window: Vec2,
    pub distance_px: f64,
}

impl PickHit {
    pub fn resolve<'a>(&self, tilesets: &'a [Tileset]) -> Option<&'a Feature> {
        tilesets.get(self.tileset)?.features.get(self.feature)
    }
}

/// Deterministic screen-space feature picking.
///
/// Ordering contract:
/// - The anchor closest to `window` (in pixels) wins.
/// - Equal pixel distance: the anchor closer to the camera wins.
/// - Still tied: lower `(tileset, feature)` index wins.
///
/// Anchors that do not project, or that face away from the camera, are skipped.
pub fn pick_feature(
    view: &dyn SceneView,
    tilesets: &[Tileset],
    window: Vec2,
    opts: PickOptions,
) -> Option<PickHit> {
    let camera = view.camera_position();
    let mut best: Option<(PickHit, f64)> = None;

    for (ti, tileset) in tilesets.iter().enumerate() {
        for (fi, feature) in tileset.features.iter().enumerate() {
            let position = feature.world_position(view.ellipsoid());
            if !faces_camera(view, position) {
                continue;
            }
            let Some(projected) = view.world_to_window(position) else {
                continue;
            };
            let distance_px = projected.distance(window);
            if distance_px > opts.tolerance_px {
                continue;
            }
            let depth = camera.distance(position);
            let hit = PickHit {
                tileset: ti,
                feature: fi,
                position,
                window: projected,
                distance_px,
            };

            best = match best {
                None => Some((hit, depth)),
                Some((b, bd)) => {
                    let ord = distance_px
                        .total_cmp(&b.distance_px)
                        .then_with(|| depth.total_cmp(&bd))
                        .then_with(|| (ti, fi).cmp(&(b.tileset, b.feature)));
                    if ord.is_lt() {
                        Some((hit, depth))
                    } else {
                        Some((b, bd))
                    }
                }
            };
        }
    }

    best.map(|(hit, _)| hit)
}

fn faces_camera(view: &dyn SceneView, position: Vec3) -> bool {
    let ellipsoid = view.ellipsoid();
    let Some(carto) = ellipsoid.cartesian_to_cartographic(position) else {
        return false;
    };
    let normal = ellipsoid.geodetic_surface_normal(carto);
    (view.camera_position() - position).dot(normal) > 0.0
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, pick_feature};
    use crate::properties::FeatureProperties;
    use crate::tileset::{Feature, FeaturePosition, Tileset};
    use crate::viewer::Viewer;
    use foundation::math::Vec2;

    fn feature(id: &str, lon_deg: f64, lat_deg: f64) -> Feature {
        Feature {
            id: id.to_string(),
            position: FeaturePosition {
                lon_deg,
                lat_deg,
                height_m: 0.0,
            },
            properties: FeatureProperties::new(),
        }
    }

    fn viewer_over_origin() -> Viewer {
        let mut viewer = Viewer::new(800.0, 600.0);
        viewer.fly_to(0.0, 0.0, 10_000.0, 0.0, -90f64.to_radians());
        viewer
    }

    #[test]
    fn picks_feature_under_cursor() {
        let viewer = viewer_over_origin();
        let tilesets = vec![Tileset {
            name: "t".into(),
            features: vec![feature("a", 0.0, 0.0), feature("b", 0.05, 0.0)],
        }];
        let hit = pick_feature(&viewer, &tilesets, Vec2::new(401.0, 299.0), PickOptions::default())
            .expect("hit");
        assert_eq!(hit.resolve(&tilesets).map(|f| f.id.as_str()), Some("a"));
        assert!(hit.distance_px < 2.0);
    }

    #[test]
    fn misses_outside_tolerance() {
        let viewer = viewer_over_origin();
        let tilesets = vec![Tileset {
            name: "t".into(),
            features: vec![feature("a", 0.0, 0.0)],
        }];
        let opts = PickOptions { tolerance_px: 5.0 };
        assert!(pick_feature(&viewer, &tilesets, Vec2::new(420.0, 300.0), opts).is_none());
    }

    #[test]
    fn ignores_far_side_of_globe() {
        let mut viewer = Viewer::new(800.0, 600.0);
        // Camera far out over (0, 0); the antipode projects onto the globe's center.
        viewer.fly_to(0.0, 0.0, 20_000_000.0, 0.0, -90f64.to_radians());
        let tilesets = vec![Tileset {
            name: "t".into(),
            features: vec![feature("antipode", 180.0, 0.0)],
        }];
        let hit = pick_feature(
            &viewer,
            &tilesets,
            Vec2::new(400.0, 300.0),
            PickOptions { tolerance_px: 50.0 },
        );
        assert!(hit.is_none());
    }
}

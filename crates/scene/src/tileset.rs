use std::path::Path;

use foundation::math::{Cartographic, Ellipsoid, Vec3};
use serde::{Deserialize, Serialize};

use crate::properties::{FeatureProperties, PropertyValue};

#[derive(Debug)]
pub enum TilesetError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateFeature(String),
}

impl std::fmt::Display for TilesetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TilesetError::Io(e) => write!(f, "tileset read failed: {e}"),
            TilesetError::Json(e) => write!(f, "tileset json invalid: {e}"),
            TilesetError::DuplicateFeature(id) => write!(f, "duplicate feature id: {id}"),
        }
    }
}

impl std::error::Error for TilesetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TilesetError::Io(e) => Some(e),
            TilesetError::Json(e) => Some(e),
            TilesetError::DuplicateFeature(_) => None,
        }
    }
}

impl From<std::io::Error> for TilesetError {
    fn from(e: std::io::Error) -> Self {
        TilesetError::Io(e)
    }
}

impl From<serde_json::Error> for TilesetError {
    fn from(e: serde_json::Error) -> Self {
        TilesetError::Json(e)
    }
}

/// Geographic anchor of a feature, in degrees and meters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePosition {
    pub lon_deg: f64,
    pub lat_deg: f64,
    #[serde(default)]
    pub height_m: f64,
}

impl FeaturePosition {
    pub fn to_cartographic(self) -> Cartographic {
        Cartographic::from_degrees(self.lon_deg, self.lat_deg, self.height_m)
    }
}

/// A pickable feature with its attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub position: FeaturePosition,
    #[serde(default)]
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn world_position(&self, ellipsoid: &Ellipsoid) -> Vec3 {
        ellipsoid.cartographic_to_cartesian(self.position.to_cartographic())
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties.names().collect()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Copies every named property into a fresh bag.
    pub fn all_properties(&self) -> FeatureProperties {
        self.property_names()
            .into_iter()
            .filter_map(|name| self.property(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

/// Flat collection of point features, as loaded from a tileset JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    #[serde(default)]
    pub name: String,
    pub features: Vec<Feature>,
}

impl Tileset {
    pub fn from_json_str(json: &str) -> Result<Self, TilesetError> {
        let tileset: Tileset = serde_json::from_str(json)?;
        tileset.validate()?;
        Ok(tileset)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), TilesetError> {
        let mut seen = std::collections::BTreeSet::new();
        for feature in &self.features {
            if !seen.insert(feature.id.as_str()) {
                return Err(TilesetError::DuplicateFeature(feature.id.clone()));
            }
        }
        Ok(())
    }

    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Tileset, TilesetError};
    use crate::properties::PropertyValue;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "name": "west-sewage",
        "features": [
            {"id": "pump-1", "position": {"lon_deg": 120.7235, "lat_deg": 31.0184, "height_m": 12.0},
             "properties": {"name": "Pump 1", "capacity": 340}},
            {"id": "tank-2", "position": {"lon_deg": 120.7241, "lat_deg": 31.0189}}
        ]
    }"#;

    #[test]
    fn loads_features_with_defaults() {
        let t = Tileset::from_json_str(SAMPLE).expect("valid");
        assert_eq!(t.name, "west-sewage");
        assert_eq!(t.len(), 2);
        let tank = t.feature("tank-2").expect("present");
        assert_eq!(tank.position.height_m, 0.0);
        assert!(tank.properties.is_empty());
    }

    #[test]
    fn all_properties_copies_every_name() {
        let t = Tileset::from_json_str(SAMPLE).expect("valid");
        let props = t.feature("pump-1").expect("present").all_properties();
        assert_eq!(props.names().collect::<Vec<_>>(), vec!["capacity", "name"]);
        assert_eq!(props.get("capacity"), Some(&PropertyValue::Number(340.0)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"{"features": [
            {"id": "a", "position": {"lon_deg": 0, "lat_deg": 0}},
            {"id": "a", "position": {"lon_deg": 1, "lat_deg": 1}}
        ]}"#;
        match Tileset::from_json_str(json) {
            Err(TilesetError::DuplicateFeature(id)) => assert_eq!(id, "a"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(Tileset::from_json_str("{"), Err(TilesetError::Json(_))));
    }
}

use serde::{Deserialize, Serialize};

/// Serializable popup presentation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Extra class on the panel, applied at construction.
    pub class_name: Option<String>,
    /// Pixel offset `[dx, dy]` applied to the computed anchor.
    pub offset: [f64; 2],
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::PopupConfig;
    use crate::memory_dom::MemoryElement;
    use crate::popup::Popup;
    use foundation::math::Vec2;

    #[test]
    fn missing_fields_take_defaults() {
        let config: PopupConfig = serde_json::from_str(r#"{"offset": [0, -12]}"#).expect("valid");
        assert_eq!(config.offset, [0.0, -12.0]);
        assert_eq!(config.class_name, None);
    }

    #[test]
    fn popup_from_config() {
        let config = PopupConfig {
            class_name: Some("dark".into()),
            offset: [3.0, 4.0],
            title: Some("Details".into()),
        };
        let popup: Popup<MemoryElement> = Popup::from_config(&config);
        assert_eq!(popup.offset(), Vec2::new(3.0, 4.0));
        assert_eq!(popup.title(), "Details");
    }
}

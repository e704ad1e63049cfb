use serde::Deserialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElementApiConfig {
    /// Logical tag to element tag, e.g. `view -> x-view`. Unmapped tags pass
    /// through unchanged.
    pub tag_map: HashMap<String, String>,
    pub default_display_linear: bool,
    pub default_overflow_visible: bool,
}

impl Default for ElementApiConfig {
    fn default() -> Self {
        Self {
            tag_map: HashMap::new(),
            default_display_linear: true,
            default_overflow_visible: false,
        }
    }
}

impl ElementApiConfig {
    pub fn map_tag<'a>(&'a self, tag: &'a str) -> &'a str {
        self.tag_map.get(tag).map_or(tag, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ElementApiConfig = serde_json::from_value(serde_json::json!({
            "tag_map": {"view": "x-view"}
        }))
        .unwrap();
        assert_eq!(config.map_tag("view"), "x-view");
        assert_eq!(config.map_tag("text"), "text");
        assert!(config.default_display_linear);
        assert!(!config.default_overflow_visible);
    }
}

//! Configuration presets library

use crate::{
    AppearanceConfig, AreaGradient, ChannelStyle, ConfigError, PlaceholderPolicy, Result,
    WidgetConfig,
};
use eco_chart_shared::{ChannelName, UpdateContract};
use std::collections::HashMap;

pub const TIMELINE_PRESET: &str = "eco-timeline";
pub const PROJECTION_PRESET: &str = "eco-projection";

/// Line styles for mass, energy and build power
pub fn default_channel_styles() -> Vec<ChannelStyle> {
    vec![
        ChannelStyle {
            channel: ChannelName::Mass,
            color: "#10b981".to_string(),
            width: 3.0,
            dashed: false,
            area: Some(AreaGradient {
                top: "rgba(16, 185, 129, 0.3)".to_string(),
                bottom: "rgba(16, 185, 129, 0.05)".to_string(),
            }),
        },
        ChannelStyle {
            channel: ChannelName::Energy,
            color: "#f59e0b".to_string(),
            width: 2.0,
            dashed: false,
            area: None,
        },
        ChannelStyle {
            channel: ChannelName::BuildPower,
            color: "#3b82f6".to_string(),
            width: 2.0,
            dashed: true,
            area: None,
        },
    ]
}

/// Named configuration templates the page can pick by name
pub struct PresetManager {
    builtin_presets: HashMap<String, WidgetConfig>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    pub fn new() -> Self {
        let mut manager = Self {
            builtin_presets: HashMap::new(),
        };

        manager.load_builtin_presets();

        manager
    }

    pub fn get(&self, name: &str) -> Option<&WidgetConfig> {
        self.builtin_presets.get(name)
    }

    /// List preset names, sorted
    pub fn list_presets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtin_presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Apply a preset with overrides
    pub fn apply_preset(
        &self,
        preset_name: &str,
        overrides: Option<serde_json::Value>,
    ) -> Result<WidgetConfig> {
        let base_config = self
            .get(preset_name)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Unknown preset: {} (available: {})",
                    preset_name,
                    self.list_presets().join(", ")
                ))
            })?
            .clone();

        let Some(overrides) = overrides else {
            return Ok(base_config);
        };
        log::debug!("Applying overrides to preset '{}'", preset_name);

        let mut base_json = serde_json::to_value(&base_config)
            .map_err(|e| ConfigError::Parse(format!("Serialization error: {}", e)))?;

        Self::merge_json(&mut base_json, overrides);

        serde_json::from_value(base_json)
            .map_err(|e| ConfigError::Parse(format!("Deserialization error: {}", e)))
    }

    /// Deep merge JSON objects, `overlay` wins
    fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
        match (base, overlay) {
            (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => Self::merge_json(existing, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
            (base, overlay) => *base = overlay,
        }
    }

    fn load_builtin_presets(&mut self) {
        self.builtin_presets
            .insert(TIMELINE_PRESET.to_string(), Self::create_timeline_preset());
        self.builtin_presets
            .insert(PROJECTION_PRESET.to_string(), Self::create_projection_preset());
    }

    /// Full series pushed by the host, placeholder while empty
    fn create_timeline_preset() -> WidgetConfig {
        WidgetConfig::default()
    }

    /// Parameter driven, one foreground metric with a goal marker
    fn create_projection_preset() -> WidgetConfig {
        WidgetConfig {
            contract: UpdateContract::Projection,
            placeholder: PlaceholderPolicy::disabled(),
            appearance: AppearanceConfig {
                title: "Eco Projection".to_string(),
                ..AppearanceConfig::default()
            },
            ..WidgetConfig::default()
        }
    }
}

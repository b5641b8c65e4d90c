//! Configuration system for the Eco Chart widget
//! Manages lifecycle timing, placeholder data, update contract and the
//! cosmetic settings passed through to the rendering engine.

use eco_chart_shared::{ChannelName, EcoChartError, UpdateContract};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub mod parser;
pub mod presets;
pub mod validation;

pub use parser::{ConfigFormat, ConfigParser};
pub use presets::PresetManager;
pub use validation::ConfigValidator;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for EcoChartError {
    fn from(error: ConfigError) -> Self {
        let message = match error {
            ConfigError::Parse(message) | ConfigError::Validation(message) => message,
        };
        EcoChartError::InvalidConfig {
            message,
            field: None,
        }
    }
}

/// Renderer backend requested from the engine
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Svg,
    Canvas,
}

impl RendererKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RendererKind::Svg => "svg",
            RendererKind::Canvas => "canvas",
        }
    }
}

/// Timing of deferred initialization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Delay between attempts while the container has no size
    pub retry_delay_ms: u64,
    /// Delay of the one-shot resize after a successful init
    pub post_init_resize_delay_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 100,
            post_init_resize_delay_ms: 100,
        }
    }
}

impl LifecycleConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn post_init_resize_delay(&self) -> Duration {
        Duration::from_millis(self.post_init_resize_delay_ms)
    }
}

/// Data shown while the host has not sent a time axis yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaceholderPolicy {
    pub enabled: bool,
    pub time: Vec<f64>,
    pub values: BTreeMap<ChannelName, Vec<f64>>,
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            time: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            values: BTreeMap::from([
                (ChannelName::Mass, vec![100.0, 150.0, 200.0, 250.0, 300.0]),
                (ChannelName::Energy, vec![1000.0, 1100.0, 1200.0, 1300.0, 1400.0]),
                (ChannelName::BuildPower, vec![10.0, 15.0, 20.0, 25.0, 30.0]),
            ]),
        }
    }
}

impl PlaceholderPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn values_for(&self, channel: ChannelName) -> &[f64] {
        self.values.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Vertical gradient under a line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AreaGradient {
    pub top: String,
    pub bottom: String,
}

/// Cosmetic settings of one channel, fixed at construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelStyle {
    pub channel: ChannelName,
    pub color: String,
    pub width: f32,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<AreaGradient>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    pub title: String,
    pub x_axis_name: String,
    pub y_axis_name: String,
    pub channels: Vec<ChannelStyle>,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            title: "Eco Over Time".to_string(),
            x_axis_name: "Time (seconds)".to_string(),
            y_axis_name: "Amount".to_string(),
            channels: presets::default_channel_styles(),
        }
    }
}

impl AppearanceConfig {
    pub fn style(&self, channel: ChannelName) -> Option<&ChannelStyle> {
        self.channels.iter().find(|s| s.channel == channel)
    }
}

/// Complete widget configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    pub contract: UpdateContract,
    pub renderer: RendererKind,
    pub lifecycle: LifecycleConfig,
    pub placeholder: PlaceholderPolicy,
    pub appearance: AppearanceConfig,
}

impl WidgetConfig {
    /// Parse and validate in one step
    pub fn load(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = ConfigParser::parse_string(content, format)?;
        ConfigValidator::validate(&config)?;
        log::debug!(
            "Loaded {:?} widget config ({:?} contract, {} renderer)",
            format,
            config.contract,
            config.renderer.as_str()
        );
        Ok(config)
    }

    /// A built-in preset, with optional overrides in `format` merged on top
    pub fn from_preset(name: &str, overrides: Option<&str>, format: ConfigFormat) -> Result<Self> {
        let overrides = overrides
            .map(|content| ConfigParser::parse_partial::<serde_json::Value>(content, format))
            .transpose()?;
        let config = PresetManager::new().apply_preset(name, overrides)?;
        ConfigValidator::validate(&config)?;
        log::debug!("Loaded widget config from preset '{}'", name);
        Ok(config)
    }
}

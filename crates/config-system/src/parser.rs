//! Configuration parser for multiple formats

use crate::{ConfigError, Result, WidgetConfig};
use serde::de::DeserializeOwned;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Configuration parser
pub struct ConfigParser;

impl ConfigParser {
    /// Parse a widget configuration from a string
    pub fn parse_string(content: &str, format: ConfigFormat) -> Result<WidgetConfig> {
        Self::parse_partial(content, format)
    }

    /// Parse any configuration fragment, e.g. preset overrides
    pub fn parse_partial<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T> {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("YAML parse error: {}", e))),
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RendererKind;
    use eco_chart_shared::UpdateContract;

    #[test]
    fn test_toml_parsing() {
        let content = r#"
contract = "projection"
renderer = "canvas"

[lifecycle]
retry_delay_ms = 50

[appearance]
title = "Eco Projection"
"#;
        let config = ConfigParser::parse_string(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.contract, UpdateContract::Projection);
        assert_eq!(config.renderer, RendererKind::Canvas);
        assert_eq!(config.lifecycle.retry_delay_ms, 50);
        assert_eq!(config.appearance.title, "Eco Projection");
    }

    #[test]
    fn test_yaml_parsing() {
        let content = "placeholder:\n  enabled: false\n";
        let config = ConfigParser::parse_string(content, ConfigFormat::Yaml).unwrap();
        assert!(!config.placeholder.enabled);
        assert_eq!(config.placeholder.time.len(), 5);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ConfigParser::parse_string("{not json", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("JSON parse error"));
    }
}

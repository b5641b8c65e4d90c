//! Configuration validation utilities

use crate::{
    AppearanceConfig, ConfigError, LifecycleConfig, PlaceholderPolicy, Result, WidgetConfig,
};
use eco_chart_shared::ChannelName;

/// Upper bound for any lifecycle delay
pub const MAX_DELAY_MS: u64 = 5_000;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &WidgetConfig) -> Result<()> {
        Self::validate_lifecycle(&config.lifecycle)?;
        Self::validate_placeholder(&config.placeholder)?;
        Self::validate_appearance(&config.appearance)?;
        Ok(())
    }

    fn validate_lifecycle(lifecycle: &LifecycleConfig) -> Result<()> {
        for (name, value) in [
            ("retry_delay_ms", lifecycle.retry_delay_ms),
            ("post_init_resize_delay_ms", lifecycle.post_init_resize_delay_ms),
        ] {
            if value == 0 || value > MAX_DELAY_MS {
                return Err(ConfigError::Validation(format!(
                    "Invalid {}: {}. Must be between 1 and {}",
                    name, value, MAX_DELAY_MS
                )));
            }
        }
        Ok(())
    }

    fn validate_placeholder(placeholder: &PlaceholderPolicy) -> Result<()> {
        if !placeholder.enabled {
            return Ok(());
        }

        if placeholder.time.is_empty() {
            return Err(ConfigError::Validation(
                "Placeholder is enabled but has an empty time axis".to_string(),
            ));
        }

        for (channel, values) in &placeholder.values {
            if values.len() != placeholder.time.len() {
                return Err(ConfigError::Validation(format!(
                    "Placeholder values for {} have length {} but the time axis has {}",
                    channel,
                    values.len(),
                    placeholder.time.len()
                )));
            }
        }
        Ok(())
    }

    fn validate_appearance(appearance: &AppearanceConfig) -> Result<()> {
        for channel in ChannelName::ALL {
            let count = appearance
                .channels
                .iter()
                .filter(|s| s.channel == channel)
                .count();
            if count != 1 {
                return Err(ConfigError::Validation(format!(
                    "Expected exactly one style for {}, found {}",
                    channel, count
                )));
            }
        }

        if let Some(style) = appearance.channels.iter().find(|s| !(s.width > 0.0)) {
            return Err(ConfigError::Validation(format!(
                "Line width for {} must be positive",
                style.channel
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_bounds() {
        let mut config = WidgetConfig::default();
        config.lifecycle.retry_delay_ms = 0;
        assert!(ConfigValidator::validate(&config).is_err());

        config.lifecycle.retry_delay_ms = MAX_DELAY_MS + 1;
        assert!(ConfigValidator::validate(&config).is_err());

        config.lifecycle.retry_delay_ms = MAX_DELAY_MS;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_placeholder_lengths() {
        let mut config = WidgetConfig::default();
        config
            .placeholder
            .values
            .insert(ChannelName::Energy, vec![1.0, 2.0]);
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Energy"));

        // Disabled placeholders are not checked
        config.placeholder.enabled = false;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_every_channel_needs_a_style() {
        let mut config = WidgetConfig::default();
        config
            .appearance
            .channels
            .retain(|s| s.channel != ChannelName::BuildPower);
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = WidgetConfig::default();
        config.appearance.channels[1].width = 0.0;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}

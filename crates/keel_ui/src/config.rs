//! UI configuration, loaded once at startup from TOML.

use serde::Deserialize;

use crate::error::{UiError, UiResult};

/// Tunables shared by every control under one manager.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Width of a vertical scrollbar, height of a horizontal one.
    pub scrollbar_thickness: f32,
    /// Content pixels scrolled per wheel notch.
    pub wheel_step: f32,
    /// Prefix for ids generated by the declarative loader.
    pub id_prefix: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            scrollbar_thickness: 12.0,
            wheel_step: 20.0,
            id_prefix: String::from("control"),
        }
    }
}

impl UiConfig {
    /// Parses a configuration document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::Parse`] for malformed TOML and
    /// [`UiError::InvalidProperty`] for out-of-range values.
    pub fn from_toml(source: &str) -> UiResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidProperty`] naming the first bad value.
    pub fn validate(&self) -> UiResult<()> {
        if self.scrollbar_thickness <= 0.0 {
            return Err(UiError::InvalidProperty {
                property: "scrollbar_thickness",
                value: self.scrollbar_thickness.to_string(),
            });
        }
        if self.wheel_step < 0.0 {
            return Err(UiError::InvalidProperty {
                property: "wheel_step",
                value: self.wheel_step.to_string(),
            });
        }
        if self.id_prefix.is_empty() {
            return Err(UiError::InvalidProperty {
                property: "id_prefix",
                value: String::new(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = UiConfig::from_toml("wheel_step = 40.0").unwrap();

        assert_eq!(config.wheel_step, 40.0);
        assert_eq!(config.scrollbar_thickness, 12.0);
        assert_eq!(config.id_prefix, "control");
    }

    #[test]
    fn test_invalid_thickness_rejected() {
        let err = UiConfig::from_toml("scrollbar_thickness = 0.0").unwrap_err();
        assert!(matches!(err, UiError::InvalidProperty { property: "scrollbar_thickness", .. }));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(matches!(UiConfig::from_toml("wheel_step = ["), Err(UiError::Parse(_))));
    }
}

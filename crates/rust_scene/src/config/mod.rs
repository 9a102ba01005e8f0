//! Configuration system
//!
//! Scene settings are plain serde structs loadable from TOML or RON files.
//! Every section has sensible defaults, so a config file only needs to list
//! the values it overrides.

pub use serde::{Serialize, Deserialize};

use crate::render::shadow::MAX_CASCADES;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Padding applied by the culling passes
///
/// Padding pushes every view-volume plane outward so entities near the
/// boundary do not pop in and out between frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CullingConfig {
    /// Padding for the main camera frustum test
    pub render_padding: f32,
    /// Padding for the per-cascade shadow caster box test
    pub shadow_padding: f32,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            render_padding: 0.5,
            shadow_padding: 5.0,
        }
    }
}

/// Cascaded shadow map settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    /// Number of cascades (1..=`MAX_CASCADES`)
    pub cascade_count: usize,
    /// Shadow map width in pixels
    pub map_width: u32,
    /// Shadow map height in pixels
    pub map_height: u32,
    /// Blend weight between logarithmic (1.0) and uniform (0.0) splits
    pub split_lambda: f32,
    /// Snap each cascade to the shadow map texel grid
    pub stabilize: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            cascade_count: 4,
            map_width: 2048,
            map_height: 2048,
            split_lambda: 0.95,
            stabilize: true,
        }
    }
}

/// Top-level scene configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Culling paddings
    pub culling: CullingConfig,
    /// Shadow cascade settings
    pub shadows: ShadowConfig,
}

impl Config for SceneConfig {}

impl SceneConfig {
    /// Check that every value is usable by the passes
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shadows = &self.shadows;
        if shadows.cascade_count == 0 || shadows.cascade_count > MAX_CASCADES {
            return Err(ConfigError::Invalid(format!(
                "cascade_count must be in 1..={MAX_CASCADES}, got {}",
                shadows.cascade_count
            )));
        }
        if !(0.0..=1.0).contains(&shadows.split_lambda) {
            return Err(ConfigError::Invalid(format!(
                "split_lambda must be in [0, 1], got {}",
                shadows.split_lambda
            )));
        }
        if shadows.map_width == 0 || shadows.map_height == 0 {
            return Err(ConfigError::Invalid("shadow map size must be non-zero".to_string()));
        }
        if self.culling.render_padding < 0.0 || self.culling.shadow_padding < 0.0 {
            return Err(ConfigError::Invalid("culling padding must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SceneConfig = toml::from_str(
            "[shadows]\ncascade_count = 2\n",
        ).unwrap();

        assert_eq!(config.shadows.cascade_count, 2);
        assert_eq!(config.shadows.map_width, 2048);
        assert_eq!(config.culling, CullingConfig::default());
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let path = std::env::temp_dir().join("rust_scene_config_test.ron");
        let path = path.to_string_lossy().to_string();

        let mut config = SceneConfig::default();
        config.culling.shadow_padding = 12.0;
        config.shadows.stabilize = false;
        config.save_to_file(&path).unwrap();

        let loaded = SceneConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = SceneConfig::default();
        config.shadows.cascade_count = MAX_CASCADES + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SceneConfig::default();
        config.shadows.split_lambda = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SceneConfig::default();
        config.culling.render_padding = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SceneConfig::load_from_file("scene.json");
        assert!(result.is_err());
    }
}

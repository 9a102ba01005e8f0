//! Lighting component for ECS
//!
//! Pure data component following Game Engine Architecture principles:
//! - Components contain only data, no logic
//! - All logic resides in systems

use crate::ecs::Component;
use crate::foundation::math::{utils, Vec3};

/// Fallback direction used when a light is given a zero-length vector
pub const DEFAULT_LIGHT_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Directional light (like sunlight) with parallel rays
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightComponent {
    /// Direction the light travels in world space (normalized)
    pub direction: Vec3,
    /// RGB color values for the light (0.0 to 1.0 range)
    pub color: Vec3,
    /// Light intensity multiplier
    pub intensity: f32,
    /// Whether this light should cast shadows
    pub casts_shadows: bool,
}

impl Component for DirectionalLightComponent {}

impl Default for DirectionalLightComponent {
    fn default() -> Self {
        Self::new(DEFAULT_LIGHT_DIRECTION)
    }
}

impl DirectionalLightComponent {
    /// White shadow-casting light travelling along `direction`
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: normalized_direction(direction),
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            casts_shadows: true,
        }
    }

    /// Builder pattern: Set color and intensity
    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Builder pattern: Enable or disable shadow casting
    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    /// Change the light direction
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = normalized_direction(direction);
    }
}

fn normalized_direction(direction: Vec3) -> Vec3 {
    utils::try_normalize(direction).unwrap_or_else(|| {
        log::warn!("Zero-length light direction, falling back to {:?}", DEFAULT_LIGHT_DIRECTION);
        DEFAULT_LIGHT_DIRECTION
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_is_normalized() {
        let light = DirectionalLightComponent::new(Vec3::new(-0.7, -1.0, 0.3));
        assert_relative_eq!(light.direction.magnitude(), 1.0, epsilon = 1e-6);
        assert!(light.casts_shadows);
    }

    #[test]
    fn test_zero_direction_falls_back() {
        let light = DirectionalLightComponent::new(Vec3::zeros());
        assert_eq!(light.direction, DEFAULT_LIGHT_DIRECTION);
    }
}

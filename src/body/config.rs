use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// How the solver treats a body.
///
/// - `Static` — immovable; other bodies collide with it.
/// - `Dynamic` — fully simulated; responds to gravity, impulses, contacts.
/// - `Kinematic` — infinite mass, moved by velocity only; pushes dynamic
///   bodies but is unaffected by forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Static,
    Dynamic,
    Kinematic,
}

/// Physical parameters for a registered body.
///
/// Coefficients are dimensionless; the initial transform is in container
/// pixels and degrees (converted at the engine boundary). Keeping body sizes
/// around 0.1–2.0 m (via the world scale) keeps stacking stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub body_type: BodyType,
    /// Mass source for dynamic bodies (mass = density × area).
    pub density: f32,
    /// Sliding friction for contacts. Typical UI values: 0.2–0.8.
    pub friction: f32,
    /// Bounciness for contacts. Values above 1.0 inject energy.
    pub restitution: f32,
    /// Air-resistance-like velocity decay.
    pub linear_damping: f32,
    /// Rotational velocity decay.
    pub angular_damping: f32,
    /// Suppress all rotation; useful for labels/buttons that should move but
    /// stay upright.
    pub fixed_rotation: bool,
    /// Allow the solver to sleep the body at rest.
    pub allow_sleep: bool,
    /// Continuous collision detection for fast movers (more expensive).
    pub bullet: bool,
    /// Multiplier on world gravity for this body. 0 floats, negatives invert.
    pub gravity_scale: f32,
    /// Spawn position in container pixels.
    pub position_px: Vec2,
    /// Spawn rotation in degrees (clockwise in y-down screen space).
    pub rotation_degrees: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            density: 1.0,
            friction: 0.3,
            restitution: 0.2,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            allow_sleep: true,
            bullet: false,
            gravity_scale: 1.0,
            position_px: Vec2::ZERO,
            rotation_degrees: 0.0,
        }
    }
}

impl BodyConfig {
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            gravity_scale: 0.0,
            ..Self::default()
        }
    }

    pub fn kinematic() -> Self {
        Self {
            body_type: BodyType::Kinematic,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position_px: Vec2) -> Self {
        self.position_px = position_px;
        self
    }

    pub fn with_rotation(mut self, rotation_degrees: f32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }

    pub fn with_allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("BodyConfig.density", self.density),
            ("BodyConfig.friction", self.friction),
            ("BodyConfig.restitution", self.restitution),
            ("BodyConfig.linear_damping", self.linear_damping),
            ("BodyConfig.angular_damping", self.angular_damping),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_pattern() {
        let config = BodyConfig::dynamic()
            .with_position(Vec2::new(10.0, 20.0))
            .with_rotation(45.0)
            .with_gravity_scale(0.5)
            .with_fixed_rotation(true)
            .with_bullet(true);

        assert_eq!(config.body_type, BodyType::Dynamic);
        assert_eq!(config.position_px, Vec2::new(10.0, 20.0));
        assert!((config.rotation_degrees - 45.0).abs() < 1e-6);
        assert!((config.gravity_scale - 0.5).abs() < 1e-6);
        assert!(config.fixed_rotation);
        assert!(config.bullet);
    }

    #[test]
    fn fixed_preset_has_no_gravity() {
        let config = BodyConfig::fixed();
        assert_eq!(config.body_type, BodyType::Static);
        assert_eq!(config.gravity_scale, 0.0);
    }

    #[test]
    fn validate_rejects_negative_coefficients() {
        assert!(BodyConfig::default().validate().is_ok());
        assert!(BodyConfig::dynamic().with_density(-1.0).validate().is_err());
        assert!(BodyConfig::dynamic().with_friction(f32::NAN).validate().is_err());
        assert!(BodyConfig::dynamic().with_linear_damping(-0.1).validate().is_err());
    }
}

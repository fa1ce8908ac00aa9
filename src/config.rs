use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a configuration value.
///
/// Configuration mistakes are rejected eagerly, when the owning object is
/// constructed, instead of surfacing later as solver instability.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be > 0 (got {value})")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be >= 0 (got {value})")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be finite (got {value})")]
    NotFinite { name: &'static str, value: f32 },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name, value });
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { name, value });
    }
    Ok(())
}

fn require_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(())
}

fn require_positive_count(name: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { name, value: 0.0 });
    }
    Ok(())
}

/// Fixed-step simulation settings.
///
/// The world advances by a constant `dt = 1 / hz` regardless of the host's
/// frame rate; variable frame time is accumulated and drained in fixed-size
/// chunks, with `max_sub_steps` bounding per-frame catch-up work and
/// `max_delta_seconds` bounding how much real time a single stalled frame
/// may inject into the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Target simulation frequency in Hz. The fixed step is `1 / hz` seconds.
    pub hz: f32,
    /// Velocity constraint solver iterations.
    pub velocity_iterations: u32,
    /// Position correction solver iterations.
    pub position_iterations: u32,
    /// Maximum fixed steps per rendered frame.
    pub max_sub_steps: u32,
    /// Maximum accepted per-frame delta in seconds. Larger frame deltas are
    /// clamped before entering the accumulator.
    pub max_delta_seconds: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            hz: 60.0,
            velocity_iterations: 8,
            position_iterations: 3,
            max_sub_steps: 3,
            max_delta_seconds: 1.0 / 15.0,
        }
    }
}

impl StepConfig {
    pub fn new(
        hz: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        max_sub_steps: u32,
        max_delta_seconds: f32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            hz,
            velocity_iterations,
            position_iterations,
            max_sub_steps,
            max_delta_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("StepConfig.hz", self.hz)?;
        require_positive_count("StepConfig.velocity_iterations", self.velocity_iterations)?;
        require_positive_count("StepConfig.position_iterations", self.position_iterations)?;
        require_positive_count("StepConfig.max_sub_steps", self.max_sub_steps)?;
        require_positive("StepConfig.max_delta_seconds", self.max_delta_seconds)?;
        Ok(())
    }

    /// Duration of one fixed step in seconds.
    pub fn fixed_step_seconds(&self) -> f32 {
        1.0 / self.hz
    }

    /// View over the solver iteration counts.
    pub fn solver_iterations(&self) -> SolverIterations {
        SolverIterations {
            velocity: self.velocity_iterations,
            position: self.position_iterations,
        }
    }
}

/// Solver iteration counts, carried by value in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverIterations {
    pub velocity: u32,
    pub position: u32,
}

impl Default for SolverIterations {
    fn default() -> Self {
        Self {
            velocity: 8,
            position: 3,
        }
    }
}

/// Static walls enclosing the container.
///
/// When enabled, four walls are generated just outside the container bounds
/// so bodies collide with the container edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub enabled: bool,
    pub restitution: f32,
    pub friction: f32,
    /// Wall thickness in pixels. Walls extend this far beyond the adjacent
    /// corners so the enclosure has no gaps.
    pub thickness_px: f32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            restitution: 0.2,
            friction: 0.3,
            thickness_px: 64.0,
        }
    }
}

impl BoundaryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("BoundaryConfig.restitution", self.restitution)?;
        require_non_negative("BoundaryConfig.friction", self.friction)?;
        require_positive("BoundaryConfig.thickness_px", self.thickness_px)?;
        Ok(())
    }
}

/// Pointer-drag behavior for a body.
///
/// Joint-style drag attaches the body to the pointer target through a
/// spring-like constraint; direct control drives the body's velocity toward
/// the target without a joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Upper bound on the force the drag constraint may apply, scaled by the
    /// body's mass at drag start.
    pub max_force: f32,
    /// Spring frequency in Hz for joint-style drag; also the stiffness source
    /// for direct control.
    pub frequency_hz: f32,
    /// Spring damping ratio. `~0.7` settles quickly with little oscillation.
    pub damping_ratio: f32,
    /// `true` selects joint-style drag, `false` direct velocity control.
    pub joint_style: bool,
    /// Release-velocity magnitude clamp in px/s.
    pub max_fling_velocity_px_s: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            max_force: 1_000.0,
            frequency_hz: 5.0,
            damping_ratio: 0.7,
            joint_style: true,
            max_fling_velocity_px_s: 6_000.0,
        }
    }
}

impl DragConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("DragConfig.max_force", self.max_force)?;
        require_positive("DragConfig.frequency_hz", self.frequency_hz)?;
        require_non_negative("DragConfig.damping_ratio", self.damping_ratio)?;
        require_positive(
            "DragConfig.max_fling_velocity_px_s",
            self.max_fling_velocity_px_s,
        )?;
        Ok(())
    }
}

/// Top-level configuration for a simulation container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World length scale: how many pixels equal one physics meter.
    ///
    /// `100` keeps typical UI element sizes in the 0.1–2.0 m range, which is
    /// where 2D rigid-body solvers are numerically happiest.
    pub px_per_meter: f32,
    /// World gravity in m/s², screen axes (`+x` right, `+y` down).
    pub gravity_mps2: Vec2,
    pub step: StepConfig,
    pub boundaries: BoundaryConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            px_per_meter: 100.0,
            gravity_mps2: Vec2::new(0.0, 9.8),
            step: StepConfig::default(),
            boundaries: BoundaryConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parse a configuration from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("WorldConfig.px_per_meter", self.px_per_meter)?;
        if !self.gravity_mps2.x.is_finite() || !self.gravity_mps2.y.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "WorldConfig.gravity_mps2",
                value: f32::NAN,
            });
        }
        self.step.validate()?;
        self.boundaries.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_are_valid() {
        assert!(WorldConfig::default().validate().is_ok());
        assert!(StepConfig::default().validate().is_ok());
        assert!(BoundaryConfig::default().validate().is_ok());
        assert!(DragConfig::default().validate().is_ok());
    }

    #[test]
    fn step_config_rejects_non_positive_hz() {
        let err = StepConfig::new(0.0, 8, 3, 3, 0.066).unwrap_err();
        assert!(err.to_string().contains("hz"));
        assert!(StepConfig::new(-60.0, 8, 3, 3, 0.066).is_err());
    }

    #[test]
    fn step_config_rejects_zero_iterations() {
        assert!(StepConfig::new(60.0, 0, 3, 3, 0.066).is_err());
        assert!(StepConfig::new(60.0, 8, 0, 3, 0.066).is_err());
        assert!(StepConfig::new(60.0, 8, 3, 0, 0.066).is_err());
    }

    #[test]
    fn world_config_rejects_bad_scale() {
        let mut config = WorldConfig::default();
        config.px_per_meter = 0.0;
        assert!(config.validate().is_err());
        config.px_per_meter = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn boundary_config_rejects_negative_coefficients() {
        let mut config = BoundaryConfig::default();
        config.restitution = -0.1;
        assert!(config.validate().is_err());

        let mut config = BoundaryConfig::default();
        config.thickness_px = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_json_parses_and_validates() {
        let config = WorldConfig::from_json(
            r#"{
                "px_per_meter": 50.0,
                "gravity_mps2": [0.0, 4.9],
                "step": {
                    "hz": 120.0,
                    "velocity_iterations": 6,
                    "position_iterations": 2,
                    "max_sub_steps": 4,
                    "max_delta_seconds": 0.05
                },
                "boundaries": {
                    "enabled": false,
                    "restitution": 0.0,
                    "friction": 0.5,
                    "thickness_px": 32.0
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.px_per_meter, 50.0);
        assert_eq!(config.step.hz, 120.0);
        assert!(!config.boundaries.enabled);

        let bad = WorldConfig::from_json(r#"{"px_per_meter": -1.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn fixed_step_matches_hz() {
        let step = StepConfig::default();
        assert!((step.fixed_step_seconds() - 1.0 / 60.0).abs() < 1e-7);
        let iters = step.solver_iterations();
        assert_eq!(iters.velocity, 8);
        assert_eq!(iters.position, 3);
    }
}

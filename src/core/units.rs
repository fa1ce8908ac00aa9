use glam::Vec2;

use crate::config::ConfigError;

/// Values below this magnitude are snapped to exactly zero by every
/// conversion, so floating-point noise never leaks into the solver.
pub const EPSILON: f32 = 1e-5;

const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;
const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

fn snap_zero(value: f32) -> f32 {
    if value.abs() <= EPSILON {
        0.0
    } else {
        value
    }
}

/// Converts values between UI space (px / degrees) and physics space
/// (meters / radians).
///
/// Coordinate axes are the same on both sides: `+x` right, `+y` down, which
/// lets gravity be written as `(0, +9.8)`.
///
/// Scale contract:
/// - `meters = px / px_per_meter`
/// - `px = meters * px_per_meter`
///
/// This is the single seam where world scale lives; nothing outside this type
/// multiplies or divides by the scale.
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    scale: f32,
    inverse_scale: f32,
}

impl UnitConverter {
    /// Create a converter for the given pixels-per-meter scale.
    ///
    /// The scale must be finite and strictly positive; this is enforced here,
    /// at construction, never at call sites.
    pub fn new(px_per_meter: f32) -> Result<Self, ConfigError> {
        if !px_per_meter.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "px_per_meter",
                value: px_per_meter,
            });
        }
        if px_per_meter <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "px_per_meter",
                value: px_per_meter,
            });
        }
        Ok(Self {
            scale: px_per_meter,
            inverse_scale: 1.0 / px_per_meter,
        })
    }

    pub fn px_per_meter(&self) -> f32 {
        self.scale
    }

    pub fn px_to_meters(&self, px: f32) -> f32 {
        snap_zero(px * self.inverse_scale)
    }

    pub fn meters_to_px(&self, meters: f32) -> f32 {
        snap_zero(meters * self.scale)
    }

    /// Pixel value rounded to the nearest integer, clamped to the `i32` range.
    pub fn meters_to_px_rounded(&self, meters: f32) -> i32 {
        let px = self.meters_to_px(meters);
        px.clamp(i32::MIN as f32, i32::MAX as f32).round() as i32
    }

    pub fn px_vec_to_meters(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.px_to_meters(v.x), self.px_to_meters(v.y))
    }

    pub fn meters_vec_to_px(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.meters_to_px(v.x), self.meters_to_px(v.y))
    }

    pub fn degrees_to_radians(&self, degrees: f32) -> f32 {
        snap_zero(degrees * DEG_TO_RAD)
    }

    pub fn radians_to_degrees(&self, radians: f32) -> f32 {
        snap_zero(radians * RAD_TO_DEG)
    }

    /// px/s → m/s. Velocities scale exactly like lengths.
    pub fn velocity_px_to_mps(&self, v: Vec2) -> Vec2 {
        self.px_vec_to_meters(v)
    }

    /// m/s → px/s.
    pub fn velocity_mps_to_px(&self, v: Vec2) -> Vec2 {
        self.meters_vec_to_px(v)
    }

    /// Impulse in the UI length domain → physics length domain.
    ///
    /// Mass is not modeled at the API surface, so only the length scale
    /// converts.
    pub fn impulse_px_to_physics(&self, v: Vec2) -> Vec2 {
        self.px_vec_to_meters(v)
    }

    /// Scalar impulse magnitude, physics → UI length domain.
    pub fn impulse_physics_to_px(&self, impulse: f32) -> f32 {
        self.meters_to_px(impulse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_scale() {
        assert!(UnitConverter::new(0.0).is_err());
        assert!(UnitConverter::new(-100.0).is_err());
        assert!(UnitConverter::new(f32::NAN).is_err());
        assert!(UnitConverter::new(f32::INFINITY).is_err());
        assert!(UnitConverter::new(100.0).is_ok());
    }

    #[test]
    fn round_trips_within_epsilon() {
        let units = UnitConverter::new(100.0).unwrap();
        for px in [1.0_f32, -7.5, 640.0, 0.001, 123456.0] {
            let back = units.meters_to_px(units.px_to_meters(px));
            assert!(
                (back - px).abs() <= EPSILON * px.abs().max(1.0),
                "round trip failed: {} -> {}",
                px,
                back
            );
        }
    }

    #[test]
    fn snaps_tiny_values_to_zero() {
        let units = UnitConverter::new(100.0).unwrap();
        assert_eq!(units.px_to_meters(1e-4), 0.0);
        assert_eq!(units.meters_to_px(1e-8), 0.0);
        assert_eq!(units.radians_to_degrees(1e-7), 0.0);
    }

    #[test]
    fn degree_radian_conversion() {
        let units = UnitConverter::new(100.0).unwrap();
        let rad = units.degrees_to_radians(180.0);
        assert!((rad - std::f32::consts::PI).abs() < 1e-5);
        let deg = units.radians_to_degrees(std::f32::consts::FRAC_PI_2);
        assert!((deg - 90.0).abs() < 1e-3);
    }

    #[test]
    fn vector_conversion_is_componentwise() {
        let units = UnitConverter::new(50.0).unwrap();
        let m = units.px_vec_to_meters(Vec2::new(100.0, -25.0));
        assert_eq!(m, Vec2::new(2.0, -0.5));
        let px = units.meters_vec_to_px(Vec2::new(2.0, -0.5));
        assert_eq!(px, Vec2::new(100.0, -25.0));
    }

    #[test]
    fn rounded_px_clamps_and_rounds() {
        let units = UnitConverter::new(100.0).unwrap();
        assert_eq!(units.meters_to_px_rounded(1.004), 100);
        assert_eq!(units.meters_to_px_rounded(1.006), 101);
        assert_eq!(units.meters_to_px_rounded(1e30), i32::MAX);
    }
}

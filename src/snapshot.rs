use std::collections::HashMap;

use glam::Vec2;
use serde::Serialize;

use crate::api::types::BodyKey;
use crate::config::{SolverIterations, StepConfig};

/// Render-ready view of one body, in UI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub key: BodyKey,
    pub position_px: Vec2,
    pub rotation_degrees: f32,
    pub awake: bool,
    pub velocity_px_s: Vec2,
}

/// Immutable point-in-time export of the whole world.
///
/// Everything is carried by value; mutating live engine state afterwards
/// cannot retroactively change a snapshot already handed out. Valid to read
/// only after stepping for the frame has completed.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub paused: bool,
    /// World gravity in m/s².
    pub gravity_mps2: Vec2,
    pub step: StepConfig,
    pub solver: SolverIterations,
    pub bodies: Vec<BodySnapshot>,
    /// Monotonic fixed-step counter at capture time.
    pub step_index: u64,
    #[serde(skip)]
    index: HashMap<BodyKey, usize>,
}

impl WorldSnapshot {
    pub(crate) fn new(
        paused: bool,
        gravity_mps2: Vec2,
        step: StepConfig,
        solver: SolverIterations,
        bodies: Vec<BodySnapshot>,
        step_index: u64,
    ) -> Self {
        let index = bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (b.key, i))
            .collect();
        Self {
            paused,
            gravity_mps2,
            step,
            solver,
            bodies,
            step_index,
            index,
        }
    }

    /// O(1) lookup by key, for consumers matching UI elements to physics
    /// state.
    pub fn body(&self, key: BodyKey) -> Option<&BodySnapshot> {
        self.index.get(&key).map(|&i| &self.bodies[i])
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodySnapshot> {
        self.bodies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(key: u64, x: f32) -> BodySnapshot {
        BodySnapshot {
            key: BodyKey(key),
            position_px: Vec2::new(x, 0.0),
            rotation_degrees: 0.0,
            awake: true,
            velocity_px_s: Vec2::ZERO,
        }
    }

    #[test]
    fn keyed_lookup_matches_flat_list() {
        let snapshot = WorldSnapshot::new(
            false,
            Vec2::new(0.0, 9.8),
            StepConfig::default(),
            SolverIterations::default(),
            vec![body(1, 10.0), body(2, 20.0), body(3, 30.0)],
            42,
        );
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.body(BodyKey(2)).unwrap().position_px.x, 20.0);
        assert!(snapshot.body(BodyKey(99)).is_none());
        assert_eq!(snapshot.step_index, 42);
    }
}

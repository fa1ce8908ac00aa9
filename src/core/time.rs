use crate::api::state::PhysicsState;
use crate::api::types::BodyKey;
use crate::body::config::BodyConfig;
use crate::body::filter::CollisionFilter;
use crate::body::registration::BodyRegistration;
use crate::body::shape::BodyShape;
use crate::config::{ConfigError, WorldConfig};
use crate::core::engine::{FrameResult, PhysicsEngine};
use crate::core::units::UnitConverter;
use crate::events::WorldEvent;
use crate::snapshot::WorldSnapshot;

/// Tracks the host's monotonic frame timestamps and turns them into frame
/// deltas. The first frame after a (re)start yields no delta; a backward
/// clock jump yields zero.
pub(crate) struct FrameClock {
    last_timestamp_seconds: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_timestamp_seconds: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_timestamp_seconds = None;
    }

    /// Record a frame timestamp and return the delta since the previous one,
    /// or `None` when this is the first observed frame.
    pub fn frame_delta(&mut self, timestamp_seconds: f64) -> Option<f32> {
        let delta = self
            .last_timestamp_seconds
            .map(|last| (timestamp_seconds - last).max(0.0) as f32);
        self.last_timestamp_seconds = Some(timestamp_seconds);
        delta
    }
}

/// Frame-synchronized simulation container: the host-facing entry point.
///
/// The host invokes [`Simulation::on_frame`] once per UI frame callback with
/// a monotonic timestamp. Each call drains the state's pending commands in
/// FIFO order, advances the fixed-step loop, routes engine events to the
/// state's callback tables, and refreshes the latest snapshot whenever at
/// least one physics step ran. UI layout never blocks on any of this; the
/// whole frame turn is synchronous on the caller's thread.
pub struct Simulation {
    engine: PhysicsEngine,
    clock: FrameClock,
    events: Vec<WorldEvent>,
    latest_snapshot: Option<WorldSnapshot>,
}

impl Simulation {
    /// Build a container from a validated configuration. Configuration
    /// mistakes fail here, synchronously, never later in the frame loop.
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: PhysicsEngine::new(config)?,
            clock: FrameClock::new(),
            events: Vec::with_capacity(32),
            latest_snapshot: None,
        })
    }

    /// Advance one UI frame.
    ///
    /// While paused, clock and accumulator tracking are reset so that
    /// resuming never replays the wall-clock time that passed during the
    /// pause. The first frame after a (re)start only primes the clock.
    pub fn on_frame(&mut self, timestamp_seconds: f64, state: &mut PhysicsState) -> FrameResult {
        self.engine.set_paused(state.is_paused());
        if state.is_paused() {
            self.clock.reset();
            self.engine.reset_accumulator();
            return FrameResult {
                stepped: false,
                sub_steps: 0,
                bodies: self.engine.body_count(),
                contacts: self.engine.contact_count(),
            };
        }

        self.engine.set_step_config(state.step_config());

        let Some(delta_seconds) = self.clock.frame_delta(timestamp_seconds) else {
            return FrameResult {
                stepped: false,
                sub_steps: 0,
                bodies: self.engine.body_count(),
                contacts: self.engine.contact_count(),
            };
        };

        self.events.clear();
        for command in state.drain_commands() {
            self.engine.apply(command, &mut self.events);
        }

        let result = self.engine.step_frame(delta_seconds, &mut self.events);

        let events = std::mem::take(&mut self.events);
        for event in &events {
            state.dispatch(event);
        }
        self.events = events;

        if result.stepped {
            self.latest_snapshot = Some(self.engine.snapshot());
        }
        result
    }

    /// Snapshot refreshed after the most recent stepped frame.
    pub fn latest_snapshot(&self) -> Option<&WorldSnapshot> {
        self.latest_snapshot.as_ref()
    }

    /// Build a fresh snapshot on demand.
    pub fn snapshot_now(&self) -> WorldSnapshot {
        self.engine.snapshot()
    }

    pub fn units(&self) -> &UnitConverter {
        self.engine.units()
    }

    pub fn step_index(&self) -> u64 {
        self.engine.step_index()
    }

    pub fn body_count(&self) -> usize {
        self.engine.body_count()
    }

    // -- Body lifecycle (per layout pass) -----------------------------------

    /// Register or update a body with its freshly measured size.
    pub fn ensure_body(&mut self, registration: BodyRegistration, width_px: f32, height_px: f32) {
        self.engine.ensure_body(registration, width_px, height_px);
    }

    pub fn update_body_size(&mut self, key: BodyKey, width_px: f32, height_px: f32) {
        self.engine.update_body_size(key, width_px, height_px);
    }

    pub fn update_body_config(
        &mut self,
        key: BodyKey,
        config: BodyConfig,
        shape: BodyShape,
        filter: CollisionFilter,
    ) {
        self.engine.update_body_config(key, config, shape, filter);
    }

    pub fn remove_body(&mut self, key: BodyKey) {
        self.engine.remove_body(key);
    }

    /// Diff pass: drop every body whose key is absent from this frame's
    /// registration set.
    pub fn retain_bodies(&mut self, live_keys: &[BodyKey]) {
        self.engine.retain_bodies(live_keys);
    }

    /// Report the container's measured size; regenerates boundary walls when
    /// it changed.
    pub fn set_container_size(&mut self, width_px: f32, height_px: f32) {
        self.engine.update_boundaries(width_px, height_px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn quiet_config() -> WorldConfig {
        let mut config = WorldConfig::default();
        config.gravity_mps2 = Vec2::ZERO;
        config.boundaries.enabled = false;
        config
    }

    #[test]
    fn frame_clock_first_frame_has_no_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame_delta(10.0), None);
        let delta = clock.frame_delta(10.016).unwrap();
        assert!((delta - 0.016).abs() < 1e-6);
    }

    #[test]
    fn frame_clock_floors_backward_jumps_at_zero() {
        let mut clock = FrameClock::new();
        clock.frame_delta(10.0);
        assert_eq!(clock.frame_delta(9.0), Some(0.0));
        // Tracking continues from the jumped-to timestamp.
        let delta = clock.frame_delta(9.5).unwrap();
        assert!((delta - 0.5).abs() < 1e-6);
    }

    #[test]
    fn first_frame_only_primes_the_clock() {
        let mut simulation = Simulation::new(&quiet_config()).unwrap();
        let mut state = PhysicsState::default();
        let result = simulation.on_frame(0.0, &mut state);
        assert!(!result.stepped);
        assert_eq!(simulation.step_index(), 0);

        let result = simulation.on_frame(1.0 / 60.0, &mut state);
        assert!(result.stepped);
        assert_eq!(simulation.step_index(), 1);
    }

    #[test]
    fn pause_does_not_accumulate_wall_clock_time() {
        let mut simulation = Simulation::new(&quiet_config()).unwrap();
        let mut state = PhysicsState::default();
        simulation.on_frame(0.0, &mut state);
        simulation.on_frame(1.0 / 60.0, &mut state);
        let steps_before = simulation.step_index();

        state.pause();
        // Ten seconds of paused frames.
        for i in 0..600 {
            let result = simulation.on_frame(0.1 + i as f64 / 60.0, &mut state);
            assert!(!result.stepped);
        }
        assert_eq!(simulation.step_index(), steps_before);

        state.resume();
        // First resumed frame primes the clock again; the second steps once,
        // not six hundred times.
        simulation.on_frame(100.0, &mut state);
        let result = simulation.on_frame(100.0 + 1.0 / 60.0, &mut state);
        assert_eq!(result.sub_steps, 1);
        assert_eq!(simulation.step_index(), steps_before + 1);
    }

    #[test]
    fn stepped_frames_refresh_latest_snapshot() {
        let mut simulation = Simulation::new(&quiet_config()).unwrap();
        let mut state = PhysicsState::default();
        assert!(simulation.latest_snapshot().is_none());

        simulation.ensure_body(
            BodyRegistration::new(BodyKey(1))
                .with_config(BodyConfig::dynamic().with_position(Vec2::new(50.0, 50.0))),
            40.0,
            40.0,
        );
        simulation.on_frame(0.0, &mut state);
        assert!(simulation.latest_snapshot().is_none(), "clock priming only");

        simulation.on_frame(1.0 / 60.0, &mut state);
        let snapshot = simulation.latest_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.step_index, 1);
    }

    #[test]
    fn step_listener_sees_every_frame_event() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut simulation = Simulation::new(&quiet_config()).unwrap();
        let mut state = PhysicsState::default();
        let counts: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = counts.clone();
        state.set_step_listener(move |event| sink.borrow_mut().push(event.sub_steps));

        simulation.on_frame(0.0, &mut state);
        simulation.on_frame(1.0 / 60.0, &mut state);
        simulation.on_frame(2.0 / 60.0, &mut state);

        // The priming frame emits nothing; each subsequent frame emits one
        // step event.
        assert_eq!(*counts.borrow(), vec![1, 1]);
    }
}

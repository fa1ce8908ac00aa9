use std::collections::HashMap;

use glam::Vec2;

use crate::api::types::BodyKey;
use crate::body::registration::BodyCallbacks;
use crate::bridge::command::{Command, CommandQueue};
use crate::config::{DragConfig, SolverIterations, StepConfig};
use crate::events::{DragPhase, StepEvent, WorldEvent};

pub type StepListener = Box<dyn FnMut(&StepEvent)>;

/// UI-facing controller for a simulation container.
///
/// This is the primary surface for pausing/resuming, changing gravity and
/// step parameters, and queueing one-off actions. Command helpers are
/// fire-and-forget: the host's frame integration drains the queue once per
/// frame and applies everything in insertion order before stepping.
///
/// The state also owns the global per-key callback tables, the second
/// subscription point next to registration-scoped callbacks. Registering for
/// a key that already has callbacks replaces them (last-writer-wins).
pub struct PhysicsState {
    paused: bool,
    gravity_mps2: Vec2,
    step: StepConfig,
    initial_paused: bool,
    initial_gravity_mps2: Vec2,
    initial_step: StepConfig,
    queue: CommandQueue,
    callbacks: HashMap<BodyKey, BodyCallbacks>,
    on_step: Option<StepListener>,
}

impl PhysicsState {
    pub fn new(initial_paused: bool, initial_gravity_mps2: Vec2, initial_step: StepConfig) -> Self {
        Self {
            paused: initial_paused,
            gravity_mps2: initial_gravity_mps2,
            step: initial_step,
            initial_paused,
            initial_gravity_mps2,
            initial_step,
            queue: CommandQueue::new(),
            callbacks: HashMap::new(),
            on_step: None,
        }
    }

    // -- Pause ---------------------------------------------------------------

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pausing is cooperative: it takes effect on the next frame callback.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    // -- World controls ------------------------------------------------------

    pub fn gravity_mps2(&self) -> Vec2 {
        self.gravity_mps2
    }

    /// Update gravity and enqueue the change for the engine.
    pub fn set_gravity(&mut self, gravity_mps2: Vec2) {
        self.gravity_mps2 = gravity_mps2;
        self.enqueue(Command::SetGravity { gravity_mps2 });
    }

    pub fn step_config(&self) -> StepConfig {
        self.step
    }

    /// Replace the step configuration; the engine reads it on the next frame.
    pub fn update_step_config(&mut self, step: StepConfig) {
        self.step = step;
    }

    pub fn solver_iterations(&self) -> SolverIterations {
        self.step.solver_iterations()
    }

    pub fn set_solver_iterations(&mut self, velocity: u32, position: u32) {
        self.step.velocity_iterations = velocity;
        self.step.position_iterations = position;
    }

    /// Restore initial pause/gravity/step settings and request a full world
    /// reset from the engine.
    pub fn reset(&mut self) {
        self.paused = self.initial_paused;
        self.step = self.initial_step;
        self.enqueue(Command::ResetWorld);
        self.set_gravity(self.initial_gravity_mps2);
    }

    // -- Command helpers -----------------------------------------------------

    /// Queue a linear impulse, in container pixels.
    pub fn enqueue_impulse(&mut self, key: BodyKey, impulse_px: Vec2, wake: bool) {
        self.enqueue(Command::ApplyImpulse {
            key,
            impulse_px,
            wake,
        });
    }

    /// Queue a velocity override, in container px/s.
    pub fn enqueue_velocity(&mut self, key: BodyKey, velocity_px_s: Vec2) {
        self.enqueue(Command::SetVelocity {
            key,
            velocity_px_s,
        });
    }

    pub fn begin_drag(
        &mut self,
        key: BodyKey,
        grab_px: Vec2,
        pointer_id: Option<u64>,
        target_px: Vec2,
        drag: DragConfig,
    ) {
        self.enqueue(Command::BeginDrag {
            key,
            grab_px,
            pointer_id,
            target_px,
            drag,
        });
    }

    pub fn update_drag(&mut self, key: BodyKey, target_px: Vec2) {
        self.enqueue(Command::UpdateDrag { key, target_px });
    }

    pub fn end_drag(&mut self, key: BodyKey, release_velocity_px_s: Vec2) {
        self.enqueue(Command::EndDrag {
            key,
            release_velocity_px_s,
        });
    }

    pub fn cancel_drag(&mut self, key: BodyKey) {
        self.enqueue(Command::CancelDrag { key });
    }

    /// Generic extension point: append any command to the queue.
    pub fn enqueue(&mut self, command: Command) {
        self.queue.push(command);
    }

    /// Monotonic marker bumped on every enqueue; a cheap "pending work" probe.
    pub fn command_version(&self) -> u64 {
        self.queue.version()
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn drain_commands(&mut self) -> Vec<Command> {
        self.queue.drain()
    }

    // -- Callback tables -----------------------------------------------------

    pub fn register_callbacks(&mut self, key: BodyKey, callbacks: BodyCallbacks) {
        self.callbacks.insert(key, callbacks);
    }

    pub fn unregister_callbacks(&mut self, key: BodyKey) {
        self.callbacks.remove(&key);
    }

    pub fn set_step_listener(&mut self, listener: impl FnMut(&StepEvent) + 'static) {
        self.on_step = Some(Box::new(listener));
    }

    pub fn clear_step_listener(&mut self) {
        self.on_step = None;
    }

    /// Route one engine event to the matching global callback.
    pub(crate) fn dispatch(&mut self, event: &WorldEvent) {
        match event {
            WorldEvent::Collision(collision) => {
                if let Some(callback) = self
                    .callbacks
                    .get_mut(&collision.self_key)
                    .and_then(|c| c.on_collision.as_mut())
                {
                    callback(collision);
                }
            }
            WorldEvent::Step(step) => {
                if let Some(listener) = self.on_step.as_mut() {
                    listener(step);
                }
            }
            WorldEvent::Drag(drag) => {
                let Some(callbacks) = self.callbacks.get_mut(&drag.key) else {
                    return;
                };
                let callback = match drag.phase {
                    DragPhase::Start => callbacks.on_drag_start.as_mut(),
                    DragPhase::End | DragPhase::Cancel => callbacks.on_drag_end.as_mut(),
                    DragPhase::Move => None,
                };
                if let Some(callback) = callback {
                    callback(drag);
                }
            }
            WorldEvent::Sleep { key, sleeping } => {
                if let Some(callback) = self
                    .callbacks
                    .get_mut(key)
                    .and_then(|c| c.on_sleep_changed.as_mut())
                {
                    callback(*sleeping);
                }
            }
        }
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new(false, Vec2::new(0.0, 9.8), StepConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::events::CollisionEvent;
    use crate::events::CollisionPeer;

    #[test]
    fn set_gravity_mirrors_and_enqueues() {
        let mut state = PhysicsState::default();
        state.set_gravity(Vec2::ZERO);
        assert_eq!(state.gravity_mps2(), Vec2::ZERO);
        let drained = state.drain_commands();
        assert_eq!(
            drained,
            vec![Command::SetGravity {
                gravity_mps2: Vec2::ZERO
            }]
        );
    }

    #[test]
    fn reset_restores_initial_settings() {
        let mut state = PhysicsState::default();
        state.pause();
        state.set_gravity(Vec2::new(3.0, 0.0));
        state.set_solver_iterations(2, 1);
        state.drain_commands();

        state.reset();
        assert!(!state.is_paused());
        assert_eq!(state.gravity_mps2(), Vec2::new(0.0, 9.8));
        assert_eq!(state.step_config(), StepConfig::default());

        let drained = state.drain_commands();
        assert!(matches!(drained[0], Command::ResetWorld));
        assert!(matches!(drained[1], Command::SetGravity { .. }));
    }

    #[test]
    fn command_version_tracks_enqueues() {
        let mut state = PhysicsState::default();
        let v0 = state.command_version();
        state.enqueue_impulse(BodyKey(1), Vec2::new(10.0, 0.0), true);
        assert!(state.command_version() > v0);
        assert_eq!(state.pending_commands(), 1);
    }

    #[test]
    fn dispatch_routes_to_registered_callbacks() {
        let mut state = PhysicsState::default();
        let hits: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let mut callbacks = BodyCallbacks::new();
        let sink = hits.clone();
        callbacks.on_collision = Some(Box::new(move |_| sink.borrow_mut().push("collision")));
        let sink = hits.clone();
        callbacks.on_sleep_changed = Some(Box::new(move |_| sink.borrow_mut().push("sleep")));
        state.register_callbacks(BodyKey(1), callbacks);

        let sink = hits.clone();
        state.set_step_listener(move |_| sink.borrow_mut().push("step"));

        state.dispatch(&WorldEvent::Collision(CollisionEvent {
            self_key: BodyKey(1),
            other: CollisionPeer::Body(BodyKey(2)),
            impulse_px: 1.0,
            normal: Vec2::X,
        }));
        state.dispatch(&WorldEvent::Sleep {
            key: BodyKey(1),
            sleeping: true,
        });
        state.dispatch(&WorldEvent::Step(StepEvent {
            delta_seconds: 0.016,
            sub_steps: 1,
            step_index: 1,
        }));
        // Unknown key: silently ignored.
        state.dispatch(&WorldEvent::Sleep {
            key: BodyKey(99),
            sleeping: true,
        });

        assert_eq!(*hits.borrow(), vec!["collision", "sleep", "step"]);
    }

    #[test]
    fn duplicate_registration_is_last_writer_wins() {
        let mut state = PhysicsState::default();
        let hits: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));

        let mut first = BodyCallbacks::new();
        first.on_sleep_changed = Some(Box::new(|_| panic!("replaced callback must not fire")));
        state.register_callbacks(BodyKey(1), first);

        let mut second = BodyCallbacks::new();
        let sink = hits.clone();
        second.on_sleep_changed = Some(Box::new(move |_| *sink.borrow_mut() += 1));
        state.register_callbacks(BodyKey(1), second);

        state.dispatch(&WorldEvent::Sleep {
            key: BodyKey(1),
            sleeping: false,
        });
        assert_eq!(*hits.borrow(), 1);
    }
}

use std::collections::BTreeMap;

use glam::Vec2;
use log::debug;
use rapier2d::prelude::{ImpulseJointHandle, RigidBodyHandle};

use crate::api::types::BodyKey;
use crate::body::config::BodyConfig;
use crate::body::filter::CollisionFilter;
use crate::body::registration::{BodyCallbacks, BodyRegistration};
use crate::body::shape::BodyShape;
use crate::bridge::command::Command;
use crate::config::{BoundaryConfig, ConfigError, DragConfig, StepConfig, WorldConfig};
use crate::core::boundaries::BoundaryState;
use crate::core::units::UnitConverter;
use crate::core::world::{build_collider, OwnerTag, PhysicsWorld, RawContact};
use crate::events::{CollisionEvent, CollisionPeer, DragEvent, DragPhase, StepEvent, WorldEvent};
use crate::snapshot::{BodySnapshot, WorldSnapshot};

/// Tolerance on the accumulator comparison so floating-point drift cannot
/// stall the loop one hair short of a full fixed step.
const ACCUMULATOR_EPSILON: f32 = 1e-6;

/// Outcome of one frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameResult {
    /// Whether at least one fixed step executed.
    pub stepped: bool,
    /// Fixed steps executed this frame.
    pub sub_steps: u32,
    /// Live registered bodies (excludes walls and drag anchors).
    pub bodies: usize,
    /// Actively touching contact pairs after the frame.
    pub contacts: usize,
}

impl FrameResult {
    fn idle(bodies: usize, contacts: usize) -> Self {
        Self {
            stepped: false,
            sub_steps: 0,
            bodies,
            contacts,
        }
    }
}

/// Engine-owned record for one registered body.
struct BodyHandle {
    key: BodyKey,
    body: RigidBodyHandle,
    width_px: f32,
    height_px: f32,
    shape: BodyShape,
    config: BodyConfig,
    filter: CollisionFilter,
    callbacks: BodyCallbacks,
    /// Last observed awake flag, for edge-triggered sleep callbacks.
    was_awake: bool,
}

/// Transient record for one active pointer drag.
struct DragHandle {
    body: RigidBodyHandle,
    drag: DragConfig,
    last_target_m: Vec2,
    joint: Option<ImpulseJointHandle>,
    anchor: Option<RigidBodyHandle>,
}

fn clamp_delta(delta_seconds: f32, max_delta_seconds: f32) -> f32 {
    if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
        return 0.0;
    }
    delta_seconds.min(max_delta_seconds)
}

fn clamp_magnitude(v: Vec2, max: f32) -> Vec2 {
    let length = v.length();
    if length > max && length > 0.0 {
        v * (max / length)
    } else {
        v
    }
}

/// The integration core: owns the backend world, the body-handle and
/// drag-handle tables, the boundary walls, and the fixed-step accumulator.
///
/// Every operation here degrades to a no-op rather than failing: unknown
/// keys, degenerate geometry, and mutations while the world is stepping are
/// all normal transients of a live UI session, expected to self-correct on a
/// later frame.
pub(crate) struct PhysicsEngine {
    world: PhysicsWorld,
    units: UnitConverter,
    step: StepConfig,
    boundaries_config: BoundaryConfig,
    boundaries: BoundaryState,
    handles: BTreeMap<BodyKey, BodyHandle>,
    drags: BTreeMap<BodyKey, DragHandle>,
    paused: bool,
    accumulator_seconds: f32,
    step_index: u64,
    container_width_px: f32,
    container_height_px: f32,
    contacts_scratch: Vec<RawContact>,
}

impl PhysicsEngine {
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let units = UnitConverter::new(config.px_per_meter)?;
        Ok(Self {
            world: PhysicsWorld::new(config.gravity_mps2),
            units,
            step: config.step,
            boundaries_config: config.boundaries,
            boundaries: BoundaryState::new(),
            handles: BTreeMap::new(),
            drags: BTreeMap::new(),
            paused: false,
            accumulator_seconds: 0.0,
            step_index: 0,
            container_width_px: 0.0,
            container_height_px: 0.0,
            contacts_scratch: Vec::new(),
        })
    }

    pub fn units(&self) -> &UnitConverter {
        &self.units
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_step_config(&mut self, step: StepConfig) {
        self.step = step;
    }

    pub fn reset_accumulator(&mut self) {
        self.accumulator_seconds = 0.0;
    }

    #[cfg(test)]
    pub fn accumulator_seconds(&self) -> f32 {
        self.accumulator_seconds
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    #[cfg(test)]
    pub fn drag_count(&self) -> usize {
        self.drags.len()
    }

    pub fn contact_count(&self) -> usize {
        self.world.active_contact_count()
    }

    #[cfg(test)]
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    // -- Frame stepping ------------------------------------------------------

    /// Consume one frame's worth of real time: clamp it, pour it into the
    /// accumulator, and drain the accumulator in fixed steps (at most
    /// `max_sub_steps`). A step event is always emitted, with `sub_steps == 0`
    /// when no fixed step was due, so observers can tell "no work" from
    /// "never invoked".
    pub fn step_frame(&mut self, delta_seconds: f32, events: &mut Vec<WorldEvent>) -> FrameResult {
        let clamped = clamp_delta(delta_seconds, self.step.max_delta_seconds);
        if self.paused || clamped <= 0.0 {
            events.push(WorldEvent::Step(StepEvent {
                delta_seconds: clamped,
                sub_steps: 0,
                step_index: self.step_index,
            }));
            return FrameResult::idle(self.handles.len(), self.world.active_contact_count());
        }

        self.accumulator_seconds += clamped;
        let fixed = self.step.fixed_step_seconds();
        let mut sub_steps = 0u32;

        while self.accumulator_seconds + ACCUMULATOR_EPSILON >= fixed
            && sub_steps < self.step.max_sub_steps
        {
            self.world
                .step(fixed, self.step.velocity_iterations, self.step.position_iterations);
            self.accumulator_seconds -= fixed;
            sub_steps += 1;
            self.step_index += 1;

            let mut contacts = std::mem::take(&mut self.contacts_scratch);
            contacts.clear();
            self.world.collect_contacts(&mut contacts);
            self.dispatch_contacts(&contacts, events);
            self.contacts_scratch = contacts;

            self.dispatch_sleep_changes(events);
        }

        // Catch-up is bounded: when the cap cut the loop short with a full
        // step still pending, the remainder is discarded, not carried over.
        if sub_steps == self.step.max_sub_steps
            && self.accumulator_seconds + ACCUMULATOR_EPSILON >= fixed
        {
            self.accumulator_seconds = 0.0;
        }

        events.push(WorldEvent::Step(StepEvent {
            delta_seconds: clamped,
            sub_steps,
            step_index: self.step_index,
        }));

        FrameResult {
            stepped: sub_steps > 0,
            sub_steps,
            bodies: self.handles.len(),
            contacts: self.world.active_contact_count(),
        }
    }

    fn dispatch_contacts(&mut self, contacts: &[RawContact], events: &mut Vec<WorldEvent>) {
        for contact in contacts {
            let impulse_px = self.units.impulse_physics_to_px(contact.impulse);
            let pairings = [
                (contact.owner_a, contact.owner_b, contact.normal),
                (contact.owner_b, contact.owner_a, -contact.normal),
            ];
            for (self_owner, other_owner, normal) in pairings {
                let OwnerTag::Body(self_key) = self_owner else {
                    continue;
                };
                let other = match other_owner {
                    OwnerTag::Body(key) => CollisionPeer::Body(key),
                    OwnerTag::Wall(side) => CollisionPeer::Wall(side),
                    OwnerTag::DragAnchor => continue,
                };
                let event = CollisionEvent {
                    self_key,
                    other,
                    impulse_px,
                    normal,
                };
                if let Some(handle) = self.handles.get_mut(&self_key) {
                    if let Some(callback) = handle.callbacks.on_collision.as_mut() {
                        callback(&event);
                    }
                }
                events.push(WorldEvent::Collision(event));
            }
        }
    }

    fn dispatch_sleep_changes(&mut self, events: &mut Vec<WorldEvent>) {
        for (key, handle) in self.handles.iter_mut() {
            let awake = self.world.is_awake(handle.body);
            if awake == handle.was_awake {
                continue;
            }
            handle.was_awake = awake;
            let sleeping = !awake;
            if let Some(callback) = handle.callbacks.on_sleep_changed.as_mut() {
                callback(sleeping);
            }
            events.push(WorldEvent::Sleep {
                key: *key,
                sleeping,
            });
        }
    }

    // -- Command application -------------------------------------------------

    pub fn apply(&mut self, command: Command, events: &mut Vec<WorldEvent>) {
        match command {
            Command::ApplyImpulse {
                key,
                impulse_px,
                wake,
            } => self.apply_impulse(key, impulse_px, wake),
            Command::SetVelocity {
                key,
                velocity_px_s,
            } => self.apply_velocity(key, velocity_px_s),
            Command::BeginDrag {
                key,
                grab_px,
                target_px,
                drag,
                ..
            } => self.begin_drag(key, grab_px, target_px, drag, events),
            Command::UpdateDrag { key, target_px } => self.update_drag(key, target_px, events),
            Command::EndDrag {
                key,
                release_velocity_px_s,
            } => self.end_drag(key, release_velocity_px_s, events),
            Command::CancelDrag { key } => self.cancel_drag(key, events),
            Command::SetGravity { gravity_mps2 } => self.set_gravity(gravity_mps2),
            Command::ResetWorld => self.reset_world(),
        }
    }

    fn apply_impulse(&mut self, key: BodyKey, impulse_px: Vec2, wake: bool) {
        let Some(body) = self.handles.get(&key).map(|h| h.body) else {
            return;
        };
        let awake = self.world.is_awake(body);
        if wake {
            self.world.wake(body);
        } else if !awake {
            return;
        }
        let impulse_m = self.units.impulse_px_to_physics(impulse_px);
        self.world.apply_impulse(body, impulse_m);
    }

    fn apply_velocity(&mut self, key: BodyKey, velocity_px_s: Vec2) {
        let Some(body) = self.handles.get(&key).map(|h| h.body) else {
            return;
        };
        let velocity_m = self.units.velocity_px_to_mps(velocity_px_s);
        self.world.set_linvel(body, velocity_m);
    }

    fn set_gravity(&mut self, gravity_mps2: Vec2) {
        if self.world.is_locked() {
            return;
        }
        self.world.set_gravity(gravity_mps2);
    }

    // -- Drag ----------------------------------------------------------------

    fn begin_drag(
        &mut self,
        key: BodyKey,
        grab_px: Vec2,
        target_px: Vec2,
        drag: DragConfig,
        events: &mut Vec<WorldEvent>,
    ) {
        if self.world.is_locked() {
            return;
        }
        let Some(body) = self.handles.get(&key).map(|h| h.body) else {
            return;
        };
        // A begin on an already-dragging key replaces the prior drag; its
        // joint is destroyed before the new one exists.
        self.destroy_drag(key);

        let target_m = self.units.px_vec_to_meters(target_px);
        let handle = if drag.joint_style {
            let Some((anchor, joint)) = self.world.create_drag_spring(body, target_m, &drag)
            else {
                return;
            };
            DragHandle {
                body,
                drag,
                last_target_m: target_m,
                joint: Some(joint),
                anchor: Some(anchor),
            }
        } else {
            self.apply_direct_drag(body, target_m, &drag);
            DragHandle {
                body,
                drag,
                last_target_m: target_m,
                joint: None,
                anchor: None,
            }
        };

        self.world.wake(body);
        self.drags.insert(key, handle);
        self.emit_drag(key, DragPhase::Start, grab_px, target_px, Vec2::ZERO, events);
    }

    fn update_drag(&mut self, key: BodyKey, target_px: Vec2, events: &mut Vec<WorldEvent>) {
        let target_m = self.units.px_vec_to_meters(target_px);
        let Some((body, anchor, drag)) = self.drags.get_mut(&key).map(|handle| {
            handle.last_target_m = target_m;
            (handle.body, handle.anchor, handle.drag)
        }) else {
            return;
        };

        match anchor {
            Some(anchor) => self.world.set_drag_target(anchor, target_m),
            None => self.apply_direct_drag(body, target_m, &drag),
        }
        self.world.wake(body);
        self.emit_drag(key, DragPhase::Move, target_px, target_px, Vec2::ZERO, events);
    }

    fn end_drag(
        &mut self,
        key: BodyKey,
        release_velocity_px_s: Vec2,
        events: &mut Vec<WorldEvent>,
    ) {
        let Some(handle) = self.drags.remove(&key) else {
            return;
        };
        self.destroy_drag_resources(&handle);

        let release = clamp_magnitude(release_velocity_px_s, handle.drag.max_fling_velocity_px_s);
        self.world
            .set_linvel(handle.body, self.units.velocity_px_to_mps(release));
        self.world.wake(handle.body);

        let target_px = self.units.meters_vec_to_px(handle.last_target_m);
        self.emit_drag(key, DragPhase::End, target_px, target_px, release, events);
    }

    fn cancel_drag(&mut self, key: BodyKey, events: &mut Vec<WorldEvent>) {
        let Some(handle) = self.drags.remove(&key) else {
            return;
        };
        self.destroy_drag_resources(&handle);
        let target_px = self.units.meters_vec_to_px(handle.last_target_m);
        self.emit_drag(key, DragPhase::Cancel, target_px, target_px, Vec2::ZERO, events);
    }

    fn destroy_drag(&mut self, key: BodyKey) {
        if let Some(handle) = self.drags.remove(&key) {
            self.destroy_drag_resources(&handle);
        }
    }

    fn destroy_drag_resources(&mut self, handle: &DragHandle) {
        if self.world.is_locked() {
            return;
        }
        if let Some(joint) = handle.joint {
            self.world.remove_joint(joint);
        }
        if let Some(anchor) = handle.anchor {
            self.world.remove_body(anchor);
        }
    }

    fn apply_direct_drag(&mut self, body: RigidBodyHandle, target_m: Vec2, drag: &DragConfig) {
        let (position_m, _) = self.world.position(body);
        let stiffness = drag.frequency_hz.max(1.0);
        self.world
            .set_linvel(body, (target_m - position_m) * stiffness);
    }

    fn emit_drag(
        &mut self,
        key: BodyKey,
        phase: DragPhase,
        pointer_px: Vec2,
        target_px: Vec2,
        velocity_px_s: Vec2,
        events: &mut Vec<WorldEvent>,
    ) {
        let event = DragEvent {
            key,
            phase,
            pointer_px,
            target_px,
            velocity_px_s,
        };
        if let Some(handle) = self.handles.get_mut(&key) {
            let callback = match phase {
                DragPhase::Start => handle.callbacks.on_drag_start.as_mut(),
                DragPhase::End | DragPhase::Cancel => handle.callbacks.on_drag_end.as_mut(),
                DragPhase::Move => None,
            };
            if let Some(callback) = callback {
                callback(&event);
            }
        }
        events.push(WorldEvent::Drag(event));
    }

    // -- Body lifecycle ------------------------------------------------------

    /// Create or update the body for a registration, given the element's
    /// measured size. No-op while a measurement is missing (≤ 0) or the
    /// world is stepping; the caller retries next frame.
    pub fn ensure_body(
        &mut self,
        registration: BodyRegistration,
        width_px: f32,
        height_px: f32,
    ) {
        if width_px <= 0.0 || height_px <= 0.0 || self.world.is_locked() {
            return;
        }
        let key = registration.key;
        if !self.handles.contains_key(&key) {
            if let Some(handle) = self.create_body_handle(registration, width_px, height_px) {
                self.handles.insert(key, handle);
            }
            return;
        }

        let BodyRegistration {
            config,
            shape,
            filter,
            callbacks,
            ..
        } = registration;

        let Some(existing) = self.handles.get_mut(&key) else {
            return;
        };
        let (body, rebuild) = {
            let rebuild = existing.width_px != width_px
                || existing.height_px != height_px
                || existing.shape != shape
                || existing.config != config
                || existing.filter != filter;
            existing.width_px = width_px;
            existing.height_px = height_px;
            existing.shape = shape;
            existing.config = config;
            existing.filter = filter;
            existing.callbacks = callbacks;
            (existing.body, rebuild)
        };

        self.world.apply_config(body, &config);
        if rebuild {
            self.rebuild_fixture(key);
        }
    }

    /// Rebuild the fixture only if the measured size actually changed.
    pub fn update_body_size(&mut self, key: BodyKey, width_px: f32, height_px: f32) {
        if width_px <= 0.0 || height_px <= 0.0 || self.world.is_locked() {
            return;
        }
        let Some(existing) = self.handles.get_mut(&key) else {
            return;
        };
        if existing.width_px == width_px && existing.height_px == height_px {
            return;
        }
        existing.width_px = width_px;
        existing.height_px = height_px;
        self.rebuild_fixture(key);
    }

    /// Same rebuild-if-changed discipline as `ensure_body`, without a size
    /// change.
    pub fn update_body_config(
        &mut self,
        key: BodyKey,
        config: BodyConfig,
        shape: BodyShape,
        filter: CollisionFilter,
    ) {
        if self.world.is_locked() {
            return;
        }
        let Some(existing) = self.handles.get_mut(&key) else {
            return;
        };
        let rebuild =
            existing.shape != shape || existing.config != config || existing.filter != filter;
        existing.config = config;
        existing.shape = shape;
        existing.filter = filter;
        let body = existing.body;

        self.world.apply_config(body, &config);
        if rebuild {
            self.rebuild_fixture(key);
        }
    }

    pub fn remove_body(&mut self, key: BodyKey) {
        if self.world.is_locked() {
            return;
        }
        self.destroy_drag(key);
        let Some(handle) = self.handles.remove(&key) else {
            return;
        };
        self.world.remove_body(handle.body);
    }

    /// Diff helper for declarative hosts: drop every handle whose key is not
    /// in the current frame's registration set.
    pub fn retain_bodies(&mut self, live_keys: &[BodyKey]) {
        if self.world.is_locked() {
            return;
        }
        let stale: Vec<BodyKey> = self
            .handles
            .keys()
            .filter(|key| !live_keys.contains(key))
            .copied()
            .collect();
        for key in stale {
            self.remove_body(key);
        }
    }

    pub fn update_boundaries(&mut self, width_px: f32, height_px: f32) {
        self.container_width_px = width_px;
        self.container_height_px = height_px;
        if width_px <= 0.0 || height_px <= 0.0 {
            self.boundaries.destroy(&mut self.world);
            return;
        }
        self.boundaries.update(
            &mut self.world,
            width_px,
            height_px,
            &self.boundaries_config,
            &self.units,
        );
    }

    fn create_body_handle(
        &mut self,
        registration: BodyRegistration,
        width_px: f32,
        height_px: f32,
    ) -> Option<BodyHandle> {
        let body = self
            .world
            .create_body(OwnerTag::Body(registration.key), &registration.config, &self.units);
        let Some(collider) = build_collider(
            &registration.shape,
            width_px,
            height_px,
            &registration.config,
            &registration.filter,
            &self.units,
        ) else {
            // Degenerate geometry is a normal transient (first layout pass);
            // abandon silently and let the next measurement retry.
            self.world.remove_body(body);
            debug!("abandoned body creation for {:?}: degenerate geometry", registration.key);
            return None;
        };
        self.world.attach_collider(collider, body);
        let was_awake = self.world.is_awake(body);
        Some(BodyHandle {
            key: registration.key,
            body,
            width_px,
            height_px,
            shape: registration.shape,
            config: registration.config,
            filter: registration.filter,
            callbacks: registration.callbacks,
            was_awake,
        })
    }

    fn rebuild_fixture(&mut self, key: BodyKey) {
        if self.world.is_locked() {
            return;
        }
        let Some((body, shape, width_px, height_px, config, filter)) =
            self.handles.get(&key).map(|handle| {
                (
                    handle.body,
                    handle.shape.clone(),
                    handle.width_px,
                    handle.height_px,
                    handle.config,
                    handle.filter,
                )
            })
        else {
            return;
        };
        self.world.clear_colliders(body);
        let Some(collider) = build_collider(&shape, width_px, height_px, &config, &filter, &self.units)
        else {
            debug!("abandoned fixture rebuild for {:?}: degenerate geometry", key);
            return;
        };
        self.world.attach_collider(collider, body);
    }

    fn reset_world(&mut self) {
        if self.world.is_locked() {
            return;
        }
        let drag_keys: Vec<BodyKey> = self.drags.keys().copied().collect();
        for key in drag_keys {
            self.destroy_drag(key);
        }
        for (_, handle) in std::mem::take(&mut self.handles) {
            self.world.remove_body(handle.body);
        }
        self.boundaries.destroy(&mut self.world);
        self.boundaries.forget();

        self.accumulator_seconds = 0.0;
        self.step_index = 0;
        debug!("world reset");

        if self.container_width_px > 0.0 && self.container_height_px > 0.0 {
            self.update_boundaries(self.container_width_px, self.container_height_px);
        }
    }

    // -- Snapshot ------------------------------------------------------------

    /// Export a render-ready view of every live body, by value.
    pub fn snapshot(&self) -> WorldSnapshot {
        let bodies: Vec<BodySnapshot> = self
            .handles
            .values()
            .map(|handle| {
                let (position_m, rotation_rad) = self.world.position(handle.body);
                BodySnapshot {
                    key: handle.key,
                    position_px: self.units.meters_vec_to_px(position_m),
                    rotation_degrees: self.units.radians_to_degrees(rotation_rad),
                    awake: self.world.is_awake(handle.body),
                    velocity_px_s: self.units.velocity_mps_to_px(self.world.linvel(handle.body)),
                }
            })
            .collect();
        WorldSnapshot::new(
            self.paused,
            self.world.gravity(),
            self.step,
            self.step.solver_iterations(),
            bodies,
            self.step_index,
        )
    }
}

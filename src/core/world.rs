use std::num::NonZeroUsize;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::na;
use rapier2d::prelude::{
    ActiveEvents, ActiveHooks, CCDSolver, Collider, ColliderBuilder, ColliderHandle, ColliderSet,
    CollisionEvent as RawCollisionEvent, ContactPair, DefaultBroadPhase, EventHandler, Group,
    ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager,
    LockedAxes, MultibodyJointSet, NarrowPhase, PairFilterContext, PhysicsHooks, PhysicsPipeline,
    QueryPipeline, RigidBodyActivation, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
    RigidBodyType, SolverFlags, SpringJointBuilder,
};

use crate::api::types::BodyKey;
use crate::body::config::{BodyConfig, BodyType};
use crate::body::filter::CollisionFilter;
use crate::body::shape::{normalize_winding, BodyShape};
use crate::config::DragConfig;
use crate::core::boundaries::WallSide;
use crate::core::units::UnitConverter;

// ---------------------------------------------------------------------------
// Conversion helpers (private) — glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &na::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
        }
    }
}

// ---------------------------------------------------------------------------
// Owner tagging via rigid-body user_data
// ---------------------------------------------------------------------------

/// What a backend body belongs to, recovered from its `user_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnerTag {
    Body(BodyKey),
    Wall(WallSide),
    /// Invisible anchor body backing a drag joint; never surfaces in events.
    DragAnchor,
}

const TAG_KIND_BODY: u128 = 1;
const TAG_KIND_WALL: u128 = 2;
const TAG_KIND_ANCHOR: u128 = 3;

fn encode_tag(tag: OwnerTag) -> u128 {
    match tag {
        OwnerTag::Body(key) => (TAG_KIND_BODY << 64) | key.0 as u128,
        OwnerTag::Wall(side) => (TAG_KIND_WALL << 64) | side as u128,
        OwnerTag::DragAnchor => TAG_KIND_ANCHOR << 64,
    }
}

fn decode_tag(user_data: u128) -> Option<OwnerTag> {
    let payload = user_data as u64;
    match user_data >> 64 {
        TAG_KIND_BODY => Some(OwnerTag::Body(BodyKey(payload))),
        TAG_KIND_WALL => WallSide::from_index(payload as usize).map(OwnerTag::Wall),
        TAG_KIND_ANCHOR => Some(OwnerTag::DragAnchor),
        _ => None,
    }
}

// Collider user_data carries the Box2D-style group index for the pair filter
// hook, sign-extended through the low 64 bits.
fn encode_group(group_index: i32) -> u128 {
    (group_index as i64) as u64 as u128
}

fn decode_group(user_data: u128) -> i32 {
    user_data as u64 as i64 as i32
}

/// Pair filter implementing the group-index override: fixtures sharing a
/// positive group always collide, fixtures sharing a negative group never do,
/// everything else falls through to category/mask filtering.
struct GroupIndexHooks;

impl PhysicsHooks for GroupIndexHooks {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let g1 = decode_group(context.colliders[context.collider1].user_data);
        let g2 = decode_group(context.colliders[context.collider2].user_data);
        if g1 != 0 && g1 == g2 {
            return if g1 > 0 {
                Some(SolverFlags::COMPUTE_IMPULSES)
            } else {
                None
            };
        }
        Some(SolverFlags::COMPUTE_IMPULSES)
    }
}

// ---------------------------------------------------------------------------
// Event collection
// ---------------------------------------------------------------------------

/// One contact observation handed to the engine for event fan-out.
///
/// `impulse` is zero for begin/end contacts and the summed absolute normal
/// impulse (physics units) for post-solve samples. `normal` points from
/// `owner_a` toward `owner_b` in world space; zero when no manifold survives
/// (e.g. an end-contact on separated shapes).
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawContact {
    pub owner_a: OwnerTag,
    pub owner_b: OwnerTag,
    pub impulse: f32,
    pub normal: Vec2,
}

struct DirectEventCollector {
    collisions: Mutex<Vec<RawCollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<RawCollisionEvent> {
        std::mem::take(&mut *self.collisions.lock().unwrap())
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: RawCollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions.lock().unwrap().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Impulses are harvested from the narrow phase after each step.
    }
}

// ---------------------------------------------------------------------------
// Fixture building
// ---------------------------------------------------------------------------

/// Build a collider from a shape descriptor and the element's measured size.
///
/// Returns `None` on degenerate geometry (non-positive half-extents or
/// radius, near-zero polygon area, oversized vertex list); the caller
/// abandons the body operation for this attempt.
pub(crate) fn build_collider(
    shape: &BodyShape,
    width_px: f32,
    height_px: f32,
    config: &BodyConfig,
    filter: &CollisionFilter,
    units: &UnitConverter,
) -> Option<Collider> {
    if width_px <= 0.0 || height_px <= 0.0 {
        return None;
    }

    let builder = match shape {
        BodyShape::Box => {
            let half_width_m = units.px_to_meters(width_px) * 0.5;
            let half_height_m = units.px_to_meters(height_px) * 0.5;
            if half_width_m <= 0.0 || half_height_m <= 0.0 {
                return None;
            }
            ColliderBuilder::cuboid(half_width_m, half_height_m)
        }
        BodyShape::Circle { radius_px } => {
            let radius_px = radius_px.unwrap_or_else(|| width_px.min(height_px) * 0.5);
            let radius_m = units.px_to_meters(radius_px);
            if radius_m <= 0.0 {
                return None;
            }
            ColliderBuilder::ball(radius_m)
        }
        BodyShape::Polygon { .. } => {
            let vertices_px = shape.polygon_vertices_px(width_px, height_px)?;
            let vertices_m: Vec<Vec2> = vertices_px
                .iter()
                .map(|v| units.px_vec_to_meters(*v))
                .collect();
            let vertices_m = normalize_winding(vertices_m)?;
            let points: Vec<na::Point2<f32>> = vertices_m
                .iter()
                .map(|v| na::Point2::new(v.x, v.y))
                .collect();
            ColliderBuilder::convex_hull(&points)?
        }
    };

    let mut builder = builder
        .density(config.density)
        .friction(config.friction)
        .restitution(config.restitution)
        .collision_groups(InteractionGroups::new(
            Group::from_bits_truncate(filter.category_bits),
            Group::from_bits_truncate(filter.mask_bits),
        ))
        .user_data(encode_group(filter.group_index))
        .active_events(ActiveEvents::COLLISION_EVENTS);
    if filter.group_index != 0 {
        builder = builder.active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS);
    }
    Some(builder.build())
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps the rigid-body backend behind the minimal contract the engine
/// needs: create/destroy bodies and fixtures, joints, impulses, queries, and
/// `step(dt, velocity_iters, position_iters)`.
///
/// The world is non-reentrant: it reports itself as locked while a step is
/// in flight, and callers must not perform structural mutation during that
/// window. In this single-threaded embedding the flag is the contract's
/// bookkeeping, enforced by the lifecycle layer checking it before every
/// structural change.
pub(crate) struct PhysicsWorld {
    gravity: na::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    hooks: GroupIndexHooks,
    event_collector: DirectEventCollector,
    locked: bool,
}

impl PhysicsWorld {
    pub fn new(gravity_mps2: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity_mps2),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            hooks: GroupIndexHooks,
            event_collector: DirectEventCollector::new(),
            locked: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[cfg(test)]
    pub fn force_lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn gravity(&self) -> Vec2 {
        na_to_vec2(&self.gravity)
    }

    pub fn set_gravity(&mut self, gravity_mps2: Vec2) {
        self.gravity = vec2_to_na(gravity_mps2);
    }

    /// Advance the simulation by one fixed step.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        self.integration_parameters.dt = dt;
        if let Some(iterations) = NonZeroUsize::new(velocity_iterations as usize) {
            self.integration_parameters.num_solver_iterations = iterations;
        }
        self.integration_parameters.num_internal_pgs_iterations =
            (position_iterations as usize).max(1);

        self.locked = true;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.hooks,
            &self.event_collector,
        );
        self.locked = false;
    }

    // -- Body lifecycle --

    /// Create a rigid body from the registration config. The owner tag is
    /// stored in `user_data` so contacts can be mapped back to keys.
    pub fn create_body(
        &mut self,
        tag: OwnerTag,
        config: &BodyConfig,
        units: &UnitConverter,
    ) -> RigidBodyHandle {
        let position_m = units.px_vec_to_meters(config.position_px);
        let body = RigidBodyBuilder::new(config.body_type.to_rapier())
            .translation(vec2_to_na(position_m))
            .rotation(units.degrees_to_radians(config.rotation_degrees))
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .gravity_scale(config.gravity_scale)
            .locked_axes(if config.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            })
            .ccd_enabled(config.bullet)
            .can_sleep(config.allow_sleep)
            .user_data(encode_tag(tag))
            .build();
        self.bodies.insert(body)
    }

    /// Re-apply the cheap (non-fixture) config fields to an existing body.
    pub fn apply_config(&mut self, handle: RigidBodyHandle, config: &BodyConfig) {
        let Some(body) = self.bodies.get_mut(handle) else {
            return;
        };
        body.set_body_type(config.body_type.to_rapier(), true);
        body.enable_ccd(config.bullet);
        body.set_locked_axes(
            if config.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            },
            true,
        );
        *body.activation_mut() = if config.allow_sleep {
            RigidBodyActivation::default()
        } else {
            RigidBodyActivation::cannot_sleep()
        };
        body.set_gravity_scale(config.gravity_scale, true);
        body.set_linear_damping(config.linear_damping);
        body.set_angular_damping(config.angular_damping);
    }

    pub fn attach_collider(
        &mut self,
        collider: Collider,
        body: RigidBodyHandle,
    ) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    /// Detach and destroy every fixture on the body, leaving the body alive.
    pub fn clear_colliders(&mut self, body: RigidBodyHandle) {
        let handles: Vec<ColliderHandle> = self
            .bodies
            .get(body)
            .map(|b| b.colliders().to_vec())
            .unwrap_or_default();
        for handle in handles {
            self.colliders
                .remove(handle, &mut self.island_manager, &mut self.bodies, true);
        }
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    #[cfg(test)]
    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.get(handle).is_some()
    }

    // -- Motion --

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse_m: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(vec2_to_na(impulse_m), true);
        }
    }

    pub fn set_linvel(&mut self, handle: RigidBodyHandle, velocity_mps: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vec2_to_na(velocity_mps), true);
        }
    }

    pub fn linvel(&self, handle: RigidBodyHandle) -> Vec2 {
        self.bodies
            .get(handle)
            .map(|b| na_to_vec2(b.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Position in meters and rotation in radians.
    pub fn position(&self, handle: RigidBodyHandle) -> (Vec2, f32) {
        self.bodies
            .get(handle)
            .map(|b| {
                let iso = b.position();
                (
                    Vec2::new(iso.translation.x, iso.translation.y),
                    iso.rotation.angle(),
                )
            })
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    pub fn mass(&self, handle: RigidBodyHandle) -> f32 {
        self.bodies.get(handle).map(|b| b.mass()).unwrap_or(0.0)
    }

    pub fn is_awake(&self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .get(handle)
            .map(|b| !b.is_sleeping())
            .unwrap_or(false)
    }

    pub fn wake(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.wake_up(true);
        }
    }

    // -- Drag joints --

    /// Create the spring constraint backing a joint-style drag: an invisible
    /// kinematic anchor at the target plus a zero rest-length spring to the
    /// body. Spring constants follow the mouse-joint model, scaled by the
    /// body's mass floored at 1.0; `max_force × mass` caps the stiffness.
    pub fn create_drag_spring(
        &mut self,
        body: RigidBodyHandle,
        target_m: Vec2,
        drag: &DragConfig,
    ) -> Option<(RigidBodyHandle, ImpulseJointHandle)> {
        if self.locked {
            return None;
        }
        let mass = self.bodies.get(body)?.mass().max(1.0);
        let omega = std::f32::consts::TAU * drag.frequency_hz;
        let stiffness = (mass * omega * omega).min(drag.max_force * mass);
        let damping = 2.0 * mass * drag.damping_ratio * omega;

        let anchor_body = RigidBodyBuilder::kinematic_position_based()
            .translation(vec2_to_na(target_m))
            .user_data(encode_tag(OwnerTag::DragAnchor))
            .build();
        let anchor = self.bodies.insert(anchor_body);

        let joint = SpringJointBuilder::new(0.0, stiffness, damping)
            .local_anchor1(na::Point2::new(0.0, 0.0))
            .local_anchor2(na::Point2::new(0.0, 0.0))
            .build();
        let joint_handle = self.impulse_joints.insert(anchor, body, joint, true);
        Some((anchor, joint_handle))
    }

    /// Retarget a drag anchor. The kinematic target gives the anchor a
    /// velocity over the next step, which carries into the spring.
    pub fn set_drag_target(&mut self, anchor: RigidBodyHandle, target_m: Vec2) {
        if let Some(body) = self.bodies.get_mut(anchor) {
            body.set_next_kinematic_translation(vec2_to_na(target_m));
        }
    }

    pub fn remove_joint(&mut self, handle: ImpulseJointHandle) {
        self.impulse_joints.remove(handle, true);
    }

    // -- Counters --

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    pub fn active_contact_count(&self) -> usize {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .count()
    }

    // -- Contact harvesting --

    fn owner_of_collider(&self, handle: ColliderHandle) -> Option<OwnerTag> {
        let collider = self.colliders.get(handle)?;
        let body = self.bodies.get(collider.parent()?)?;
        decode_tag(body.user_data)
    }

    fn manifold_normal(&self, a: ColliderHandle, b: ColliderHandle) -> Vec2 {
        self.narrow_phase
            .contact_pair(a, b)
            .and_then(|pair| pair.manifolds.first())
            .map(|manifold| na_to_vec2(&manifold.data.normal))
            .unwrap_or(Vec2::ZERO)
    }

    /// Collect the contact observations produced by the latest step:
    /// begin/end events (impulse 0) first, then post-solve impulse samples
    /// for every actively touching pair.
    pub fn collect_contacts(&mut self, out: &mut Vec<RawContact>) {
        for event in self.event_collector.drain() {
            let (h1, h2) = match event {
                RawCollisionEvent::Started(h1, h2, _) => (h1, h2),
                RawCollisionEvent::Stopped(h1, h2, _) => (h1, h2),
            };
            let (Some(owner_a), Some(owner_b)) =
                (self.owner_of_collider(h1), self.owner_of_collider(h2))
            else {
                continue;
            };
            out.push(RawContact {
                owner_a,
                owner_b,
                impulse: 0.0,
                normal: self.manifold_normal(h1, h2),
            });
        }

        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let (Some(owner_a), Some(owner_b)) = (
                self.owner_of_collider(pair.collider1),
                self.owner_of_collider(pair.collider2),
            ) else {
                continue;
            };
            // Sleeping stacks keep stale warm-start impulses; skip them so a
            // resting pile does not re-report the same contact every step.
            let asleep = |h: ColliderHandle| {
                self.colliders
                    .get(h)
                    .and_then(|c| c.parent())
                    .and_then(|b| self.bodies.get(b))
                    .map(|b| b.is_sleeping())
                    .unwrap_or(true)
            };
            if asleep(pair.collider1) && asleep(pair.collider2) {
                continue;
            }
            let mut impulse = 0.0;
            let mut normal = Vec2::ZERO;
            for manifold in &pair.manifolds {
                if normal == Vec2::ZERO {
                    normal = na_to_vec2(&manifold.data.normal);
                }
                for point in &manifold.points {
                    impulse += point.data.impulse.abs();
                }
            }
            out.push(RawContact {
                owner_a,
                owner_b,
                impulse,
                normal,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> UnitConverter {
        UnitConverter::new(100.0).unwrap()
    }

    fn dynamic_box(world: &mut PhysicsWorld, key: u64, x_px: f32, y_px: f32) -> RigidBodyHandle {
        let config = BodyConfig::dynamic().with_position(Vec2::new(x_px, y_px));
        let handle = world.create_body(OwnerTag::Body(BodyKey(key)), &config, &units());
        let collider = build_collider(
            &BodyShape::Box,
            50.0,
            50.0,
            &config,
            &CollisionFilter::default(),
            &units(),
        )
        .unwrap();
        world.attach_collider(collider, handle);
        handle
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let handle = dynamic_box(&mut world, 1, 0.0, 0.0);
        assert_eq!(world.body_count(), 1);
        world.remove_body(handle);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn gravity_pulls_dynamic_body_down() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 9.8));
        let handle = dynamic_box(&mut world, 1, 0.0, 0.0);
        let (start, _) = world.position(handle);
        for _ in 0..30 {
            world.step(1.0 / 60.0, 8, 3);
        }
        let (end, _) = world.position(handle);
        assert!(end.y > start.y, "body should fall: {} -> {}", start.y, end.y);
    }

    #[test]
    fn impulse_changes_velocity() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let handle = dynamic_box(&mut world, 1, 0.0, 0.0);
        world.apply_impulse(handle, Vec2::new(1.0, 0.0));
        world.step(1.0 / 60.0, 8, 3);
        let velocity = world.linvel(handle);
        assert!(velocity.x > 0.0, "expected +x velocity, got {:?}", velocity);
        assert!(velocity.y.abs() < 1e-4);
    }

    #[test]
    fn degenerate_shapes_build_no_collider() {
        let config = BodyConfig::default();
        let filter = CollisionFilter::default();
        assert!(build_collider(&BodyShape::Box, 0.0, 50.0, &config, &filter, &units()).is_none());
        assert!(
            build_collider(&BodyShape::circle_with_radius(0.0), 50.0, 50.0, &config, &filter, &units())
                .is_none()
        );

        let line = BodyShape::Polygon {
            vertices: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)],
            space: crate::body::shape::VertexSpace::Pixels,
        };
        assert!(build_collider(&line, 50.0, 50.0, &config, &filter, &units()).is_none());
    }

    #[test]
    fn polygon_collider_accepts_clockwise_vertices() {
        let config = BodyConfig::default();
        let filter = CollisionFilter::default();
        let cw = BodyShape::Polygon {
            vertices: vec![
                Vec2::new(-0.5, -0.5),
                Vec2::new(-0.5, 0.5),
                Vec2::new(0.5, 0.5),
                Vec2::new(0.5, -0.5),
            ],
            space: crate::body::shape::VertexSpace::Normalized,
        };
        assert!(build_collider(&cw, 80.0, 80.0, &config, &filter, &units()).is_some());
    }

    #[test]
    fn owner_tags_round_trip() {
        for tag in [
            OwnerTag::Body(BodyKey(0)),
            OwnerTag::Body(BodyKey(u64::MAX)),
            OwnerTag::Wall(WallSide::Left),
            OwnerTag::Wall(WallSide::Bottom),
            OwnerTag::DragAnchor,
        ] {
            assert_eq!(decode_tag(encode_tag(tag)), Some(tag));
        }
        assert_eq!(decode_tag(0), None);
    }

    #[test]
    fn group_index_encoding_round_trips_negatives() {
        for group in [-7, -1, 0, 1, 42] {
            assert_eq!(decode_group(encode_group(group)), group);
        }
    }

    #[test]
    fn drag_spring_tracks_target() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let handle = dynamic_box(&mut world, 1, 0.0, 0.0);
        let (anchor, joint) = world
            .create_drag_spring(handle, Vec2::new(2.0, 0.0), &DragConfig::default())
            .unwrap();
        assert_eq!(world.joint_count(), 1);

        for _ in 0..120 {
            world.step(1.0 / 60.0, 8, 3);
        }
        let (position, _) = world.position(handle);
        assert!(
            position.x > 0.5,
            "spring should pull body toward target: x={}",
            position.x
        );

        world.remove_joint(joint);
        world.remove_body(anchor);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn contacts_between_converging_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = dynamic_box(&mut world, 1, 0.0, 0.0);
        let b = dynamic_box(&mut world, 2, 100.0, 0.0);
        world.set_linvel(a, Vec2::new(2.0, 0.0));
        world.set_linvel(b, Vec2::new(-2.0, 0.0));

        let mut contacts = Vec::new();
        for _ in 0..90 {
            world.step(1.0 / 60.0, 8, 3);
            world.collect_contacts(&mut contacts);
        }
        assert!(!contacts.is_empty(), "converging boxes should touch");
        let solved = contacts.iter().any(|c| c.impulse > 0.0);
        assert!(solved, "at least one post-solve sample should carry impulse");
        let keys_seen = contacts.iter().all(|c| {
            matches!(c.owner_a, OwnerTag::Body(_)) && matches!(c.owner_b, OwnerTag::Body(_))
        });
        assert!(keys_seen);
    }

    #[test]
    fn clear_colliders_keeps_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let handle = dynamic_box(&mut world, 1, 0.0, 0.0);
        world.clear_colliders(handle);
        assert!(world.contains_body(handle));
        let config = BodyConfig::default();
        let collider = build_collider(
            &BodyShape::circle(),
            40.0,
            40.0,
            &config,
            &CollisionFilter::default(),
            &units(),
        )
        .unwrap();
        world.attach_collider(collider, handle);
        assert_eq!(world.body_count(), 1);
    }
}

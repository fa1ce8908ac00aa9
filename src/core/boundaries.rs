use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use crate::body::config::BodyConfig;
use crate::body::filter::CollisionFilter;
use crate::body::shape::BodyShape;
use crate::config::BoundaryConfig;
use crate::core::units::UnitConverter;
use crate::core::world::{build_collider, OwnerTag, PhysicsWorld};

/// Which container edge a boundary wall guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

impl WallSide {
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(WallSide::Left),
            1 => Some(WallSide::Top),
            2 => Some(WallSide::Right),
            3 => Some(WallSide::Bottom),
            _ => None,
        }
    }
}

const WALL_COUNT: usize = 4;

#[derive(PartialEq, Clone, Copy)]
struct CacheKey {
    width_px: f32,
    height_px: f32,
    config: BoundaryConfig,
}

/// Owns the four static walls enclosing the container.
///
/// Walls are regenerated only when the (width, height, config) tuple changes
/// or a wall is missing; repeated updates with identical inputs perform zero
/// backend mutations.
pub(crate) struct BoundaryState {
    walls: [Option<RigidBodyHandle>; WALL_COUNT],
    cache: Option<CacheKey>,
}

impl BoundaryState {
    pub fn new() -> Self {
        Self {
            walls: [None; WALL_COUNT],
            cache: None,
        }
    }

    pub fn update(
        &mut self,
        world: &mut PhysicsWorld,
        width_px: f32,
        height_px: f32,
        config: &BoundaryConfig,
        units: &UnitConverter,
    ) {
        if world.is_locked() {
            return;
        }

        let next = CacheKey {
            width_px,
            height_px,
            config: *config,
        };
        if self.cache == Some(next) && self.has_all_walls() {
            return;
        }

        if !config.enabled || width_px <= 0.0 || height_px <= 0.0 {
            self.destroy(world);
            self.cache = Some(next);
            return;
        }

        self.destroy(world);

        let thickness = config.thickness_px;
        // Each wall sits just outside the container and runs past both
        // adjacent corners so the enclosure has no diagonal gaps.
        let expanded_width = width_px + thickness * 2.0;
        let expanded_height = height_px + thickness * 2.0;

        let layout: [(WallSide, Vec2, Vec2); WALL_COUNT] = [
            (
                WallSide::Left,
                Vec2::new(-thickness * 0.5, height_px * 0.5),
                Vec2::new(thickness, expanded_height),
            ),
            (
                WallSide::Top,
                Vec2::new(width_px * 0.5, -thickness * 0.5),
                Vec2::new(expanded_width, thickness),
            ),
            (
                WallSide::Right,
                Vec2::new(width_px + thickness * 0.5, height_px * 0.5),
                Vec2::new(thickness, expanded_height),
            ),
            (
                WallSide::Bottom,
                Vec2::new(width_px * 0.5, height_px + thickness * 0.5),
                Vec2::new(expanded_width, thickness),
            ),
        ];

        for (side, center_px, size_px) in layout {
            self.walls[side as usize] = create_wall(world, side, center_px, size_px, config, units);
        }

        self.cache = Some(next);
    }

    pub fn destroy(&mut self, world: &mut PhysicsWorld) {
        if world.is_locked() {
            return;
        }
        for slot in self.walls.iter_mut() {
            if let Some(handle) = slot.take() {
                world.remove_body(handle);
            }
        }
    }

    /// Drop wall references without touching the backend. Used after a world
    /// reset has already destroyed every body.
    pub fn forget(&mut self) {
        self.walls = [None; WALL_COUNT];
        self.cache = None;
    }

    #[cfg(test)]
    pub fn wall(&self, side: WallSide) -> Option<RigidBodyHandle> {
        self.walls[side as usize]
    }

    fn has_all_walls(&self) -> bool {
        self.walls.iter().all(|w| w.is_some())
    }
}

fn create_wall(
    world: &mut PhysicsWorld,
    side: WallSide,
    center_px: Vec2,
    size_px: Vec2,
    config: &BoundaryConfig,
    units: &UnitConverter,
) -> Option<RigidBodyHandle> {
    if size_px.x <= 0.0 || size_px.y <= 0.0 {
        return None;
    }

    let body_config = BodyConfig::fixed()
        .with_position(center_px)
        .with_density(0.0)
        .with_friction(config.friction)
        .with_restitution(config.restitution);
    let handle = world.create_body(OwnerTag::Wall(side), &body_config, units);

    let Some(collider) = build_collider(
        &BodyShape::Box,
        size_px.x,
        size_px.y,
        &body_config,
        &CollisionFilter::DEFAULT,
        units,
    ) else {
        // A wall that fails to build stays absent; the other three proceed.
        world.remove_body(handle);
        return None;
    };
    world.attach_collider(collider, handle);
    Some(handle)
}

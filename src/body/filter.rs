use serde::{Deserialize, Serialize};

/// Broad-phase collision filtering for a body's fixture.
///
/// `category_bits` declares what the fixture *is*; `mask_bits` declares what
/// it collides with. Two fixtures interact when each one's category is in the
/// other's mask. `group_index` overrides both: fixtures sharing a positive
/// group always collide, fixtures sharing a negative group never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionFilter {
    pub category_bits: u32,
    pub mask_bits: u32,
    pub group_index: i32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

impl CollisionFilter {
    pub const DEFAULT: CollisionFilter = CollisionFilter {
        category_bits: 0x0001,
        mask_bits: 0xFFFF,
        group_index: 0,
    };
}

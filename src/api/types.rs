use serde::{Deserialize, Serialize};

/// Stable identity for a UI element participating in the physics world.
///
/// The host assigns keys; the engine never invents them. A key must stay
/// stable across UI update cycles for the body it names to survive them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyKey(pub u64);

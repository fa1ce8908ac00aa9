pub mod api;
pub mod body;
pub mod bridge;
pub mod config;
pub mod core;
pub mod events;
pub mod snapshot;

// Re-export the public surface at the crate root for convenience
pub use crate::api::state::{PhysicsState, StepListener};
pub use crate::api::types::BodyKey;
pub use crate::body::config::{BodyConfig, BodyType};
pub use crate::body::filter::CollisionFilter;
pub use crate::body::registration::{
    BodyCallbacks, BodyRegistration, CollisionCallback, DragCallback, SleepCallback,
};
pub use crate::body::shape::{BodyShape, VertexSpace, MAX_POLYGON_VERTICES};
pub use crate::bridge::command::{Command, CommandQueue};
pub use crate::config::{
    BoundaryConfig, ConfigError, DragConfig, SolverIterations, StepConfig, WorldConfig,
};
pub use crate::core::boundaries::WallSide;
pub use crate::core::engine::FrameResult;
pub use crate::core::time::Simulation;
pub use crate::core::units::UnitConverter;
pub use crate::events::{CollisionEvent, CollisionPeer, DragEvent, DragPhase, StepEvent, WorldEvent};
pub use crate::snapshot::{BodySnapshot, WorldSnapshot};

//! Event payloads raised by the simulation toward UI-side consumers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::BodyKey;
use crate::core::boundaries::WallSide;

/// The other participant in a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPeer {
    Body(BodyKey),
    Wall(WallSide),
}

/// Contact callback payload.
///
/// Each contact is reported twice per registered body involved, once with
/// each body as `self_key`. `normal` is the backend's world-manifold normal
/// oriented from `self` toward `other` (the mirrored event carries the
/// negation); treat it as a relative direction, nothing more. Begin- and
/// end-contact events always deliver `impulse_px == 0.0`; a non-zero value
/// only appears after the solver has resolved the contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub self_key: BodyKey,
    pub other: CollisionPeer,
    /// Sum of absolute per-point normal impulses, in the UI length domain.
    pub impulse_px: f32,
    pub normal: Vec2,
}

/// World step event, emitted once per frame callback after stepping.
///
/// `sub_steps == 0` means the engine ran but no fixed step was due, which
/// observers can distinguish from "never invoked".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Clamped real time consumed by this frame, in seconds.
    pub delta_seconds: f32,
    /// Fixed steps executed this frame.
    pub sub_steps: u32,
    /// Monotonic step counter after this frame.
    pub step_index: u64,
}

/// Phase of a pointer-driven drag interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Drag lifecycle payload in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragEvent {
    pub key: BodyKey,
    pub phase: DragPhase,
    /// Raw pointer location.
    pub pointer_px: Vec2,
    /// Effective target used by the drag controller (may differ from the
    /// pointer due to grab-point anchoring).
    pub target_px: Vec2,
    /// Estimated pointer velocity in px/s; meaningful on `End`.
    pub velocity_px_s: Vec2,
}

/// Union of everything the engine reports during one frame, in emission
/// order. The host forwards these to the UI-facing state's callback tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    Collision(CollisionEvent),
    Step(StepEvent),
    Drag(DragEvent),
    /// Edge-triggered sleep transition; `sleeping` is the new state.
    Sleep { key: BodyKey, sleeping: bool },
}

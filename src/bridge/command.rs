use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::BodyKey;
use crate::config::DragConfig;

/// Operations queued from UI code and consumed exactly once by the engine.
///
/// All positional and velocity payloads are in container pixel space; the
/// engine converts to physics units internally. Gravity is the exception: it
/// is a world-level quantity expressed in m/s².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    ApplyImpulse {
        key: BodyKey,
        impulse_px: Vec2,
        /// When `false`, a sleeping body is left untouched.
        wake: bool,
    },
    SetVelocity {
        key: BodyKey,
        velocity_px_s: Vec2,
    },
    BeginDrag {
        key: BodyKey,
        /// Pointer position at grab time, container px.
        grab_px: Vec2,
        pointer_id: Option<u64>,
        /// Initial drag target, container px.
        target_px: Vec2,
        drag: DragConfig,
    },
    UpdateDrag {
        key: BodyKey,
        target_px: Vec2,
    },
    EndDrag {
        key: BodyKey,
        /// Estimated pointer velocity at release, px/s.
        release_velocity_px_s: Vec2,
    },
    CancelDrag {
        key: BodyKey,
    },
    SetGravity {
        gravity_mps2: Vec2,
    },
    ResetWorld,
}

/// FIFO queue of pending commands.
///
/// UI code pushes; the frame integration drains once per frame callback.
/// There is never more than one drainer (single-threaded contract), so the
/// drain is atomic with respect to itself.
pub struct CommandQueue {
    commands: Vec<Command>,
    version: u64,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(16),
            version: 0,
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
        self.version += 1;
    }

    /// Take all pending commands in insertion order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Monotonic marker that changes whenever a command is pushed. Hosts can
    /// use it as a cheap "is there work" probe.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_insertion_order() {
        let mut queue = CommandQueue::new();
        queue.push(Command::SetGravity {
            gravity_mps2: Vec2::ZERO,
        });
        queue.push(Command::SetVelocity {
            key: BodyKey(1),
            velocity_px_s: Vec2::new(50.0, 0.0),
        });
        queue.push(Command::ResetWorld);

        let drained = queue.drain();
        assert_eq!(drained.len(), 3);
        assert!(matches!(drained[0], Command::SetGravity { .. }));
        assert!(matches!(drained[1], Command::SetVelocity { .. }));
        assert!(matches!(drained[2], Command::ResetWorld));
        assert!(queue.is_empty());
    }

    #[test]
    fn version_bumps_on_push() {
        let mut queue = CommandQueue::new();
        assert_eq!(queue.version(), 0);
        queue.push(Command::ResetWorld);
        queue.push(Command::ResetWorld);
        assert_eq!(queue.version(), 2);
        // Draining does not rewind the marker.
        queue.drain();
        assert_eq!(queue.version(), 2);
    }
}

use crate::api::types::BodyKey;
use crate::body::config::BodyConfig;
use crate::body::filter::CollisionFilter;
use crate::body::shape::BodyShape;
use crate::config::DragConfig;
use crate::events::{CollisionEvent, DragEvent};

pub type CollisionCallback = Box<dyn FnMut(&CollisionEvent)>;
pub type SleepCallback = Box<dyn FnMut(bool)>;
pub type DragCallback = Box<dyn FnMut(&DragEvent)>;

/// Per-body callback bundle.
///
/// Callbacks are plain boxed closures looked up by key at dispatch time.
/// Registering for a key that already has callbacks replaces them
/// (last-writer-wins).
#[derive(Default)]
pub struct BodyCallbacks {
    pub on_collision: Option<CollisionCallback>,
    /// Invoked with `true` when the body falls asleep, `false` when it wakes.
    pub on_sleep_changed: Option<SleepCallback>,
    pub on_drag_start: Option<DragCallback>,
    pub on_drag_end: Option<DragCallback>,
}

impl BodyCallbacks {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything the UI supplies to register one element as a physics body.
///
/// A registration is supplied fresh each UI update cycle; the engine diffs
/// the comparable parts (size, shape, config, filter) against what it stored
/// to decide whether the fixture must be rebuilt.
pub struct BodyRegistration {
    pub key: BodyKey,
    pub config: BodyConfig,
    pub shape: BodyShape,
    pub filter: CollisionFilter,
    pub draggable: bool,
    pub drag: DragConfig,
    pub callbacks: BodyCallbacks,
}

impl BodyRegistration {
    pub fn new(key: BodyKey) -> Self {
        Self {
            key,
            config: BodyConfig::default(),
            shape: BodyShape::Box,
            filter: CollisionFilter::default(),
            draggable: false,
            drag: DragConfig::default(),
            callbacks: BodyCallbacks::default(),
        }
    }

    pub fn with_config(mut self, config: BodyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_shape(mut self, shape: BodyShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn draggable(mut self, drag: DragConfig) -> Self {
        self.draggable = true;
        self.drag = drag;
        self
    }

    pub fn on_collision(mut self, callback: impl FnMut(&CollisionEvent) + 'static) -> Self {
        self.callbacks.on_collision = Some(Box::new(callback));
        self
    }

    pub fn on_sleep_changed(mut self, callback: impl FnMut(bool) + 'static) -> Self {
        self.callbacks.on_sleep_changed = Some(Box::new(callback));
        self
    }

    pub fn on_drag_start(mut self, callback: impl FnMut(&DragEvent) + 'static) -> Self {
        self.callbacks.on_drag_start = Some(Box::new(callback));
        self
    }

    pub fn on_drag_end(mut self, callback: impl FnMut(&DragEvent) + 'static) -> Self {
        self.callbacks.on_drag_end = Some(Box::new(callback));
        self
    }
}

//! Gesture sensors: raw pointer, touch and keyboard input in, drag events out.
//!
//! The renderer registers a [`RegionMap`] every frame and forwards raw input to
//! [`GestureSensors::handle`]. Whichever modality arms a gesture owns it until
//! it ends; input from other modalities is ignored meanwhile.

mod regions;

pub use regions::{Bounds, Direction, Point, Region, RegionId, RegionMap};

use std::time::{Duration, Instant};

use kanban_core::id::ItemId;
use serde::Deserialize;
use tracing::debug;

use crate::config::SensorConfig;

/// Drop-target resolution strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionStrategy {
    /// Deepest target region under the pointer.
    #[default]
    PointerWithin,
    /// Target region whose center is nearest the pointer.
    ClosestCenter,
}

/// Device that armed the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModality {
    /// Mouse or pen.
    Pointer,
    /// Touch screen.
    Touch,
    /// Keyboard navigation.
    Keyboard,
}

/// Logical keyboard input for drag navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Lift the focused item, or drop the lifted one.
    Activate,
    /// Abort the gesture.
    Cancel,
    /// Move the hover target.
    Move(Direction),
}

/// Raw input forwarded by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    /// Pointer button pressed.
    PointerDown { at: Point, time: Instant },
    /// Pointer moved (with or without a button held).
    PointerMove { at: Point, time: Instant },
    /// Pointer button released.
    PointerUp { at: Point, time: Instant },
    /// Finger placed.
    TouchStart { at: Point, time: Instant },
    /// Finger moved.
    TouchMove { at: Point, time: Instant },
    /// Finger lifted.
    TouchEnd { at: Point, time: Instant },
    /// Key pressed with `focused` holding the item under keyboard focus.
    Key {
        key: KeyInput,
        focused: Option<ItemId>,
    },
}

impl RawInput {
    const fn modality(&self) -> InputModality {
        match self {
            Self::PointerDown { .. } | Self::PointerMove { .. } | Self::PointerUp { .. } => {
                InputModality::Pointer
            }
            Self::TouchStart { .. } | Self::TouchMove { .. } | Self::TouchEnd { .. } => {
                InputModality::Touch
            }
            Self::Key { .. } => InputModality::Keyboard,
        }
    }
}

/// Event stream consumed by the drag state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    /// An item was lifted.
    Start {
        /// Lifted item.
        active: ItemId,
    },
    /// The hover target changed.
    Over {
        /// Lifted item.
        active: ItemId,
        /// Item under the pointer or keyboard cursor.
        over: ItemId,
    },
    /// The gesture finished; `over == None` means cancelled.
    End {
        /// Lifted item.
        active: ItemId,
        /// Drop target, if any.
        over: Option<ItemId>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Armed {
        modality: InputModality,
        item: ItemId,
        origin: Point,
        since: Instant,
    },
    Active {
        modality: InputModality,
        active: ItemId,
        over: Option<ItemId>,
    },
}

/// Activation thresholds derived from [`SensorConfig`].
#[derive(Debug, Clone, Copy)]
struct Constraints {
    pointer_distance_sq: u32,
    touch_delay: Duration,
    touch_tolerance_sq: u32,
}

/// Pointer, touch and keyboard sensors sharing one gesture slot.
#[derive(Debug, Clone)]
pub struct GestureSensors {
    constraints: Constraints,
    collision: CollisionStrategy,
    phase: Phase,
}

impl GestureSensors {
    /// Build sensors from configuration.
    #[must_use]
    pub fn new(config: &SensorConfig) -> Self {
        let pointer = u32::from(config.pointer_distance);
        let touch = u32::from(config.touch_tolerance);
        Self {
            constraints: Constraints {
                pointer_distance_sq: pointer * pointer,
                touch_delay: config.touch_delay(),
                touch_tolerance_sq: touch * touch,
            },
            collision: config.collision,
            phase: Phase::Idle,
        }
    }

    /// Modality owning the current gesture, armed or active.
    #[must_use]
    pub const fn modality(&self) -> Option<InputModality> {
        match self.phase {
            Phase::Idle => None,
            Phase::Armed { modality, .. } | Phase::Active { modality, .. } => Some(modality),
        }
    }

    /// Whether a drag has been activated.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    /// Current hover target of an active drag.
    #[must_use]
    pub const fn over(&self) -> Option<ItemId> {
        match self.phase {
            Phase::Active { over, .. } => over,
            _ => None,
        }
    }

    /// Abort whatever is in progress, e.g. when the window loses focus.
    pub fn cancel(&mut self) -> Option<DragEvent> {
        let previous = std::mem::replace(&mut self.phase, Phase::Idle);
        match previous {
            Phase::Active { active, .. } => Some(DragEvent::End { active, over: None }),
            Phase::Idle | Phase::Armed { .. } => None,
        }
    }

    /// Feed one raw input against the current frame's regions.
    pub fn handle(&mut self, regions: &RegionMap, input: RawInput) -> Vec<DragEvent> {
        if let Some(owner) = self.modality()
            && owner != input.modality()
        {
            return Vec::new();
        }
        match input {
            RawInput::PointerDown { at, time } => self.arm(regions, InputModality::Pointer, at, time),
            RawInput::TouchStart { at, time } => self.arm(regions, InputModality::Touch, at, time),
            RawInput::PointerMove { at, .. } => self.pointer_move(regions, at),
            RawInput::TouchMove { at, time } => self.touch_move(regions, at, time),
            RawInput::PointerUp { .. } | RawInput::TouchEnd { .. } => self.release(),
            RawInput::Key { key, focused } => self.key(regions, key, focused),
        }
    }

    fn arm(
        &mut self,
        regions: &RegionMap,
        modality: InputModality,
        at: Point,
        time: Instant,
    ) -> Vec<DragEvent> {
        if !matches!(self.phase, Phase::Idle) {
            return Vec::new();
        }
        if regions.is_drag_blocked(at) {
            debug!(x = at.x, y = at.y, "Press inside no-drag region; not arming");
            return Vec::new();
        }
        if let Some(item) = regions.draggable_at(at) {
            self.phase = Phase::Armed {
                modality,
                item,
                origin: at,
                since: time,
            };
        }
        Vec::new()
    }

    fn pointer_move(&mut self, regions: &RegionMap, at: Point) -> Vec<DragEvent> {
        match self.phase {
            Phase::Armed { item, origin, .. } => {
                if origin.distance_sq(at) < self.constraints.pointer_distance_sq {
                    return Vec::new();
                }
                self.activate(regions, InputModality::Pointer, item, at)
            }
            Phase::Active { .. } => self.hover(regions, at),
            Phase::Idle => Vec::new(),
        }
    }

    fn touch_move(&mut self, regions: &RegionMap, at: Point, time: Instant) -> Vec<DragEvent> {
        match self.phase {
            Phase::Armed {
                item,
                origin,
                since,
                ..
            } => {
                if origin.distance_sq(at) > self.constraints.touch_tolerance_sq {
                    debug!("Touch moved beyond tolerance before hold elapsed; abandoning");
                    self.phase = Phase::Idle;
                    return Vec::new();
                }
                if time.saturating_duration_since(since) < self.constraints.touch_delay {
                    return Vec::new();
                }
                self.activate(regions, InputModality::Touch, item, at)
            }
            Phase::Active { .. } => self.hover(regions, at),
            Phase::Idle => Vec::new(),
        }
    }

    fn release(&mut self) -> Vec<DragEvent> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Active { active, over, .. } => vec![DragEvent::End { active, over }],
            Phase::Armed { .. } | Phase::Idle => Vec::new(),
        }
    }

    fn activate(
        &mut self,
        regions: &RegionMap,
        modality: InputModality,
        active: ItemId,
        at: Point,
    ) -> Vec<DragEvent> {
        debug!(%active, ?modality, "Drag activated");
        self.phase = Phase::Active {
            modality,
            active,
            over: None,
        };
        let mut events = vec![DragEvent::Start { active }];
        events.extend(self.hover(regions, at));
        events
    }

    fn hover(&mut self, regions: &RegionMap, at: Point) -> Vec<DragEvent> {
        let Phase::Active { active, over, .. } = &mut self.phase else {
            return Vec::new();
        };
        let active = *active;
        let next = regions.resolve(at, self.collision, |target| {
            !active.is_board() || target.is_board()
        });
        if next == *over {
            return Vec::new();
        }
        *over = next;
        next.map(|over| DragEvent::Over { active, over })
            .into_iter()
            .collect()
    }

    fn key(&mut self, regions: &RegionMap, key: KeyInput, focused: Option<ItemId>) -> Vec<DragEvent> {
        match (self.phase, key) {
            (Phase::Idle, KeyInput::Activate) => {
                let Some(item) = focused else {
                    return Vec::new();
                };
                if regions
                    .region_of(item)
                    .is_some_and(|id| regions.is_within_no_drag(id))
                {
                    return Vec::new();
                }
                debug!(%item, "Keyboard drag activated");
                self.phase = Phase::Active {
                    modality: InputModality::Keyboard,
                    active: item,
                    over: Some(item),
                };
                vec![
                    DragEvent::Start { active: item },
                    DragEvent::Over {
                        active: item,
                        over: item,
                    },
                ]
            }
            (Phase::Active { active, over, .. }, KeyInput::Move(direction)) => {
                let from = over.unwrap_or(active);
                let eligible = |target: ItemId| keyboard_eligible(regions, active, target);
                let Some(next) = regions.neighbor(from, direction, eligible) else {
                    return Vec::new();
                };
                self.phase = Phase::Active {
                    modality: InputModality::Keyboard,
                    active,
                    over: Some(next),
                };
                vec![DragEvent::Over { active, over: next }]
            }
            (Phase::Active { .. }, KeyInput::Activate) => self.release(),
            (Phase::Active { active, .. }, KeyInput::Cancel) => {
                self.phase = Phase::Idle;
                vec![DragEvent::End { active, over: None }]
            }
            _ => Vec::new(),
        }
    }
}

/// Boards accept boards. Tasks navigate between tasks and empty boards.
fn keyboard_eligible(regions: &RegionMap, active: ItemId, target: ItemId) -> bool {
    if active.is_board() {
        return target.is_board();
    }
    match target {
        ItemId::Task(_) => true,
        ItemId::Board(_) => regions
            .region_of(target)
            .is_some_and(|id| !regions.has_target_descendants(id)),
    }
}

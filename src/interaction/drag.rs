use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, SurfaceSize, Vec2};
use crate::interaction::hit_test::{DragTarget, hit_test};
use crate::model::overlay::OverlayStore;
use crate::model::transform::ImageTransform;

/// Pointer event phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    /// Button/finger pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button/finger released.
    Up,
    /// Pointer left the surface.
    Leave,
}

/// A pointer event in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase.
    pub phase: PointerPhase,
    /// Screen-space position.
    pub position: Point,
}

impl PointerEvent {
    /// Pointer-down at screen position `(x, y)`.
    pub fn down(x: f64, y: f64) -> Self {
        Self::at(PointerPhase::Down, x, y)
    }

    /// Pointer-move to screen position `(x, y)`.
    pub fn moved(x: f64, y: f64) -> Self {
        Self::at(PointerPhase::Move, x, y)
    }

    /// Pointer-up at screen position `(x, y)`.
    pub fn up(x: f64, y: f64) -> Self {
        Self::at(PointerPhase::Up, x, y)
    }

    /// Pointer-leave at screen position `(x, y)`.
    pub fn leave(x: f64, y: f64) -> Self {
        Self::at(PointerPhase::Leave, x, y)
    }

    fn at(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            position: Point::new(x, y),
        }
    }
}

/// Drag state machine: `Idle -> Dragging -> Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A drag is routing deltas to `target`.
    Dragging {
        /// Entity receiving the deltas.
        target: DragTarget,
        /// Last recorded pointer position, surface-local.
        last: Point,
    },
}

/// What a routed pointer event did to the editor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEffect {
    /// Nothing changed.
    None,
    /// A drag started or ended (selection outline visibility changed).
    Selection,
    /// The drag target moved.
    Moved,
}

impl DragEffect {
    /// `true` when the frame must be redrawn.
    pub fn needs_redraw(self) -> bool {
        self != Self::None
    }
}

/// Routes pointer events to a drag target.
///
/// Deltas are incremental against the last recorded position, so a surface resize in the middle of
/// a drag does not make the target jump.
#[derive(Clone, Debug, Default)]
pub struct DragRouter {
    state: DragState,
}

impl DragRouter {
    /// Idle router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// The active drag target, if any.
    pub fn target(&self) -> Option<DragTarget> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { target, .. } => Some(target),
        }
    }

    /// `true` while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Route one surface-local pointer event.
    pub fn route(
        &mut self,
        phase: PointerPhase,
        local: Point,
        surface: SurfaceSize,
        overlays: &mut OverlayStore,
        transform: &mut ImageTransform,
    ) -> DragEffect {
        match phase {
            PointerPhase::Down if !surface.contains(local) => {
                // A press outside the surface starts nothing and ends any drag in progress.
                self.release()
            }
            PointerPhase::Down => {
                self.pointer_down(local, overlays);
                DragEffect::Selection
            }
            PointerPhase::Move if !surface.contains(local) => {
                // Moving off the surface ends the drag like an explicit leave.
                self.release()
            }
            PointerPhase::Move => self.pointer_move(local, overlays, transform),
            PointerPhase::Up | PointerPhase::Leave => self.release(),
        }
    }

    /// Hit-test at `local` and start dragging whatever is there.
    pub fn pointer_down(&mut self, local: Point, overlays: &OverlayStore) -> DragTarget {
        let target = hit_test(overlays, local);
        tracing::debug!(?target, x = local.x, y = local.y, "drag start");
        self.state = DragState::Dragging {
            target,
            last: local,
        };
        target
    }

    /// Apply the incremental delta since the last position to the drag target.
    pub fn pointer_move(
        &mut self,
        local: Point,
        overlays: &mut OverlayStore,
        transform: &mut ImageTransform,
    ) -> DragEffect {
        let DragState::Dragging { target, last } = &mut self.state else {
            return DragEffect::None;
        };
        let delta: Vec2 = local - *last;
        *last = local;
        let moved = match *target {
            DragTarget::Overlay(id) => overlays.translate(id, delta),
            DragTarget::Image => transform.pan(delta.x, delta.y),
        };
        if moved {
            DragEffect::Moved
        } else {
            DragEffect::None
        }
    }

    /// Return to Idle. Every intermediate position has already been applied.
    pub fn release(&mut self) -> DragEffect {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragEffect::None,
            DragState::Dragging { target, .. } => {
                tracing::debug!(?target, "drag end");
                DragEffect::Selection
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interaction/drag.rs"]
mod tests;

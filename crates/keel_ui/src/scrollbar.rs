//! Scrollbar drag state machine.
//!
//! ```text
//!   stop ──mouse-down on thumb──▶ start ──mouse-move──▶ dragging
//!    ▲                                                     │
//!    └───── mouse-up, or pointer left the scrollbar ───────┘
//! ```
//!
//! The thumb is not a control of its own: its rectangle is derived from the
//! owning box's `children_rect` and `scrolled_rect` every time it is needed.

use std::sync::{Arc, Weak};

use parking_lot::MutexGuard;

use crate::control::{Control, ControlKind, Role};
use crate::error::{UiError, UiResult};
use crate::geometry::{Point, Rect};

/// Axis a scrollbar runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Scrolls left and right, docked at the bottom edge.
    Horizontal,
    /// Scrolls up and down, docked at the right edge.
    Vertical,
}

impl Axis {
    fn of_point(self, point: Point) -> f32 {
        match self {
            Self::Horizontal => point.x,
            Self::Vertical => point.y,
        }
    }

    fn start(self, rect: &Rect) -> f32 {
        match self {
            Self::Horizontal => rect.x,
            Self::Vertical => rect.y,
        }
    }

    fn length(self, rect: &Rect) -> f32 {
        match self {
            Self::Horizontal => rect.width,
            Self::Vertical => rect.height,
        }
    }

    /// Splits a scalar delta into `(dx, dy)`.
    fn delta(self, amount: f32) -> (f32, f32) {
        match self {
            Self::Horizontal => (amount, 0.0),
            Self::Vertical => (0.0, amount),
        }
    }
}

/// Drag state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// Idle.
    #[default]
    Stop,
    /// Mouse went down over the thumb.
    Start,
    /// The thumb follows the pointer.
    Dragging,
}

/// Scrollbar-specific state.
#[derive(Debug)]
pub struct ScrollbarState {
    drag: DragState,
    owner: Weak<Control>,
    axis: Axis,
    thickness: f32,
}

impl ScrollbarState {
    /// State for a scrollbar without an owning box.
    #[must_use]
    pub(crate) fn detached() -> Self {
        Self {
            drag: DragState::Stop,
            owner: Weak::new(),
            axis: Axis::Vertical,
            thickness: 0.0,
        }
    }

    /// Creates the scrollbar control for `owner`. The caller attaches it.
    pub(crate) fn create(owner: &Control, axis: Axis, thickness: f32, owner_pos: Rect) -> Arc<Control> {
        let pos = match axis {
            Axis::Vertical => Rect::new(owner_pos.width - thickness, 0.0, thickness, owner_pos.height),
            Axis::Horizontal => Rect::new(0.0, owner_pos.height - thickness, owner_pos.width, thickness),
        };
        let state = Self {
            drag: DragState::Stop,
            owner: owner.weak(),
            axis,
            thickness,
        };
        let control = Control::build(
            format!("{}_scrollbar", owner.id()),
            ControlKind::Scrollbar,
            pos,
            Role::Scrollbar(parking_lot::Mutex::new(state)),
        );
        control.set_locked(true);
        control
    }
}

impl Control {
    fn scrollbar_state(&self) -> Option<MutexGuard<'_, ScrollbarState>> {
        match &self.role {
            Role::Scrollbar(state) => Some(state.lock()),
            Role::Plain | Role::Layout(_) => None,
        }
    }

    fn scrollbar_state_or_err(&self) -> UiResult<MutexGuard<'_, ScrollbarState>> {
        self.expect_kind(ControlKind::Scrollbar)?;
        self.scrollbar_state().ok_or_else(|| UiError::KindMismatch {
            id: self.id().to_owned(),
            expected: ControlKind::Scrollbar,
            found: self.kind(),
        })
    }

    pub(crate) fn scrollbar_geometry(&self) -> Option<(Axis, f32)> {
        self.scrollbar_state().map(|s| (s.axis, s.thickness))
    }

    /// Current drag state of a scrollbar.
    #[must_use]
    pub fn drag_state(&self) -> Option<DragState> {
        self.scrollbar_state().map(|s| s.drag)
    }

    /// Axis of a scrollbar.
    #[must_use]
    pub fn scroll_axis(&self) -> Option<Axis> {
        self.scrollbar_state().map(|s| s.axis)
    }

    /// The box this scrollbar scrolls.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] for anything but a scrollbar and
    /// [`UiError::DetachedScrollbar`] if the owning box is gone.
    pub fn owning_box(&self) -> UiResult<Arc<Control>> {
        self.scrollbar_state_or_err()?
            .owner
            .upgrade()
            .ok_or_else(|| UiError::DetachedScrollbar(self.id().to_owned()))
    }

    fn set_drag(&self, drag: DragState) {
        if let Some(mut state) = self.scrollbar_state() {
            state.drag = drag;
        }
    }

    /// On-screen thumb rectangle, unclipped.
    ///
    /// Length and offset along the track are the viewport and scroll offset
    /// as fractions of the total content extent.
    #[must_use]
    pub fn thumb_rect(&self) -> Option<Rect> {
        let axis = self.scroll_axis()?;
        let owner = self.owning_box().ok()?;
        let content = owner.children_rect()?;
        let viewport = owner.scrolled_rect()?;
        let track = self.placement().0;

        let extent = axis.length(&content);
        if extent <= 0.0 {
            return None;
        }
        let track_len = axis.length(&track);
        let thumb_len = track_len * axis.length(&viewport) / extent;
        let offset = track_len * axis.start(&viewport) / extent;

        Some(match axis {
            Axis::Vertical => Rect::new(track.x, track.y + offset, track.width, thumb_len),
            Axis::Horizontal => Rect::new(track.x + offset, track.y, thumb_len, track.height),
        })
    }

    /// Scrolls the owner so the thumb center moves to `point`.
    fn scroll_thumb_to(&self, point: Point) -> UiResult<()> {
        let owner = self.owning_box()?;
        let axis = self.scroll_axis().unwrap_or(Axis::Vertical);
        let Some(thumb) = self.thumb_rect() else {
            return Ok(());
        };
        let delta = axis.of_point(point) - axis.of_point(thumb.center());
        let (dx, dy) = axis.delta(delta);
        owner.do_scroll(dx, dy)
    }

    /// Mouse went down on the scrollbar. Over the thumb, a drag starts.
    ///
    /// # Errors
    ///
    /// Fails for anything but a scrollbar with a live owning box.
    pub fn on_mouse_down(&self, point: Point) -> UiResult<()> {
        self.owning_box()?;
        if self.thumb_rect().is_some_and(|thumb| thumb.contains_point(point)) {
            self.set_drag(DragState::Start);
        }
        Ok(())
    }

    /// Pointer moved. While a drag is in progress the thumb follows it.
    ///
    /// # Errors
    ///
    /// Fails for anything but a scrollbar with a live owning box.
    pub fn on_mouse_move(&self, point: Point) -> UiResult<()> {
        self.owning_box()?;
        match self.drag_state() {
            Some(DragState::Start) => {
                self.set_drag(DragState::Dragging);
                self.scroll_thumb_to(point)
            }
            Some(DragState::Dragging) => self.scroll_thumb_to(point),
            Some(DragState::Stop) | None => Ok(()),
        }
    }

    /// Mouse released. A release on the track outside the thumb jumps the
    /// thumb there; any drag ends.
    ///
    /// # Errors
    ///
    /// Fails for anything but a scrollbar with a live owning box.
    pub fn on_mouse_up(&self, point: Point) -> UiResult<()> {
        self.owning_box()?;
        let track = self.placement().0;
        let on_thumb = self.thumb_rect().is_some_and(|thumb| thumb.contains_point(point));
        let dragged = self.drag_state() == Some(DragState::Dragging);
        self.set_drag(DragState::Stop);
        if track.contains_point(point) && !on_thumb && !dragged {
            self.scroll_thumb_to(point)?;
        }
        Ok(())
    }

    /// Ends a drag whose pointer has left the scrollbar, e.g. after a lost
    /// mouse-up.
    pub(crate) fn release_stuck_drag(&self, pointer: Point) {
        if self.drag_state() == Some(DragState::Dragging) && !self.absolute_pos().contains_point(pointer) {
            tracing::trace!("drag on {} released: pointer left the scrollbar", self.id());
            self.set_drag(DragState::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoxLayout;
    use crate::{Manager, UiConfig};

    /// A 100x100 vbox scrolled over 400px of content, scrollbar 10px wide.
    fn scrolled_box(manager: &Manager) -> (Arc<Control>, Arc<Control>) {
        let b = Control::new(ControlKind::Box, Rect::new(0.0, 0.0, 100.0, 100.0));
        manager.add_child(&b).unwrap();
        b.set_layout(BoxLayout::vbox()).unwrap();
        for _ in 0..4 {
            b.add_child(&Control::new(ControlKind::Panel, Rect::new(0.0, 0.0, 50.0, 100.0)))
                .unwrap();
        }
        b.set_scroll(manager, true).unwrap();
        let sb = b.scrollbar().unwrap();
        (b, sb)
    }

    fn manager() -> Manager {
        let config = UiConfig {
            scrollbar_thickness: 10.0,
            ..UiConfig::default()
        };
        Manager::new(Rect::new(0.0, 0.0, 800.0, 600.0), config)
    }

    #[test]
    fn test_thumb_geometry_is_proportional() {
        let manager = manager();
        let (b, sb) = scrolled_box(&manager);

        assert_eq!(sb.pos(), Rect::new(90.0, 0.0, 10.0, 100.0));
        assert_eq!(sb.thumb_rect().unwrap(), Rect::new(90.0, 0.0, 10.0, 25.0));

        b.scroll_content_by(0.0, 200.0).unwrap();
        assert_eq!(sb.thumb_rect().unwrap(), Rect::new(90.0, 50.0, 10.0, 25.0));
    }

    #[test]
    fn test_drag_states() {
        let manager = manager();
        let (_b, sb) = scrolled_box(&manager);

        sb.on_mouse_down(Point::new(95.0, 50.0)).unwrap();
        assert_eq!(sb.drag_state(), Some(DragState::Stop));

        sb.on_mouse_down(Point::new(95.0, 5.0)).unwrap();
        assert_eq!(sb.drag_state(), Some(DragState::Start));

        sb.on_mouse_move(Point::new(95.0, 12.5)).unwrap();
        assert_eq!(sb.drag_state(), Some(DragState::Dragging));

        sb.on_mouse_up(Point::new(95.0, 12.5)).unwrap();
        assert_eq!(sb.drag_state(), Some(DragState::Stop));
    }

    #[test]
    fn test_click_on_track_jumps() {
        let manager = manager();
        let (b, sb) = scrolled_box(&manager);

        // Thumb center at 12.5; clicking at 62.5 moves it 50 track px = 200 content px.
        sb.on_mouse_up(Point::new(95.0, 62.5)).unwrap();
        assert_eq!(b.scrolled_rect().unwrap().y, 200.0);
    }

    #[test]
    fn test_stuck_drag_released_when_pointer_leaves() {
        let manager = manager();
        let (_b, sb) = scrolled_box(&manager);

        sb.on_mouse_down(Point::new(95.0, 5.0)).unwrap();
        sb.on_mouse_move(Point::new(95.0, 10.0)).unwrap();
        sb.release_stuck_drag(Point::new(95.0, 20.0));
        assert_eq!(sb.drag_state(), Some(DragState::Dragging));

        sb.release_stuck_drag(Point::new(300.0, 20.0));
        assert_eq!(sb.drag_state(), Some(DragState::Stop));
    }

    #[test]
    fn test_detached_scrollbar_fails() {
        let orphan = Control::new(ControlKind::Scrollbar, Rect::new(0.0, 0.0, 10.0, 100.0));
        let err = orphan.on_mouse_down(Point::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, UiError::DetachedScrollbar(_)));

        let panel = Control::new(ControlKind::Panel, Rect::ZERO);
        assert!(matches!(panel.owning_box(), Err(UiError::KindMismatch { .. })));
    }
}

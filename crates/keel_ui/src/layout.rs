//! Box layout: vbox/hbox stacking, alignment, padding and scrolling.
//!
//! A box positions its visible, unlocked children inside its content area
//! (own rect minus padding minus frame inset) and tracks two rectangles in
//! box-local coordinates:
//!
//! - `children_rect`: the extent needed to contain every positioned child
//!   plus padding, never smaller than the viewport.
//! - `scrolled_rect`: the viewport, a window into `children_rect` whose
//!   origin is the scroll offset.

use std::sync::Arc;

use parking_lot::MutexGuard;

use crate::control::{Control, ControlKind, Role};
use crate::error::{UiError, UiResult};
use crate::geometry::{Padding, Point, Rect};
use crate::manager::Manager;
use crate::scrollbar::{Axis, ScrollbarState};

/// Layout kind of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxKind {
    /// Children keep their explicit positions.
    #[default]
    None,
    /// Children stack vertically.
    VBox,
    /// Children stack horizontally.
    HBox,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    /// Against the left edge; hbox stacks left to right.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Against the right edge; hbox stacks right to left.
    Right,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    /// Against the top edge; vbox stacks top to bottom.
    #[default]
    Top,
    /// Centered.
    Center,
    /// Against the bottom edge; vbox stacks bottom to top.
    Bottom,
}

impl BoxKind {
    /// Parses a declarative tag (`none`, `vbox`, `hbox`).
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidProperty`] for anything else.
    pub fn from_tag(tag: &str) -> UiResult<Self> {
        match tag {
            "none" => Ok(Self::None),
            "vbox" => Ok(Self::VBox),
            "hbox" => Ok(Self::HBox),
            _ => Err(UiError::InvalidProperty {
                property: "box_type",
                value: tag.to_owned(),
            }),
        }
    }
}

impl HAlign {
    /// Parses a declarative tag (`left`, `center`, `right`).
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidProperty`] for anything else.
    pub fn from_tag(tag: &str) -> UiResult<Self> {
        match tag {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(UiError::InvalidProperty {
                property: "h_align",
                value: tag.to_owned(),
            }),
        }
    }
}

impl VAlign {
    /// Parses a declarative tag (`top`, `center`, `bottom`).
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidProperty`] for anything else.
    pub fn from_tag(tag: &str) -> UiResult<Self> {
        match tag {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => Err(UiError::InvalidProperty {
                property: "v_align",
                value: tag.to_owned(),
            }),
        }
    }
}

/// Direction children are placed in, derived from a validated layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Free,
    Down,
    Up,
    Right,
    Left,
}

/// A validated `(kind, h_align, v_align)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxLayout {
    kind: BoxKind,
    h_align: HAlign,
    v_align: VAlign,
    flow: Flow,
}

impl BoxLayout {
    /// No automatic layout.
    pub const NONE: Self = Self {
        kind: BoxKind::None,
        h_align: HAlign::Left,
        v_align: VAlign::Top,
        flow: Flow::Free,
    };

    /// Validates a layout combination.
    ///
    /// A stack cannot be centered along its own axis: `vbox` rejects
    /// `v_align = center` and `hbox` rejects `h_align = center`.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::UnsupportedAlignment`] for those combinations.
    pub fn new(kind: BoxKind, h_align: HAlign, v_align: VAlign) -> UiResult<Self> {
        let flow = match (kind, h_align, v_align) {
            (BoxKind::None, _, _) => Flow::Free,
            (BoxKind::VBox, _, VAlign::Top) => Flow::Down,
            (BoxKind::VBox, _, VAlign::Bottom) => Flow::Up,
            (BoxKind::HBox, HAlign::Left, _) => Flow::Right,
            (BoxKind::HBox, HAlign::Right, _) => Flow::Left,
            (BoxKind::VBox, _, VAlign::Center) | (BoxKind::HBox, HAlign::Center, _) => {
                return Err(UiError::UnsupportedAlignment { kind, h_align, v_align });
            }
        };
        Ok(Self { kind, h_align, v_align, flow })
    }

    /// Vertical stack, top to bottom, left aligned.
    #[must_use]
    pub const fn vbox() -> Self {
        Self {
            kind: BoxKind::VBox,
            h_align: HAlign::Left,
            v_align: VAlign::Top,
            flow: Flow::Down,
        }
    }

    /// Horizontal stack, left to right, top aligned.
    #[must_use]
    pub const fn hbox() -> Self {
        Self {
            kind: BoxKind::HBox,
            h_align: HAlign::Left,
            v_align: VAlign::Top,
            flow: Flow::Right,
        }
    }

    /// Layout kind.
    #[must_use]
    pub const fn kind(&self) -> BoxKind {
        self.kind
    }

    /// Horizontal alignment.
    #[must_use]
    pub const fn h_align(&self) -> HAlign {
        self.h_align
    }

    /// Vertical alignment.
    #[must_use]
    pub const fn v_align(&self) -> VAlign {
        self.v_align
    }

    /// Axis a scrollbar for this layout runs along.
    #[must_use]
    pub const fn scroll_axis(&self) -> Axis {
        match self.kind {
            BoxKind::HBox => Axis::Horizontal,
            BoxKind::None | BoxKind::VBox => Axis::Vertical,
        }
    }

    /// Places a child of `size` after `last` inside `content`.
    fn place(&self, content: Rect, size: (f32, f32), last: Option<Rect>, gap: f32) -> Option<Rect> {
        let (width, height) = size;
        let x_aligned = match self.h_align {
            HAlign::Left => content.x,
            HAlign::Center => content.x + (content.width - width) * 0.5,
            HAlign::Right => content.right() - width,
        };
        let y_aligned = match self.v_align {
            VAlign::Top => content.y,
            VAlign::Center => content.y + (content.height - height) * 0.5,
            VAlign::Bottom => content.bottom() - height,
        };

        let (x, y) = match self.flow {
            Flow::Free => return None,
            Flow::Down => (x_aligned, last.map_or(content.y, |l| l.bottom() + gap)),
            Flow::Up => (x_aligned, last.map_or(content.bottom() - height, |l| l.y - gap - height)),
            Flow::Right => (last.map_or(content.x, |l| l.right() + gap), y_aligned),
            Flow::Left => (last.map_or(content.right() - width, |l| l.x - gap - width), y_aligned),
        };
        Some(Rect::new(x, y, width, height))
    }

    /// Offset that moves a stack growing toward the start edge back inside
    /// the content area, given the top-left corner of everything placed.
    fn overflow_shift(&self, content: Rect, start: Point) -> Point {
        match self.flow {
            Flow::Up => Point::new(0.0, (content.y - start.y).max(0.0)),
            Flow::Left => Point::new((content.x - start.x).max(0.0), 0.0),
            Flow::Free | Flow::Down | Flow::Right => Point::ZERO,
        }
    }
}

impl Default for BoxLayout {
    fn default() -> Self {
        Self::NONE
    }
}

/// Layout and scroll state of a box.
#[derive(Debug)]
pub struct BoxState {
    pub(crate) layout: BoxLayout,
    pub(crate) padding: Padding,
    pub(crate) gap: f32,
    pub(crate) children_rect: Rect,
    pub(crate) scrolled_rect: Rect,
    pub(crate) scrollbar: Option<Arc<Control>>,
    /// Shift applied by the last layout pass to a bottom- or right-anchored
    /// stack that overflowed its start edge.
    pub(crate) overflow_shift: Point,
}

impl BoxState {
    /// State for a box occupying `pos`, with no layout and no scroll.
    #[must_use]
    pub fn new(pos: Rect) -> Self {
        let viewport = Rect::new(0.0, 0.0, pos.width, pos.height);
        Self {
            layout: BoxLayout::NONE,
            padding: Padding::ZERO,
            gap: 0.0,
            children_rect: viewport,
            scrolled_rect: viewport,
            scrollbar: None,
            overflow_shift: Point::ZERO,
        }
    }

    /// Largest valid scroll origin.
    fn max_scroll(&self) -> Point {
        Point::new(
            (self.children_rect.width - self.scrolled_rect.width).max(0.0),
            (self.children_rect.height - self.scrolled_rect.height).max(0.0),
        )
    }

    /// Moves the viewport origin, clamped to `children_rect`.
    fn scroll_to(&mut self, x: f32, y: f32) {
        let max = self.max_scroll();
        self.scrolled_rect.x = x.clamp(0.0, max.x);
        self.scrolled_rect.y = y.clamp(0.0, max.y);
    }
}

impl Control {
    fn box_state(&self) -> Option<MutexGuard<'_, BoxState>> {
        match &self.role {
            Role::Layout(state) => Some(state.lock()),
            Role::Plain | Role::Scrollbar(_) => None,
        }
    }

    fn box_state_or_err(&self) -> UiResult<MutexGuard<'_, BoxState>> {
        self.expect_kind(ControlKind::Box)?;
        self.box_state().ok_or_else(|| UiError::KindMismatch {
            id: self.id().to_owned(),
            expected: ControlKind::Box,
            found: self.kind(),
        })
    }

    /// Sets the layout of a box and re-lays its children.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if this is not a box.
    pub fn set_layout(&self, layout: BoxLayout) -> UiResult<()> {
        self.box_state_or_err()?.layout = layout;
        self.update_children();
        Ok(())
    }

    /// Sets the padding of a box and re-lays its children.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if this is not a box.
    pub fn set_padding(&self, padding: Padding) -> UiResult<()> {
        self.box_state_or_err()?.padding = padding;
        self.update_children();
        Ok(())
    }

    /// Sets the gap between stacked children and re-lays them.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if this is not a box.
    pub fn set_gap(&self, gap: f32) -> UiResult<()> {
        self.box_state_or_err()?.gap = gap;
        self.update_children();
        Ok(())
    }

    /// Layout of a box.
    #[must_use]
    pub fn layout(&self) -> Option<BoxLayout> {
        self.box_state().map(|s| s.layout)
    }

    /// Bounding box of the positioned children plus padding, box-local.
    #[must_use]
    pub fn children_rect(&self) -> Option<Rect> {
        self.box_state().map(|s| s.children_rect)
    }

    /// Visible window into [`Control::children_rect`], box-local.
    #[must_use]
    pub fn scrolled_rect(&self) -> Option<Rect> {
        self.box_state().map(|s| s.scrolled_rect)
    }

    /// The scrollbar owned by a box, if scrolling is enabled.
    #[must_use]
    pub fn scrollbar(&self) -> Option<Arc<Control>> {
        self.box_state().and_then(|s| s.scrollbar.clone())
    }

    /// Offset applied to unlocked children. Zero for anything but a box.
    #[must_use]
    pub fn scroll_offset(&self) -> Point {
        self.box_state().map_or(Point::ZERO, |s| s.scrolled_rect.origin())
    }

    /// Enables or disables scrolling on a box.
    ///
    /// Enabling creates the owned scrollbar; disabling hands it to the
    /// manager's graveyard.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if this is not a box, or the
    /// manager's error if the scrollbar cannot be destroyed.
    pub fn set_scroll(&self, manager: &Manager, enabled: bool) -> UiResult<()> {
        let existing = self.box_state_or_err()?.scrollbar.clone();
        match (enabled, existing) {
            (true, None) => {
                let (axis, pos) = {
                    let state = self.box_state_or_err()?;
                    (state.layout.scroll_axis(), self.pos())
                };
                let thickness = manager.config().scrollbar_thickness;
                let scrollbar = ScrollbarState::create(self, axis, thickness, pos);
                self.box_state_or_err()?.scrollbar = Some(Arc::clone(&scrollbar));
                self.add_child(&scrollbar)?;
                tracing::debug!("scrolling enabled on {} ({:?})", self.id(), axis);
            }
            (false, Some(scrollbar)) => {
                {
                    let mut state = self.box_state_or_err()?;
                    state.scrollbar = None;
                    let anchor = state.overflow_shift;
                    state.scroll_to(anchor.x, anchor.y);
                }
                manager.destroy(&scrollbar)?;
                self.update_children();
                tracing::debug!("scrolling disabled on {}", self.id());
            }
            _ => {}
        }
        Ok(())
    }

    /// Scrolls a box by a pointer delta measured along its scrollbar track.
    ///
    /// The delta is scaled by `children_rect extent / track length`, so
    /// moving the pointer by the whole track scrolls by the whole content.
    /// The resulting origin is clamped to
    /// `[0, children_rect extent - viewport extent]`.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if this is not a box.
    pub fn do_scroll(&self, dx: f32, dy: f32) -> UiResult<()> {
        let track = self
            .scrollbar()
            .map(|sb| sb.pos())
            .unwrap_or_else(|| self.pos());
        let mut state = self.box_state_or_err()?;
        let content = state.children_rect;
        let scale = |extent: f32, track: f32| if track > 0.0 { extent / track } else { 0.0 };
        let x = state.scrolled_rect.x + dx * scale(content.width, track.width);
        let y = state.scrolled_rect.y + dy * scale(content.height, track.height);
        state.scroll_to(x, y);
        Ok(())
    }

    /// Scrolls a box by a delta in content pixels, clamped.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if this is not a box.
    pub fn scroll_content_by(&self, dx: f32, dy: f32) -> UiResult<()> {
        let mut state = self.box_state_or_err()?;
        let (x, y) = (state.scrolled_rect.x + dx, state.scrolled_rect.y + dy);
        state.scroll_to(x, y);
        Ok(())
    }

    /// Keeps a box viewport matched to its size after a resize.
    pub(crate) fn resize_viewport(&self, pos: Rect) {
        if let Some(mut state) = self.box_state() {
            state.scrolled_rect.width = pos.width;
            state.scrolled_rect.height = pos.height;
        } else {
            return;
        }
        self.update_children();
    }

    /// Re-runs the box layout. A no-op for anything but a box.
    ///
    /// Visible, unlocked children are placed in list order; the owned
    /// scrollbar is skipped, docked along its edge and moved to the end of
    /// the child list.
    ///
    /// A bottom-to-top or right-to-left stack that outgrows the content area
    /// is shifted back inside it, so `children_rect` covers every child. The
    /// scroll origin moves by the same amount, keeping the anchored end of
    /// the stack in view.
    pub fn update_children(&self) {
        let (layout, padding, gap, scrollbar, viewport) = match self.box_state() {
            Some(state) => (
                state.layout,
                state.padding,
                state.gap,
                state.scrollbar.clone(),
                state.scrolled_rect,
            ),
            None => return,
        };

        let own = self.pos();
        let inset = padding.add(self.frame().map_or(Padding::ZERO, |f| f.inset()));
        let content = Rect::new(0.0, 0.0, own.width, own.height).inset(inset);

        let mut last: Option<Rect> = None;
        let mut start: Option<Point> = None;
        let mut placed = Vec::new();
        for child in self.children() {
            if scrollbar.as_ref().is_some_and(|sb| Arc::ptr_eq(sb, &child)) {
                continue;
            }
            if !child.is_live() || child.is_locked() {
                continue;
            }
            let current = child.pos();
            let rect = layout
                .place(content, (current.width, current.height), last, gap)
                .unwrap_or(current);
            last = Some(rect);
            start = Some(start.map_or(rect.origin(), |s| {
                Point::new(s.x.min(rect.x), s.y.min(rect.y))
            }));
            placed.push((child, current, rect));
        }

        let shift = start.map_or(Point::ZERO, |s| layout.overflow_shift(content, s));
        let mut extent = Point::ZERO;
        for (child, current, rect) in placed {
            let rect = rect.translate(shift.x, shift.y);
            if rect != current {
                child.place(rect);
            }
            extent.x = extent.x.max(rect.right());
            extent.y = extent.y.max(rect.bottom());
        }

        let children_rect = Rect::new(
            0.0,
            0.0,
            (extent.x + inset.right).max(viewport.width),
            (extent.y + inset.bottom).max(viewport.height),
        );

        {
            let Some(mut state) = self.box_state() else {
                return;
            };
            state.children_rect = children_rect;
            let origin = state.scrolled_rect.origin();
            let previous = std::mem::replace(&mut state.overflow_shift, shift);
            state.scroll_to(origin.x + shift.x - previous.x, origin.y + shift.y - previous.y);
        }

        if let Some(scrollbar) = scrollbar {
            self.dock_scrollbar(&scrollbar, own, children_rect, viewport);
        }
    }

    /// Positions the scrollbar along its edge, shows it only while content
    /// overflows, and keeps it topmost.
    fn dock_scrollbar(&self, scrollbar: &Arc<Control>, own: Rect, content: Rect, viewport: Rect) {
        let (axis, thickness) = scrollbar
            .scrollbar_geometry()
            .unwrap_or((Axis::Vertical, 0.0));
        let (rect, overflows) = match axis {
            Axis::Vertical => (
                Rect::new(own.width - thickness, 0.0, thickness, own.height),
                content.height > viewport.height,
            ),
            Axis::Horizontal => (
                Rect::new(0.0, own.height - thickness, own.width, thickness),
                content.width > viewport.width,
            ),
        };
        scrollbar.place(rect);
        if !scrollbar.is_destroyed() {
            scrollbar.set_visible_silent(overflows);
        }

        let mut children = self.children_guard();
        if let Some(index) = children.iter().position(|c| Arc::ptr_eq(c, scrollbar)) {
            if index + 1 != children.len() {
                let sb = children.remove(index);
                children.push(sb);
            }
        }
    }
}

//! Tree structure: attachment, lookup, absolute geometry and hit-testing.

use std::sync::Arc;

use super::{Control, ControlKind};
use crate::error::{UiError, UiResult};
use crate::geometry::{Point, Rect};

impl Control {
    /// Appends `child` as the topmost child.
    ///
    /// The child is detached from any previous parent first. Adding a child
    /// that is already present is a no-op. A box parent re-runs its layout.
    ///
    /// # Errors
    ///
    /// Fails if either control is destroyed, or if `child` is this control
    /// or one of its ancestors.
    pub fn add_child(&self, child: &Arc<Self>) -> UiResult<()> {
        if self.is_destroyed() {
            return Err(UiError::Destroyed(self.id().to_owned()));
        }
        if child.is_destroyed() {
            return Err(UiError::Destroyed(child.id().to_owned()));
        }
        if std::ptr::eq(self, Arc::as_ptr(child)) || child.is_ancestor_of(self) {
            return Err(UiError::CyclicAttach {
                parent: self.id().to_owned(),
                child: child.id().to_owned(),
            });
        }

        if let Some(old) = child.parent() {
            if std::ptr::eq(Arc::as_ptr(&old), self) {
                return Ok(());
            }
            old.remove_child(child);
        }

        {
            let mut children = self.children_guard();
            if !children.iter().any(|c| Arc::ptr_eq(c, child)) {
                children.push(Arc::clone(child));
            }
        }
        child.set_parent(self.weak());
        self.update_children();
        Ok(())
    }

    /// Removes `child` from the child list without destroying it.
    ///
    /// Returns false if `child` was not a child of this control.
    pub fn remove_child(&self, child: &Arc<Self>) -> bool {
        let removed = {
            let mut children = self.children_guard();
            match children.iter().position(|c| Arc::ptr_eq(c, child)) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            if child.parent().is_some_and(|p| std::ptr::eq(Arc::as_ptr(&p), self)) {
                child.set_parent(std::sync::Weak::new());
            }
            self.update_children();
        }
        removed
    }

    /// Returns true if this control is `other` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        let mut current = other.parent();
        while let Some(control) = current {
            if std::ptr::eq(Arc::as_ptr(&control), self) {
                return true;
            }
            current = control.parent();
        }
        false
    }

    /// Depth-first search of the subtree (excluding this control) by id.
    ///
    /// Destroyed controls are skipped.
    #[must_use]
    pub fn find_child(&self, id: &str) -> Option<Arc<Self>> {
        for child in self.children() {
            if child.is_destroyed() {
                continue;
            }
            if child.id() == id {
                return Some(child);
            }
            if let Some(found) = child.find_child(id) {
                return Some(found);
            }
        }
        None
    }

    /// Like [`Control::find_child`] but only returns a control of `kind`.
    #[must_use]
    pub fn find_child_as(&self, id: &str, kind: ControlKind) -> Option<Arc<Self>> {
        self.find_child(id).filter(|c| c.kind() == kind)
    }

    /// Checks that this control is of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] otherwise.
    pub fn expect_kind(&self, kind: ControlKind) -> UiResult<()> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(UiError::KindMismatch {
                id: self.id().to_owned(),
                expected: kind,
                found: self.kind(),
            })
        }
    }

    /// On-screen rectangle.
    ///
    /// The relative position is offset by the parent's on-screen origin and,
    /// unless this control is locked, by the parent's scroll offset; the
    /// result is clipped to the parent's on-screen rectangle. A control
    /// without a parent is placed at its relative position.
    #[must_use]
    pub fn absolute_pos(&self) -> Rect {
        self.placement().1
    }

    /// Returns `(unclipped, clipped)` on-screen rectangles.
    ///
    /// Children are offset from the parent's unclipped origin, so a parent
    /// scrolled partly out of view still places its children correctly.
    pub(crate) fn placement(&self) -> (Rect, Rect) {
        let pos = self.pos();
        let Some(parent) = self.parent() else {
            return (pos, pos);
        };

        let (parent_origin, parent_clip) = parent.placement();
        let mut rect = pos.translate(parent_origin.x, parent_origin.y);
        if !self.is_locked() {
            let offset = parent.scroll_offset();
            rect = rect.translate(-offset.x, -offset.y);
        }
        (rect, rect.clip(&parent_clip))
    }

    /// Topmost live control under `(x, y)`.
    ///
    /// Children are scanned topmost first and the search descends into the
    /// first one containing the point. Without a matching child the control
    /// returns itself if it contains the point. The root never returns
    /// itself, so `None` from the root means the desktop was hit.
    #[must_use]
    pub fn find_child_at(&self, x: f32, y: f32) -> Option<Arc<Self>> {
        for child in self.children().iter().rev() {
            if child.is_live() && child.absolute_pos().contains(x, y) {
                return child.find_child_at(x, y);
            }
        }
        if self.kind() == ControlKind::Root {
            return None;
        }
        if self.absolute_pos().contains(x, y) {
            self.handle()
        } else {
            None
        }
    }

    /// Like [`Control::find_child_at`] with a [`Point`].
    #[must_use]
    pub fn find_child_at_point(&self, point: Point) -> Option<Arc<Self>> {
        self.find_child_at(point.x, point.y)
    }

    /// The control that actually receives events aimed at this one.
    ///
    /// Walks up past proxy and disabled controls. `None` means the event
    /// belongs to the root.
    #[must_use]
    pub fn event_target(&self) -> Option<Arc<Self>> {
        let mut current = self.handle();
        while let Some(control) = current {
            if control.kind() == ControlKind::Root {
                return None;
            }
            if !control.is_proxy() && !control.is_disabled() {
                return Some(control);
            }
            current = control.parent();
        }
        None
    }
}

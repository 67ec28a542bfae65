//! Core control type, flags and kinds.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use crate::geometry::{Point, Rect};
use crate::layout::BoxState;
use crate::render::{FrameDecorator, Surface};
use crate::scrollbar::ScrollbarState;
use crate::signal::Signals;

/// Prefix for ids generated by [`Control::new`].
pub(crate) const DEFAULT_ID_PREFIX: &str = "control";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a process-unique control id.
pub(crate) fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// What a control is. Replaces runtime downcasting: typed operations check
/// the kind and refuse controls of the wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// The manager's root control (the desktop).
    Root,
    /// Plain rectangular container.
    Panel,
    /// Static text.
    Label,
    /// Clickable button.
    Button,
    /// Drop-down selector.
    Combo,
    /// Editable single-line text.
    TextInput,
    /// Auto-layout container.
    Box,
    /// Scrollbar owned by a box.
    Scrollbar,
}

impl ControlKind {
    /// Class tag used by declarative descriptions.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Panel => "panel",
            Self::Label => "label",
            Self::Button => "button",
            Self::Combo => "combo",
            Self::TextInput => "text_input",
            Self::Box => "box",
            Self::Scrollbar => "scrollbar",
        }
    }

    /// Looks a kind up by its class tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [
            Self::Root,
            Self::Panel,
            Self::Label,
            Self::Button,
            Self::Combo,
            Self::TextInput,
            Self::Box,
            Self::Scrollbar,
        ]
        .into_iter()
        .find(|kind| kind.tag() == tag)
    }
}

/// Control state flags (bitfield).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlags(u32);

impl ControlFlags {
    /// Control is drawn and hit-testable.
    pub const VISIBLE: u32 = 1 << 0;
    /// Control ignores its parent's scroll offset.
    pub const LOCKED: u32 = 1 << 1;
    /// Control is hit-testable but forwards events to its nearest non-proxy ancestor.
    pub const PROXY: u32 = 1 << 2;
    /// Control occludes hits but never receives input.
    pub const DISABLED: u32 = 1 << 3;
    /// Control is pending destruction or already torn down.
    pub const DESTROYED: u32 = 1 << 4;

    /// Flags of a freshly created control.
    pub const DEFAULT: Self = Self(Self::VISIBLE);

    /// Returns true if the flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Sets a flag.
    #[inline]
    pub fn set(&mut self, flag: u32) {
        self.0 |= flag;
    }

    /// Clears a flag.
    #[inline]
    pub fn clear(&mut self, flag: u32) {
        self.0 &= !flag;
    }

    /// Sets or clears a flag.
    #[inline]
    pub fn assign(&mut self, flag: u32, on: bool) {
        if on {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-frame update context handed down the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tick {
    /// Last known pointer position.
    pub pointer: Point,
    /// Seconds since the previous tick.
    pub dt: f32,
}

/// Kind-specific state.
pub(crate) enum Role {
    Plain,
    Layout(Mutex<BoxState>),
    Scrollbar(Mutex<ScrollbarState>),
}

/// Mutable per-control fields, guarded together.
#[derive(Debug, Default)]
struct ControlState {
    pos: Rect,
    flags: ControlFlags,
    text: String,
    selection: Option<usize>,
}

/// A node in the retained UI tree.
///
/// Always handled through `Arc<Control>`. The child list is guarded by its
/// own lock, so operations on different controls never contend; iteration
/// works on a snapshot taken under that lock.
pub struct Control {
    id: String,
    kind: ControlKind,
    this: Weak<Control>,
    state: Mutex<ControlState>,
    parent: Mutex<Weak<Control>>,
    children: Mutex<Vec<Arc<Control>>>,
    frame: Mutex<Option<Arc<dyn FrameDecorator>>>,
    signals: Signals,
    pub(crate) role: Role,
}

impl Control {
    /// Creates a detached control with a generated id.
    #[must_use]
    pub fn new(kind: ControlKind, pos: Rect) -> Arc<Self> {
        Self::with_id(generate_id(DEFAULT_ID_PREFIX), kind, pos)
    }

    /// Creates a detached control with the given id.
    ///
    /// A scrollbar created this way has no owning box; every scrollbar
    /// operation on it fails with [`UiError::DetachedScrollbar`](crate::UiError::DetachedScrollbar).
    #[must_use]
    pub fn with_id(id: impl Into<String>, kind: ControlKind, pos: Rect) -> Arc<Self> {
        let role = match kind {
            ControlKind::Box => Role::Layout(Mutex::new(BoxState::new(pos))),
            ControlKind::Scrollbar => Role::Scrollbar(Mutex::new(ScrollbarState::detached())),
            _ => Role::Plain,
        };
        Self::build(id.into(), kind, pos, role)
    }

    pub(crate) fn build(id: String, kind: ControlKind, pos: Rect, role: Role) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id,
            kind,
            this: this.clone(),
            state: Mutex::new(ControlState {
                pos,
                ..ControlState::default()
            }),
            parent: Mutex::new(Weak::new()),
            children: Mutex::new(Vec::new()),
            frame: Mutex::new(None),
            signals: Signals::default(),
            role,
        })
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind tag.
    #[must_use]
    pub const fn kind(&self) -> ControlKind {
        self.kind
    }

    /// Event signals.
    #[must_use]
    pub const fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Returns a strong handle to this control.
    ///
    /// `None` only while the last handle is being dropped.
    #[must_use]
    pub fn handle(&self) -> Option<Arc<Self>> {
        self.this.upgrade()
    }

    /// Position and size relative to the parent.
    #[must_use]
    pub fn pos(&self) -> Rect {
        self.state.lock().pos
    }

    /// Moves or resizes the control.
    ///
    /// A resized box re-lays its children; a control inside a box triggers
    /// the box's layout pass.
    pub fn set_pos(&self, pos: Rect) {
        let resized = {
            let mut state = self.state.lock();
            let old = state.pos;
            state.pos = pos;
            old.width != pos.width || old.height != pos.height
        };
        if resized {
            self.resize_viewport(pos);
        }
        self.notify_parent();
    }

    /// Sets the position without notifying the parent. Used by layout passes.
    pub(crate) fn place(&self, pos: Rect) {
        self.state.lock().pos = pos;
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> ControlFlags {
        self.state.lock().flags
    }

    fn has_flag(&self, flag: u32) -> bool {
        self.state.lock().flags.has(flag)
    }

    /// Returns true if the control is drawn and hit-testable.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.has_flag(ControlFlags::VISIBLE)
    }

    /// Returns true if the control ignores its parent's scroll offset.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.has_flag(ControlFlags::LOCKED)
    }

    /// Returns true if events route past this control to an ancestor.
    #[must_use]
    pub fn is_proxy(&self) -> bool {
        self.has_flag(ControlFlags::PROXY)
    }

    /// Returns true if the control never receives input.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.has_flag(ControlFlags::DISABLED)
    }

    /// Returns true once the control has been handed to the graveyard.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.has_flag(ControlFlags::DESTROYED)
    }

    /// Returns true if the control is visible and not destroyed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        let flags = self.flags();
        flags.has(ControlFlags::VISIBLE) && !flags.has(ControlFlags::DESTROYED)
    }

    /// Shows or hides the control. Destroyed controls stay hidden.
    ///
    /// Hiding or showing a box child re-runs the box layout.
    pub fn set_visible(&self, visible: bool) {
        let changed = {
            let mut state = self.state.lock();
            let visible = visible && !state.flags.has(ControlFlags::DESTROYED);
            let changed = state.flags.has(ControlFlags::VISIBLE) != visible;
            state.flags.assign(ControlFlags::VISIBLE, visible);
            changed
        };
        if changed {
            self.notify_parent();
        }
    }

    /// Shows the control.
    pub fn show(&self) {
        self.set_visible(true);
    }

    /// Hides the control.
    pub fn hide(&self) {
        self.set_visible(false);
    }

    /// Exempts the control from its parent's scroll offset and layout.
    pub fn set_locked(&self, locked: bool) {
        self.state.lock().flags.assign(ControlFlags::LOCKED, locked);
        self.notify_parent();
    }

    /// Makes the control a proxy for its ancestors.
    pub fn set_proxy(&self, proxy: bool) {
        self.state.lock().flags.assign(ControlFlags::PROXY, proxy);
    }

    /// Enables or disables input for the control.
    pub fn set_disabled(&self, disabled: bool) {
        self.state.lock().flags.assign(ControlFlags::DISABLED, disabled);
    }

    /// Sets the visibility flag directly, without a layout pass.
    pub(crate) fn set_visible_silent(&self, visible: bool) {
        self.state.lock().flags.assign(ControlFlags::VISIBLE, visible);
    }

    /// Marks the control destroyed and hidden.
    pub(crate) fn mark_destroyed(&self) {
        let mut state = self.state.lock();
        state.flags.set(ControlFlags::DESTROYED);
        state.flags.clear(ControlFlags::VISIBLE);
    }

    /// Caption or content text.
    #[must_use]
    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    /// Replaces the caption or content text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.state.lock().text = text.into();
    }

    /// Selected item index, for list-like controls.
    #[must_use]
    pub fn selection(&self) -> Option<usize> {
        self.state.lock().selection
    }

    /// Selects an item and fires `selection_change` if it changed.
    pub fn set_selection(&self, index: usize) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.selection != Some(index);
            state.selection = Some(index);
            changed
        };
        if changed {
            if let Some(this) = self.handle() {
                self.signals.selection_change.emit(&this, &index);
            }
        }
    }

    /// Attaches a frame decoration, replacing any previous one.
    pub fn set_frame(&self, frame: Option<Arc<dyn FrameDecorator>>) {
        *self.frame.lock() = frame;
        self.update_children();
    }

    /// The attached frame decoration.
    #[must_use]
    pub fn frame(&self) -> Option<Arc<dyn FrameDecorator>> {
        self.frame.lock().clone()
    }

    /// The parent, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.lock().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: Weak<Self>) {
        *self.parent.lock() = parent;
    }

    /// Snapshot of the child list, bottom-most first.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<Self>> {
        self.children.lock().clone()
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    pub(crate) fn children_guard(&self) -> MutexGuard<'_, Vec<Arc<Self>>> {
        self.children.lock()
    }

    pub(crate) fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    /// Re-runs the parent's layout if the parent is a box.
    pub(crate) fn notify_parent(&self) {
        if let Some(parent) = self.parent() {
            parent.update_children();
        }
    }

    /// Draws the control and its visible children.
    pub fn draw(&self, surface: &mut dyn Surface) {
        if !self.is_live() {
            return;
        }
        let bounds = self.absolute_pos();
        if let Some(frame) = self.frame() {
            frame.draw(surface, self, bounds);
        }
        surface.draw(self, bounds);
        if let Some(thumb) = self.thumb_rect() {
            surface.draw_thumb(self, thumb.clip(&bounds));
        }
        for child in self.children() {
            child.draw(surface);
        }
    }

    /// Per-frame update of the control and its visible children.
    pub fn update(&self, tick: &Tick) {
        if !self.is_live() {
            return;
        }
        if self.kind == ControlKind::Scrollbar {
            self.release_stuck_drag(tick.pointer);
        }
        for child in self.children() {
            child.update(tick);
        }
    }

    /// Breaks every link held by this subtree after it left the tree.
    pub(crate) fn teardown(&self) {
        self.mark_destroyed();
        let children = std::mem::take(&mut *self.children.lock());
        for child in &children {
            child.set_parent(Weak::new());
            child.teardown();
        }
        self.signals.clear_all();
        *self.frame.lock() = None;
        if let Role::Layout(state) = &self.role {
            state.lock().scrollbar = None;
        }
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("pos", &self.pos())
            .field("flags", &self.flags())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Control::new(ControlKind::Label, Rect::ZERO);
        let b = Control::new(ControlKind::Label, Rect::ZERO);

        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("control_"));
    }

    #[test]
    fn test_kind_tags_round_trip() {
        assert_eq!(ControlKind::from_tag("text_input"), Some(ControlKind::TextInput));
        assert_eq!(ControlKind::from_tag("box"), Some(ControlKind::Box));
        assert_eq!(ControlKind::from_tag("window"), None);
    }

    #[test]
    fn test_destroyed_control_cannot_be_shown() {
        let control = Control::new(ControlKind::Panel, Rect::ZERO);
        control.mark_destroyed();
        control.show();

        assert!(!control.is_visible());
        assert!(!control.is_live());
    }

    #[test]
    fn test_selection_change_fires_once() {
        let control = Control::new(ControlKind::Combo, Rect::ZERO);
        let fired = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&fired);
        control.signals().selection_change.connect(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        control.set_selection(2);
        control.set_selection(2);
        control.set_selection(3);

        assert_eq!(fired.load(Ordering::Relaxed), 2);
        assert_eq!(control.selection(), Some(3));
    }
}

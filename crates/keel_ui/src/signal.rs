//! Multicast event signals.
//!
//! A [`Signal`] is an ordered list of listeners. Firing it calls every
//! listener synchronously, in attachment order. The listener list is
//! snapshotted before the first call, so a listener may attach further
//! listeners or touch the tree without deadlocking; those new listeners
//! only see the next firing.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::control::Control;
use crate::event::Event;
use crate::geometry::Point;

/// A signal listener. Receives the control the signal fired on.
pub type Listener<T> = Arc<dyn Fn(&Arc<Control>, &T) + Send + Sync>;

/// An unbounded list of listeners for one kind of notification.
pub struct Signal<T> {
    listeners: Mutex<Vec<Listener<T>>>,
}

impl<T> Signal<T> {
    /// Creates a signal with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Attaches a listener at the end of the list.
    pub fn connect<F>(&self, listener: F)
    where
        F: Fn(&Arc<Control>, &T) + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Returns true if nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Calls every listener with `control` and `arg`.
    pub fn emit(&self, control: &Arc<Control>, arg: &T) {
        let snapshot: Vec<Listener<T>> = self.listeners.lock().clone();
        for listener in &snapshot {
            listener(control, arg);
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("listeners", &self.len()).finish()
    }
}

/// The fixed set of signals every control exposes.
#[derive(Debug, Default)]
pub struct Signals {
    /// The pointer entered the control. Carries the pointer position.
    pub hovered: Signal<Point>,
    /// The pointer left the control. Carries the pointer position.
    pub hover_lost: Signal<Point>,
    /// The control gained keyboard focus.
    pub focused: Signal<()>,
    /// The control lost keyboard focus.
    pub focus_lost: Signal<()>,
    /// Pointer motion routed to this control.
    pub mouse_move: Signal<Event>,
    /// Wheel motion routed to this control.
    pub mouse_wheel: Signal<Event>,
    /// Button release routed to this control.
    pub mouse_up: Signal<Event>,
    /// Button press routed to this control.
    pub mouse_down: Signal<Event>,
    /// Key release while this control has focus.
    pub kbd_up: Signal<Event>,
    /// Key press while this control has focus.
    pub kbd_down: Signal<Event>,
    /// The control's selected item changed. Carries the new index.
    pub selection_change: Signal<usize>,
}

impl Signals {
    /// Detaches every listener from every signal.
    pub fn clear_all(&self) {
        self.hovered.clear();
        self.hover_lost.clear();
        self.focused.clear();
        self.focus_lost.clear();
        self.mouse_move.clear();
        self.mouse_wheel.clear();
        self.mouse_up.clear();
        self.mouse_down.clear();
        self.kbd_up.clear();
        self.kbd_down.clear();
        self.selection_change.clear();
    }
}

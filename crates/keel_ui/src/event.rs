//! Input events fed to the [`Manager`](crate::Manager).
//!
//! The windowing layer translates its native events into [`Event`] values
//! and hands them to `Manager::dispatch` one at a time.

use crate::geometry::Point;

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,
    /// Right mouse button.
    Right,
    /// Middle mouse button (scroll wheel click).
    Middle,
}

/// Keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape key.
    Escape,
    /// Enter/Return key.
    Enter,
    /// Tab key.
    Tab,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Space bar.
    Space,
    /// A printable key, by the character it produces unshifted.
    Char(char),
    /// Function key `F1`..`F12`.
    Function(u8),
}

/// Modifier keys held while a key event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Control key is held.
    pub ctrl: bool,
    /// Alt key is held.
    pub alt: bool,
    /// Super/Command key is held.
    pub super_key: bool,
}

/// A single input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The pointer moved.
    MouseMotion {
        /// Pointer x.
        x: f32,
        /// Pointer y.
        y: f32,
    },
    /// A mouse button was pressed.
    MouseButtonDown {
        /// Pointer x.
        x: f32,
        /// Pointer y.
        y: f32,
        /// Button pressed.
        button: MouseButton,
    },
    /// A mouse button was released.
    MouseButtonUp {
        /// Pointer x.
        x: f32,
        /// Pointer y.
        y: f32,
        /// Button released.
        button: MouseButton,
    },
    /// The wheel turned. Positive `dy` scrolls up, towards the content start.
    MouseWheel {
        /// Horizontal wheel delta.
        dx: f32,
        /// Vertical wheel delta.
        dy: f32,
    },
    /// A key was pressed.
    KeyDown {
        /// Key.
        key: Key,
        /// Modifiers held.
        modifiers: Modifiers,
    },
    /// A key was released.
    KeyUp {
        /// Key.
        key: Key,
        /// Modifiers held.
        modifiers: Modifiers,
    },
}

impl Event {
    /// Returns the pointer position carried by the event, if any.
    ///
    /// Wheel and keyboard events carry none; the manager falls back to the
    /// last known pointer position for those.
    #[must_use]
    pub const fn position(&self) -> Option<Point> {
        match *self {
            Self::MouseMotion { x, y }
            | Self::MouseButtonDown { x, y, .. }
            | Self::MouseButtonUp { x, y, .. } => Some(Point::new(x, y)),
            Self::MouseWheel { .. } | Self::KeyDown { .. } | Self::KeyUp { .. } => None,
        }
    }

    /// Returns true for keyboard events.
    #[must_use]
    pub const fn is_keyboard(&self) -> bool {
        matches!(self, Self::KeyDown { .. } | Self::KeyUp { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_position() {
        let motion = Event::MouseMotion { x: 3.0, y: 4.0 };
        assert_eq!(motion.position(), Some(Point::new(3.0, 4.0)));

        let wheel = Event::MouseWheel { dx: 0.0, dy: 1.0 };
        assert_eq!(wheel.position(), None);

        let key = Event::KeyDown { key: Key::Char('a'), modifiers: Modifiers::default() };
        assert!(key.is_keyboard());
        assert!(!motion.is_keyboard());
    }
}

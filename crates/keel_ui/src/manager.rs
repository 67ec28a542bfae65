//! # Manager
//!
//! Root of the control tree. Owns input dispatch, hover/focus tracking and
//! the graveyard.
//!
//! ## Frame sequence
//!
//! ```text
//! update(dt)  ─▶  sweep graveyard ─▶ idle tick ─▶ tree update
//! dispatch(e) ─▶  hover/focus ─▶ signals ─▶ built-in wiring ─▶ hover again
//! render(s)   ─▶  tree draw
//! ```
//!
//! ## Deferred destruction
//!
//! Handlers run while the tree is being walked, so [`Manager::destroy`]
//! only hides the control and queues it. The next [`Manager::update`]
//! detaches and tears down everything queued.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::UiConfig;
use crate::control::{Control, ControlKind, Tick};
use crate::error::{UiError, UiResult};
use crate::event::Event;
use crate::geometry::{Point, Rect};
use crate::render::Surface;
use crate::scrollbar::{Axis, DragState};
use crate::signal::Signal;

static GLOBAL: Mutex<Option<Arc<Manager>>> = parking_lot::const_mutex(None);

/// Creates the process-wide manager, or returns the existing one.
///
/// `rect` and `config` are ignored if a manager already exists.
pub fn initialize(rect: Rect, config: UiConfig) -> Arc<Manager> {
    let mut global = GLOBAL.lock();
    if let Some(manager) = global.as_ref() {
        return Arc::clone(manager);
    }
    let manager = Arc::new(Manager::new(rect, config));
    *global = Some(Arc::clone(&manager));
    tracing::debug!("manager initialized at {:?}", rect);
    manager
}

/// The process-wide manager, if initialized.
#[must_use]
pub fn global() -> Option<Arc<Manager>> {
    GLOBAL.lock().clone()
}

/// Releases the process-wide manager and returns it.
pub fn shutdown() -> Option<Arc<Manager>> {
    let released = GLOBAL.lock().take();
    if released.is_some() {
        tracing::debug!("manager shut down");
    }
    released
}

/// Ticks and seconds since the last input event.
#[derive(Debug, Default)]
struct IdleClock {
    ticks: u64,
    seconds: f32,
}

/// Tree root and input dispatcher.
pub struct Manager {
    root: Arc<Control>,
    config: UiConfig,
    hovered: Mutex<Weak<Control>>,
    focused: Mutex<Weak<Control>>,
    /// Scrollbar whose thumb was pressed; it receives motion and the
    /// release even when the pointer is elsewhere.
    dragging: Mutex<Weak<Control>>,
    current_event: Mutex<Option<Event>>,
    pointer: Mutex<Point>,
    graveyard: Mutex<Vec<Arc<Control>>>,
    idle: Mutex<IdleClock>,
}

impl Manager {
    /// Creates a manager whose root covers `rect`.
    #[must_use]
    pub fn new(rect: Rect, config: UiConfig) -> Self {
        Self {
            root: Control::with_id("root", ControlKind::Root, rect),
            config,
            hovered: Mutex::new(Weak::new()),
            focused: Mutex::new(Weak::new()),
            dragging: Mutex::new(Weak::new()),
            current_event: Mutex::new(None),
            pointer: Mutex::new(Point::ZERO),
            graveyard: Mutex::new(Vec::new()),
            idle: Mutex::new(IdleClock::default()),
        }
    }

    /// The root control.
    #[must_use]
    pub const fn root(&self) -> &Arc<Control> {
        &self.root
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &UiConfig {
        &self.config
    }

    /// Attaches a top-level control.
    ///
    /// # Errors
    ///
    /// See [`Control::add_child`].
    pub fn add_child(&self, child: &Arc<Control>) -> UiResult<()> {
        self.root.add_child(child)
    }

    /// Finds a control anywhere in the tree by id.
    #[must_use]
    pub fn find_child(&self, id: &str) -> Option<Arc<Control>> {
        self.root.find_child(id)
    }

    /// Topmost live control under `(x, y)`, or `None` for the desktop.
    #[must_use]
    pub fn find_child_at(&self, x: f32, y: f32) -> Option<Arc<Control>> {
        self.root.find_child_at(x, y)
    }

    /// Control under the pointer, if any.
    #[must_use]
    pub fn hovered(&self) -> Option<Arc<Control>> {
        self.hovered.lock().upgrade()
    }

    /// Control receiving keyboard input, if any.
    #[must_use]
    pub fn focused(&self) -> Option<Arc<Control>> {
        self.focused.lock().upgrade()
    }

    /// The event being dispatched. `None` outside of [`Manager::dispatch`].
    #[must_use]
    pub fn current_event(&self) -> Option<Event> {
        *self.current_event.lock()
    }

    /// Last known pointer position.
    #[must_use]
    pub fn pointer(&self) -> Point {
        *self.pointer.lock()
    }

    /// Update ticks since the last input event.
    #[must_use]
    pub fn idle_ticks(&self) -> u64 {
        self.idle.lock().ticks
    }

    /// Seconds since the last input event.
    #[must_use]
    pub fn idle_time(&self) -> f32 {
        self.idle.lock().seconds
    }

    /// Number of controls waiting in the graveyard.
    #[must_use]
    pub fn pending_destruction(&self) -> usize {
        self.graveyard.lock().len()
    }

    /// Moves keyboard focus, firing `focus_lost` and `focused`.
    ///
    /// Proxy and disabled controls pass focus to their nearest eligible
    /// ancestor; destroyed controls clear focus.
    pub fn set_focus(&self, control: Option<&Arc<Control>>) {
        let target = control
            .filter(|c| !c.is_destroyed())
            .and_then(|c| c.event_target());
        Self::transition(&self.focused, target, |old, new| {
            if let Some(old) = old {
                old.signals().focus_lost.emit(old, &());
            }
            if let Some(new) = new {
                tracing::trace!("focus -> {}", new.id());
                new.signals().focused.emit(new, &());
            }
        });
    }

    /// Swaps the control referenced by `slot`, calling `notify` with the
    /// old and new control only when they differ.
    fn transition<F>(slot: &Mutex<Weak<Control>>, new: Option<Arc<Control>>, notify: F)
    where
        F: FnOnce(Option<&Arc<Control>>, Option<&Arc<Control>>),
    {
        let old = {
            let mut slot = slot.lock();
            let old = slot.upgrade();
            let same = match (&old, &new) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if same {
                return;
            }
            *slot = new.as_ref().map_or_else(Weak::new, Arc::downgrade);
            old
        };
        let old = old.filter(|c| !c.is_destroyed());
        notify(old.as_ref(), new.as_ref());
    }

    /// Control that should be hovered at `point`.
    fn hover_target(&self, point: Point) -> Option<Arc<Control>> {
        self.root
            .find_child_at_point(point)
            .filter(|c| c.is_live())
            .and_then(|c| c.event_target())
    }

    /// Recomputes the hovered control at `point`.
    fn refresh_hover(&self, point: Point) {
        let target = self.hover_target(point);
        Self::transition(&self.hovered, target, |old, new| {
            if let Some(old) = old {
                old.signals().hover_lost.emit(old, &point);
            }
            if let Some(new) = new {
                tracing::trace!("hover -> {}", new.id());
                new.signals().hovered.emit(new, &point);
            }
        });
    }

    /// Dispatches one input event.
    ///
    /// Hover is recomputed again after the handlers ran, since they may have
    /// hidden, moved or destroyed controls.
    ///
    /// # Errors
    ///
    /// Propagates defects found by built-in control wiring, such as a
    /// scrollbar that lost its box.
    pub fn dispatch(&self, event: Event) -> UiResult<()> {
        *self.current_event.lock() = Some(event);
        if let Some(point) = event.position() {
            *self.pointer.lock() = point;
        }
        *self.idle.lock() = IdleClock::default();

        let result = self.route(event);

        self.refresh_hover(self.pointer());
        *self.current_event.lock() = None;
        result
    }

    fn route(&self, event: Event) -> UiResult<()> {
        let pointer = self.pointer();
        match event {
            Event::MouseMotion { .. } => {
                self.refresh_hover(pointer);
                let target = self.hovered().filter(|c| c.is_live());
                self.emit(target.as_ref(), event, |c| &c.signals().mouse_move);
                let scrollbar = self
                    .drag_capture()
                    .or_else(|| target.filter(|c| c.kind() == ControlKind::Scrollbar));
                if let Some(sb) = scrollbar {
                    sb.on_mouse_move(pointer)?;
                }
            }
            Event::MouseButtonUp { .. } => {
                self.refresh_hover(pointer);
                let target = self.hovered().filter(|c| c.is_live());
                self.set_focus(target.as_ref());
                self.emit(target.as_ref(), event, |c| &c.signals().mouse_up);
                let captured = self.drag_capture();
                *self.dragging.lock() = Weak::new();
                let hit = target.filter(|c| c.kind() == ControlKind::Scrollbar);
                if let Some(sb) = &hit {
                    sb.on_mouse_up(pointer)?;
                }
                let elsewhere = |c: &Arc<Control>| !hit.as_ref().is_some_and(|h| Arc::ptr_eq(h, c));
                if let Some(sb) = captured.filter(elsewhere) {
                    sb.on_mouse_up(pointer)?;
                }
            }
            Event::MouseButtonDown { .. } => {
                let target = self.hover_target(pointer);
                self.emit(target.as_ref(), event, |c| &c.signals().mouse_down);
                if let Some(sb) = target.filter(|c| c.kind() == ControlKind::Scrollbar) {
                    sb.on_mouse_down(pointer)?;
                    if sb.drag_state() == Some(DragState::Start) {
                        *self.dragging.lock() = Arc::downgrade(&sb);
                    }
                }
            }
            Event::MouseWheel { dx, dy } => {
                let target = self.hover_target(pointer);
                self.emit(target.as_ref(), event, |c| &c.signals().mouse_wheel);
                self.wheel_scroll(pointer, dx, dy)?;
            }
            Event::KeyDown { .. } => {
                if let Some(focused) = self.focused().filter(|c| !c.is_destroyed()) {
                    focused.signals().kbd_down.emit(&focused, &event);
                }
            }
            Event::KeyUp { .. } => {
                if let Some(focused) = self.focused().filter(|c| !c.is_destroyed()) {
                    focused.signals().kbd_up.emit(&focused, &event);
                }
            }
        }
        Ok(())
    }

    /// The scrollbar holding the current thumb drag, if it is still live and
    /// dragging.
    fn drag_capture(&self) -> Option<Arc<Control>> {
        let captured = self.dragging.lock().upgrade()?;
        let active = matches!(captured.drag_state(), Some(DragState::Start | DragState::Dragging));
        (active && captured.is_live()).then_some(captured)
    }

    /// Fires a signal on `target`, or on the root if there is none.
    fn emit<F>(&self, target: Option<&Arc<Control>>, event: Event, signal: F)
    where
        F: Fn(&Control) -> &Signal<Event>,
    {
        let control = target.unwrap_or(&self.root);
        tracing::trace!("{:?} -> {}", event, control.id());
        signal(control.as_ref()).emit(control, &event);
    }

    /// Scrolls the nearest scrolling box at or above the control under `pointer`.
    fn wheel_scroll(&self, pointer: Point, dx: f32, dy: f32) -> UiResult<()> {
        let mut current = self.root.find_child_at_point(pointer);
        while let Some(control) = current {
            if let Some(scrollbar) = control.scrollbar() {
                let step = self.config.wheel_step;
                return match scrollbar.scroll_axis() {
                    Some(Axis::Horizontal) => {
                        let amount = if dx == 0.0 { dy } else { dx };
                        control.scroll_content_by(-amount * step, 0.0)
                    }
                    Some(Axis::Vertical) | None => control.scroll_content_by(0.0, -dy * step),
                };
            }
            current = control.parent();
        }
        Ok(())
    }

    /// Hides `control` now and queues it for teardown on the next update.
    ///
    /// Destroying a control that is already destroyed is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::Orphaned`] if the control has no parent, which
    /// includes the root.
    pub fn destroy(&self, control: &Arc<Control>) -> UiResult<()> {
        if control.is_destroyed() {
            return Ok(());
        }
        let Some(parent) = control.parent() else {
            return Err(UiError::Orphaned(control.id().to_owned()));
        };
        control.mark_destroyed();
        self.graveyard.lock().push(Arc::clone(control));
        parent.update_children();
        tracing::debug!("{} queued for destruction", control.id());
        Ok(())
    }

    /// Detaches and tears down every queued control.
    ///
    /// Returns the number of controls swept.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::Orphaned`] if a queued control was detached from
    /// its parent before the sweep. The rest of the queue is still swept.
    pub fn collect_graveyard(&self) -> UiResult<usize> {
        let pending = std::mem::take(&mut *self.graveyard.lock());
        if pending.is_empty() {
            return Ok(0);
        }

        let mut orphan = None;
        for control in &pending {
            match control.parent() {
                Some(parent) => {
                    parent.remove_child(control);
                }
                None => {
                    tracing::warn!("graveyard found {} without a parent", control.id());
                    orphan.get_or_insert_with(|| control.id().to_owned());
                }
            }
        }
        for control in &pending {
            control.teardown();
        }

        tracing::debug!("graveyard swept {} controls", pending.len());
        match orphan {
            Some(id) => Err(UiError::Orphaned(id)),
            None => Ok(pending.len()),
        }
    }

    /// Runs one update tick: sweep, idle accounting, then the tree update.
    ///
    /// # Errors
    ///
    /// Propagates [`Manager::collect_graveyard`] failures.
    pub fn update(&self, dt: f32) -> UiResult<()> {
        self.collect_graveyard()?;
        {
            let mut idle = self.idle.lock();
            idle.ticks += 1;
            idle.seconds += dt;
        }
        let tick = Tick {
            pointer: self.pointer(),
            dt,
        };
        self.root.update(&tick);
        Ok(())
    }

    /// Draws the whole tree onto `surface`.
    pub fn render(&self, surface: &mut dyn Surface) {
        self.root.draw(surface);
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("root", &self.root.pos())
            .field("children", &self.root.child_count())
            .field("pending_destruction", &self.pending_destruction())
            .finish_non_exhaustive()
    }
}

//! Integration tests for dispatch, layout, scrolling and deferred destruction.

use keel_ui::{
    loader, manager, BoxLayout, Control, ControlKind, DragState, Event, Manager, MouseButton,
    Padding, Point, Rect, Renderer, UiConfig, UiError,
};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

fn new_manager() -> Manager {
    let config = UiConfig {
        scrollbar_thickness: 10.0,
        ..UiConfig::default()
    };
    Manager::new(Rect::new(0.0, 0.0, 800.0, 600.0), config)
}

fn attach(parent: &Arc<Control>, kind: ControlKind, rect: Rect) -> Arc<Control> {
    let control = Control::new(kind, rect);
    parent.add_child(&control).unwrap();
    control
}

/// A 100x100 vbox at the origin holding four 100px rows, scrolling enabled.
fn scrolling_box(manager: &Manager) -> (Arc<Control>, Arc<Control>) {
    let b = attach(manager.root(), ControlKind::Box, Rect::new(0.0, 0.0, 100.0, 100.0));
    b.set_layout(BoxLayout::vbox()).unwrap();
    for _ in 0..4 {
        attach(&b, ControlKind::Panel, Rect::new(0.0, 0.0, 60.0, 100.0));
    }
    b.set_scroll(manager, true).unwrap();
    let scrollbar = b.scrollbar().unwrap();
    (b, scrollbar)
}

fn up(x: f32, y: f32) -> Event {
    Event::MouseButtonUp { x, y, button: MouseButton::Left }
}

#[test]
fn test_vbox_scenario() {
    let manager = new_manager();
    let b = attach(manager.root(), ControlKind::Box, Rect::new(0.0, 0.0, 100.0, 50.0));
    b.set_layout(BoxLayout::vbox()).unwrap();
    b.set_padding(Padding::uniform(4.0)).unwrap();
    b.set_gap(2.0).unwrap();

    let rows: Vec<_> = [10.0, 20.0, 30.0]
        .iter()
        .map(|h| attach(&b, ControlKind::Label, Rect::new(0.0, 0.0, 40.0, *h)))
        .collect();

    let ys: Vec<f32> = rows.iter().map(|r| r.pos().y).collect();
    assert_eq!(ys, vec![4.0, 16.0, 38.0]);
    assert_eq!(b.children_rect().unwrap().height, 72.0);
}

#[test]
fn test_hit_test_z_order_scenario() {
    let manager = new_manager();
    let a = attach(manager.root(), ControlKind::Button, Rect::new(0.0, 0.0, 60.0, 60.0));
    let b = attach(manager.root(), ControlKind::Button, Rect::new(40.0, 40.0, 60.0, 60.0));

    let hit = manager.find_child_at(50.0, 50.0).unwrap();
    assert!(Arc::ptr_eq(&hit, &b));

    manager.dispatch(up(50.0, 50.0)).unwrap();
    assert!(Arc::ptr_eq(&manager.focused().unwrap(), &b));
    assert!(!Arc::ptr_eq(&manager.focused().unwrap(), &a));
}

#[test]
fn test_scrollbar_drag_scenario() {
    let manager = new_manager();
    let (b, scrollbar) = scrolling_box(&manager);
    let track = scrollbar.absolute_pos();

    scrollbar.on_mouse_down(Point::new(95.0, track.y)).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Start));
    scrollbar.on_mouse_move(Point::new(95.0, track.y + track.height)).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Dragging));

    let content = b.children_rect().unwrap();
    let viewport = b.scrolled_rect().unwrap();
    assert_eq!(viewport.y, content.height - viewport.height);

    scrollbar.on_mouse_up(Point::new(400.0, 400.0)).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Stop));
}

#[test]
fn test_dispatched_drag_reaches_end_of_track() {
    let manager = new_manager();
    let (b, scrollbar) = scrolling_box(&manager);
    let track = scrollbar.absolute_pos();

    let last_pixel = manager.find_child_at(95.0, track.y + track.height - 0.5).unwrap();
    assert!(Arc::ptr_eq(&last_pixel, &scrollbar));

    let down = Event::MouseButtonDown { x: 95.0, y: track.y, button: MouseButton::Left };
    manager.dispatch(down).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Start));

    // The far track edge lies just outside the scrollbar rect.
    let motion = Event::MouseMotion { x: 95.0, y: track.y + track.height };
    manager.dispatch(motion).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Dragging));

    let content = b.children_rect().unwrap();
    let viewport = b.scrolled_rect().unwrap();
    assert_eq!(viewport.y, content.height - viewport.height);

    manager.dispatch(up(400.0, 400.0)).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Stop));
}

#[test]
fn test_release_off_scrollbar_ends_drag() {
    let manager = new_manager();
    let (b, scrollbar) = scrolling_box(&manager);

    let down = Event::MouseButtonDown { x: 95.0, y: 2.0, button: MouseButton::Left };
    manager.dispatch(down).unwrap();
    manager.dispatch(Event::MouseMotion { x: 95.0, y: 52.0 }).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Dragging));
    let scrolled = b.scrolled_rect().unwrap().y;
    assert!(scrolled > 0.0);

    manager.dispatch(up(400.0, 400.0)).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Stop));

    // Hovering back over the track without a button held does not scroll.
    manager.dispatch(Event::MouseMotion { x: 95.0, y: 90.0 }).unwrap();
    assert_eq!(b.scrolled_rect().unwrap().y, scrolled);
    manager.dispatch(Event::MouseMotion { x: 400.0, y: 400.0 }).unwrap();
    manager.dispatch(Event::MouseMotion { x: 95.0, y: 5.0 }).unwrap();
    assert_eq!(b.scrolled_rect().unwrap().y, scrolled);
    assert_eq!(scrollbar.drag_state(), Some(DragState::Stop));
}

#[test]
fn test_lost_release_ends_drag_on_update() {
    let manager = new_manager();
    let (_b, scrollbar) = scrolling_box(&manager);

    scrollbar.on_mouse_down(Point::new(95.0, 2.0)).unwrap();
    scrollbar.on_mouse_move(Point::new(95.0, 40.0)).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Dragging));

    manager.dispatch(Event::MouseMotion { x: 400.0, y: 400.0 }).unwrap();
    manager.update(0.016).unwrap();
    assert_eq!(scrollbar.drag_state(), Some(DragState::Stop));
}

#[test]
fn test_destroy_hides_before_sweep_scenario() {
    let manager = new_manager();
    let panel = attach(manager.root(), ControlKind::Panel, Rect::new(0.0, 0.0, 50.0, 50.0));
    let label = attach(&panel, ControlKind::Label, Rect::new(0.0, 0.0, 10.0, 10.0));

    manager.destroy(&panel).unwrap();

    let mut renderer = Renderer::new();
    manager.render(&mut renderer);
    assert!(!renderer.has_drawn(panel.id()));
    assert!(!renderer.has_drawn(label.id()));
    assert!(manager.find_child_at(5.0, 5.0).is_none());
    assert_eq!(manager.root().child_count(), 1);

    manager.update(0.016).unwrap();
    assert_eq!(manager.root().child_count(), 0);
    assert!(label.is_destroyed());
}

#[test]
fn test_hover_exclusivity() {
    let manager = new_manager();
    let panels: Vec<_> = (0..3)
        .map(|i| {
            let x = i as f32 * 30.0;
            attach(manager.root(), ControlKind::Panel, Rect::new(x, 0.0, 40.0, 40.0))
        })
        .collect();

    let balance: Vec<Arc<AtomicI64>> = panels.iter().map(|_| Arc::new(AtomicI64::new(0))).collect();
    for (panel, count) in panels.iter().zip(&balance) {
        let entered = Arc::clone(count);
        panel.signals().hovered.connect(move |_, _| {
            entered.fetch_add(1, Ordering::Relaxed);
        });
        let left = Arc::clone(count);
        panel.signals().hover_lost.connect(move |_, _| {
            left.fetch_sub(1, Ordering::Relaxed);
        });
    }

    let path = [5.0, 35.0, 38.0, 65.0, 95.0, 150.0, 10.0, 70.0, 200.0];
    for x in path {
        manager.dispatch(Event::MouseMotion { x, y: 10.0 }).unwrap();

        let hovered: i64 = balance.iter().map(|c| c.load(Ordering::Relaxed)).sum();
        assert!(balance.iter().all(|c| (0..=1).contains(&c.load(Ordering::Relaxed))));
        assert_eq!(hovered, i64::from(manager.hovered().is_some()));
    }
}

#[test]
fn test_double_destroy_deletes_once() {
    let manager = new_manager();
    let panel = attach(manager.root(), ControlKind::Panel, Rect::new(0.0, 0.0, 50.0, 50.0));
    let other = attach(manager.root(), ControlKind::Panel, Rect::new(60.0, 0.0, 50.0, 50.0));

    manager.destroy(&panel).unwrap();
    manager.destroy(&panel).unwrap();
    manager.update(0.016).unwrap();
    manager.update(0.016).unwrap();

    let children = manager.root().children();
    assert_eq!(children.len(), 1);
    assert!(Arc::ptr_eq(&children[0], &other));
    assert_eq!(manager.pending_destruction(), 0);
}

#[test]
fn test_destroy_from_inside_handler() {
    let manager = Arc::new(new_manager());
    let button = attach(manager.root(), ControlKind::Button, Rect::new(0.0, 0.0, 50.0, 50.0));
    let clicks = Arc::new(AtomicUsize::new(0));

    let weak: Weak<Manager> = Arc::downgrade(&manager);
    let counter = Arc::clone(&clicks);
    button.signals().mouse_up.connect(move |control, _| {
        counter.fetch_add(1, Ordering::Relaxed);
        if let Some(manager) = weak.upgrade() {
            manager.destroy(control).unwrap();
        }
    });

    manager.dispatch(up(10.0, 10.0)).unwrap();
    assert_eq!(clicks.load(Ordering::Relaxed), 1);
    assert!(manager.hovered().is_none());

    manager.dispatch(up(10.0, 10.0)).unwrap();
    assert_eq!(clicks.load(Ordering::Relaxed), 1);

    manager.update(0.016).unwrap();
    assert!(manager.find_child(button.id()).is_none());
}

#[test]
fn test_absolute_pos_containment() {
    let manager = new_manager();
    let outer = attach(manager.root(), ControlKind::Box, Rect::new(20.0, 20.0, 200.0, 150.0));
    outer.set_layout(BoxLayout::vbox()).unwrap();
    outer.set_scroll(&manager, true).unwrap();

    let mut leaves = Vec::new();
    for row in 0..5 {
        let inner = attach(&outer, ControlKind::Box, Rect::new(0.0, 0.0, 180.0, 60.0));
        inner.set_layout(BoxLayout::hbox()).unwrap();
        inner.set_gap(4.0).unwrap();
        for _ in 0..=row {
            leaves.push(attach(&inner, ControlKind::Label, Rect::new(0.0, 0.0, 50.0, 30.0)));
        }
    }
    outer.scroll_content_by(0.0, 90.0).unwrap();

    assert_eq!(manager.root().absolute_pos(), manager.root().pos());
    let mut stack = vec![Arc::clone(manager.root())];
    while let Some(control) = stack.pop() {
        let bounds = control.absolute_pos();
        for child in control.children() {
            assert!(bounds.contains_rect(&child.absolute_pos()), "{} escapes {}", child.id(), control.id());
            stack.push(child);
        }
    }
}

#[test]
fn test_wheel_scrolls_nearest_box() {
    let manager = new_manager();
    let (b, _scrollbar) = scrolling_box(&manager);

    manager.dispatch(Event::MouseMotion { x: 20.0, y: 20.0 }).unwrap();
    manager.dispatch(Event::MouseWheel { dx: 0.0, dy: -1.0 }).unwrap();
    assert_eq!(b.scrolled_rect().unwrap().y, 20.0);

    manager.dispatch(Event::MouseWheel { dx: 0.0, dy: 50.0 }).unwrap();
    assert_eq!(b.scrolled_rect().unwrap().y, 0.0);
}

#[test]
fn test_scrollbar_shown_only_on_overflow() {
    let manager = new_manager();
    let b = attach(manager.root(), ControlKind::Box, Rect::new(0.0, 0.0, 100.0, 100.0));
    b.set_layout(BoxLayout::vbox()).unwrap();
    b.set_scroll(&manager, true).unwrap();
    let scrollbar = b.scrollbar().unwrap();
    assert!(!scrollbar.is_visible());

    let tall = attach(&b, ControlKind::Panel, Rect::new(0.0, 0.0, 50.0, 150.0));
    assert!(scrollbar.is_visible());
    assert!(Arc::ptr_eq(b.children().last().unwrap(), &scrollbar));

    tall.hide();
    assert!(!scrollbar.is_visible());
}

#[test]
fn test_disabling_scroll_sends_scrollbar_to_graveyard() {
    let manager = new_manager();
    let (b, scrollbar) = scrolling_box(&manager);
    b.scroll_content_by(0.0, 100.0).unwrap();

    b.set_scroll(&manager, false).unwrap();
    assert!(b.scrollbar().is_none());
    assert_eq!(b.scroll_offset(), Point::ZERO);
    assert!(scrollbar.is_destroyed());

    manager.update(0.016).unwrap();
    assert_eq!(b.child_count(), 4);
    assert!(scrollbar.parent().is_none());

    let panel = Control::new(ControlKind::Panel, Rect::ZERO);
    assert!(matches!(panel.set_scroll(&manager, true), Err(UiError::KindMismatch { .. })));
}

#[test]
fn test_proxy_label_routes_to_button() {
    let manager = new_manager();
    let button = attach(manager.root(), ControlKind::Button, Rect::new(0.0, 0.0, 80.0, 30.0));
    let caption = attach(&button, ControlKind::Label, Rect::new(5.0, 5.0, 40.0, 20.0));
    caption.set_proxy(true);

    manager.dispatch(Event::MouseMotion { x: 10.0, y: 10.0 }).unwrap();
    assert!(Arc::ptr_eq(&manager.hovered().unwrap(), &button));

    caption.set_proxy(false);
    caption.set_disabled(true);
    manager.dispatch(up(10.0, 10.0)).unwrap();
    assert!(Arc::ptr_eq(&manager.focused().unwrap(), &button));
}

#[test]
fn test_loaded_screen_scrolls() {
    let manager = new_manager();
    let screen = loader::load_screen(
        &manager,
        r#"
        class = "box"
        id = "list"
        rect = [0.0, 0.0, 120.0, 40.0]
        box_type = "vbox"
        scroll = true

        [[children]]
        class = "button"
        size = [100.0, 30.0]

        [[children]]
        class = "button"
        size = [100.0, 30.0]
        "#,
    )
    .unwrap();

    assert!(screen.scrollbar().unwrap().is_visible());
    assert_eq!(screen.children_rect().unwrap().height, 60.0);
}

#[test]
fn test_global_manager_lifecycle() {
    let first = manager::initialize(Rect::new(0.0, 0.0, 320.0, 240.0), UiConfig::default());
    let second = manager::initialize(Rect::new(0.0, 0.0, 1.0, 1.0), UiConfig::default());
    assert!(Arc::ptr_eq(&first, &second));
    assert!(manager::global().is_some());

    let released = manager::shutdown().unwrap();
    assert!(Arc::ptr_eq(&released, &first));
    assert!(manager::global().is_none());
}

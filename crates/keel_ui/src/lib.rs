//! # KEEL UI
//!
//! Retained-mode control tree: hit-tested input dispatch, hover and focus
//! tracking, vbox/hbox layout with scrolling, and deferred destruction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       UI PIPELINE                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  Input Event → Manager → Hit Test → Signals → Box Layout │
//! │       ↓           ↓          ↓          ↓          ↓     │
//! │  Pointer/Idle  Hover/Focus  Proxies  Handlers  Scrolling │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frame loop
//!
//! ```rust,ignore
//! let manager = Manager::new(Rect::new(0.0, 0.0, 1280.0, 720.0), UiConfig::default());
//! loader::load_screen(&manager, SCREEN)?;
//!
//! for event in input {
//!     manager.dispatch(event)?;
//! }
//! manager.update(dt)?;
//! manager.render(&mut renderer);
//! ```
//!
//! Controls handed to [`Manager::destroy`] disappear from rendering and
//! hit-testing at once; their memory is released on the next
//! [`Manager::update`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod control;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod loader;
pub mod manager;
pub mod render;
pub mod scrollbar;
pub mod signal;

pub use config::UiConfig;
pub use control::{Control, ControlFlags, ControlKind, Tick};
pub use error::{UiError, UiResult};
pub use event::{Event, Key, Modifiers, MouseButton};
pub use geometry::{Padding, Point, Rect};
pub use layout::{BoxKind, BoxLayout, HAlign, VAlign};
pub use loader::ControlDesc;
pub use manager::Manager;
pub use render::{BorderFrame, FrameDecorator, RenderCommand, Renderer, Surface};
pub use scrollbar::{Axis, DragState};
pub use signal::{Signal, Signals};

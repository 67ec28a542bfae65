//! Render-surface capability.
//!
//! The tree never owns pixels. During a draw pass every live control hands
//! its on-screen rectangle to a [`Surface`]; the surface decides what that
//! means. [`Renderer`] is a surface that records commands for a backend to
//! batch later.

use crate::control::{Control, ControlKind};
use crate::geometry::{Padding, Rect};

/// Something controls can be drawn onto.
pub trait Surface {
    /// Draws `control` at its on-screen rectangle.
    fn draw(&mut self, control: &Control, bounds: Rect);

    /// Draws the thumb of a scrollbar.
    fn draw_thumb(&mut self, scrollbar: &Control, thumb: Rect) {
        let _ = (scrollbar, thumb);
    }

    /// Draws a frame decoration around `control`.
    fn draw_frame(&mut self, control: &Control, bounds: Rect, inset: Padding) {
        let _ = (control, bounds, inset);
    }
}

/// Frame decoration held by a control.
///
/// A decorated box lays its children out inside the frame inset.
pub trait FrameDecorator: Send + Sync {
    /// Space the frame takes on each side.
    fn inset(&self) -> Padding;

    /// Draws the frame. The default forwards to [`Surface::draw_frame`].
    fn draw(&self, surface: &mut dyn Surface, control: &Control, bounds: Rect) {
        surface.draw_frame(control, bounds, self.inset());
    }
}

/// A uniform border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderFrame {
    /// Border width on every side.
    pub width: f32,
}

impl FrameDecorator for BorderFrame {
    fn inset(&self) -> Padding {
        Padding::uniform(self.width)
    }
}

/// A recorded draw request.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// A control body.
    Control {
        /// Control id.
        id: String,
        /// Control kind.
        kind: ControlKind,
        /// On-screen bounds.
        bounds: Rect,
    },
    /// A scrollbar thumb.
    Thumb {
        /// Scrollbar id.
        id: String,
        /// On-screen thumb bounds.
        bounds: Rect,
    },
    /// A frame decoration.
    Frame {
        /// Decorated control id.
        id: String,
        /// On-screen bounds.
        bounds: Rect,
        /// Frame inset.
        inset: Padding,
    },
}

impl RenderCommand {
    /// Id of the control the command belongs to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Control { id, .. } | Self::Thumb { id, .. } | Self::Frame { id, .. } => id,
        }
    }
}

/// Surface that records one frame of commands.
#[derive(Debug, Default)]
pub struct Renderer {
    commands: Vec<RenderCommand>,
}

impl Renderer {
    /// Creates a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(256),
        }
    }

    /// Begins a new frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
    }

    /// Ends the frame and hands over its commands.
    pub fn end_frame(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Commands recorded so far this frame.
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Returns the total command count.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if the control with `id` was drawn this frame.
    #[must_use]
    pub fn has_drawn(&self, id: &str) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, RenderCommand::Control { .. }) && c.id() == id)
    }
}

impl Surface for Renderer {
    fn draw(&mut self, control: &Control, bounds: Rect) {
        self.commands.push(RenderCommand::Control {
            id: control.id().to_owned(),
            kind: control.kind(),
            bounds,
        });
    }

    fn draw_thumb(&mut self, scrollbar: &Control, thumb: Rect) {
        self.commands.push(RenderCommand::Thumb {
            id: scrollbar.id().to_owned(),
            bounds: thumb,
        });
    }

    fn draw_frame(&mut self, control: &Control, bounds: Rect, inset: Padding) {
        self.commands.push(RenderCommand::Frame {
            id: control.id().to_owned(),
            bounds,
            inset,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_renderer_frame() {
        let root = Control::new(ControlKind::Panel, Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = Control::new(ControlKind::Label, Rect::new(10.0, 10.0, 20.0, 20.0));
        root.add_child(&child).unwrap();

        let mut renderer = Renderer::new();
        renderer.begin_frame();
        root.draw(&mut renderer);

        assert_eq!(renderer.command_count(), 2);
        assert!(renderer.has_drawn(child.id()));

        let commands = renderer.end_frame();
        assert_eq!(commands.len(), 2);
        assert_eq!(renderer.command_count(), 0);
    }

    #[test]
    fn test_hidden_subtree_not_drawn() {
        let root = Control::new(ControlKind::Panel, Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = Control::new(ControlKind::Panel, Rect::new(0.0, 0.0, 50.0, 50.0));
        let grandchild = Control::new(ControlKind::Label, Rect::new(0.0, 0.0, 10.0, 10.0));
        root.add_child(&child).unwrap();
        child.add_child(&grandchild).unwrap();
        child.hide();

        let mut renderer = Renderer::new();
        root.draw(&mut renderer);

        assert!(!renderer.has_drawn(child.id()));
        assert!(!renderer.has_drawn(grandchild.id()));
    }

    #[test]
    fn test_frame_drawn_before_body() {
        let panel = Control::new(ControlKind::Panel, Rect::new(0.0, 0.0, 40.0, 40.0));
        panel.set_frame(Some(Arc::new(BorderFrame { width: 2.0 })));

        let mut renderer = Renderer::new();
        panel.draw(&mut renderer);
        let commands = renderer.end_frame();

        assert!(matches!(commands[0], RenderCommand::Frame { .. }));
        assert!(matches!(commands[1], RenderCommand::Control { .. }));
    }
}

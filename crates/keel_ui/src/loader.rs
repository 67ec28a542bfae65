//! Declarative construction of control subtrees.
//!
//! A screen is described as nested tables:
//!
//! ```toml
//! class = "box"
//! id = "inventory"
//! rect = [10.0, 10.0, 200.0, 120.0]
//! box_type = "vbox"
//! padding = [4.0, 4.0, 4.0, 4.0]
//! gap = 2.0
//! scroll = true
//!
//! [[children]]
//! class = "label"
//! size = [100.0, 20.0]
//! text = "Items"
//! ```
//!
//! A node is placed either by `rect` or by `size` plus an optional
//! `position`. Every node needs a `class`.

use std::sync::Arc;

use serde::Deserialize;

use crate::control::{generate_id, Control, ControlKind, DEFAULT_ID_PREFIX};
use crate::error::{UiError, UiResult};
use crate::geometry::{Padding, Rect};
use crate::layout::{BoxKind, BoxLayout, HAlign, VAlign};
use crate::manager::Manager;

/// One node of a declarative screen description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlDesc {
    /// Class tag, e.g. `"button"` or `"box"`.
    pub class: Option<String>,
    /// Explicit id. Generated when absent.
    pub id: Option<String>,
    /// `[x, y, width, height]`, relative to the parent.
    pub rect: Option<[f32; 4]>,
    /// `[width, height]`, used when `rect` is absent.
    pub size: Option<[f32; 2]>,
    /// `[x, y]`, used with `size`. Defaults to the parent's origin.
    pub position: Option<[f32; 2]>,
    /// Initial visibility. Controls start visible.
    pub visible: Option<bool>,
    /// Exempt from the parent's scroll offset and layout.
    pub locked: bool,
    /// Forward events to the nearest non-proxy ancestor.
    pub proxy: bool,
    /// Never receive input.
    pub disabled: bool,
    /// Caption or content text.
    pub text: Option<String>,
    /// Box layout kind: `none`, `vbox` or `hbox`.
    pub box_type: Option<String>,
    /// Box horizontal alignment: `left`, `center` or `right`.
    pub h_align: Option<String>,
    /// Box vertical alignment: `top`, `center` or `bottom`.
    pub v_align: Option<String>,
    /// Box padding as `[left, top, right, bottom]`.
    pub padding: Option<[f32; 4]>,
    /// Box gap between stacked children.
    pub gap: Option<f32>,
    /// Enables box scrolling.
    pub scroll: bool,
    /// Child nodes, bottom-most first.
    pub children: Vec<ControlDesc>,
}

impl ControlDesc {
    /// Returns true if the node sets any box-only property.
    fn has_box_properties(&self) -> bool {
        self.box_type.is_some()
            || self.h_align.is_some()
            || self.v_align.is_some()
            || self.padding.is_some()
            || self.gap.is_some()
            || self.scroll
    }

    /// Resolves the node's rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::MissingGeometry`] if neither `rect` nor `size` is set.
    pub fn geometry(&self) -> UiResult<Rect> {
        if let Some([x, y, width, height]) = self.rect {
            return Ok(Rect::new(x, y, width, height));
        }
        let Some([width, height]) = self.size else {
            let name = self.id.clone().or_else(|| self.class.clone()).unwrap_or_default();
            return Err(UiError::MissingGeometry(name));
        };
        let [x, y] = self.position.unwrap_or([0.0, 0.0]);
        Ok(Rect::new(x, y, width, height))
    }
}

/// Maps a class tag to a constructible kind.
fn class_kind(tag: &str) -> UiResult<ControlKind> {
    match ControlKind::from_tag(tag) {
        Some(ControlKind::Scrollbar) => Err(UiError::DetachedScrollbar(tag.to_owned())),
        Some(ControlKind::Root) | None => Err(UiError::UnknownClass(tag.to_owned())),
        Some(kind) => Ok(kind),
    }
}

/// Creates a detached control of the class named by `tag`.
///
/// # Errors
///
/// Returns [`UiError::UnknownClass`] for unknown tags and for `root`, and
/// [`UiError::DetachedScrollbar`] for `scrollbar`, which only a box can create.
pub fn create_control(tag: &str, rect: Rect) -> UiResult<Arc<Control>> {
    let kind = class_kind(tag)?;
    Ok(Control::with_id(generate_id(DEFAULT_ID_PREFIX), kind, rect))
}

impl Control {
    /// Applies the properties of `desc` to this control. Children are not
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::KindMismatch`] if box properties are set on
    /// anything but a box, and the parse or layout error of a bad
    /// `box_type`/alignment combination.
    pub fn load(&self, manager: &Manager, desc: &ControlDesc) -> UiResult<()> {
        if let Some(visible) = desc.visible {
            self.set_visible(visible);
        }
        if desc.locked {
            self.set_locked(true);
        }
        self.set_proxy(desc.proxy);
        self.set_disabled(desc.disabled);
        if let Some(text) = &desc.text {
            self.set_text(text.as_str());
        }

        if !desc.has_box_properties() {
            return Ok(());
        }
        self.expect_kind(ControlKind::Box)?;

        let current = self.layout().unwrap_or_default();
        let kind = desc
            .box_type
            .as_deref()
            .map_or(Ok(current.kind()), BoxKind::from_tag)?;
        let h_align = desc
            .h_align
            .as_deref()
            .map_or(Ok(current.h_align()), HAlign::from_tag)?;
        let v_align = desc
            .v_align
            .as_deref()
            .map_or(Ok(current.v_align()), VAlign::from_tag)?;
        self.set_layout(BoxLayout::new(kind, h_align, v_align)?)?;

        if let Some([left, top, right, bottom]) = desc.padding {
            self.set_padding(Padding::new(left, top, right, bottom))?;
        }
        if let Some(gap) = desc.gap {
            self.set_gap(gap)?;
        }
        if desc.scroll {
            self.set_scroll(manager, true)?;
        }
        Ok(())
    }
}

/// Builds the subtree described by `desc` and attaches it to `parent`.
///
/// Nodes without an id get one generated from the manager's `id_prefix`.
///
/// # Errors
///
/// Fails on the first node that is missing its class or geometry, names an
/// unknown class, or carries invalid properties. Nodes built before the
/// failure stay attached.
pub fn build(manager: &Manager, parent: &Arc<Control>, desc: &ControlDesc) -> UiResult<Arc<Control>> {
    let tag = desc.class.as_deref().ok_or(UiError::MissingClass)?;
    let kind = class_kind(tag)?;
    let rect = desc.geometry()?;
    let id = desc
        .id
        .clone()
        .unwrap_or_else(|| generate_id(&manager.config().id_prefix));

    let control = Control::with_id(id, kind, rect);
    control.load(manager, desc)?;
    parent.add_child(&control)?;

    for child in &desc.children {
        build(manager, &control, child)?;
    }
    Ok(control)
}

/// Parses a screen description.
///
/// # Errors
///
/// Returns [`UiError::Parse`] for malformed TOML.
pub fn from_toml(source: &str) -> UiResult<ControlDesc> {
    Ok(toml::from_str(source)?)
}

/// Parses a screen description and builds it under the manager's root.
///
/// # Errors
///
/// See [`from_toml`] and [`build`].
pub fn load_screen(manager: &Manager, source: &str) -> UiResult<Arc<Control>> {
    let desc = from_toml(source)?;
    let control = build(manager, manager.root(), &desc)?;
    tracing::debug!("screen {} loaded", control.id());
    Ok(control)
}

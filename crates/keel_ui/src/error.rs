//! # UI Error Types
//!
//! Every error here is a configuration or programming defect. None of them
//! is retried: they propagate up to whatever builds the owning screen.

use thiserror::Error;

use crate::control::ControlKind;
use crate::layout::{BoxKind, HAlign, VAlign};

/// Errors raised by the control tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    /// A box was configured with an alignment its layout kind cannot honour.
    #[error("unsupported alignment for {kind:?} box: h_align={h_align:?}, v_align={v_align:?}")]
    UnsupportedAlignment {
        /// Layout kind.
        kind: BoxKind,
        /// Requested horizontal alignment.
        h_align: HAlign,
        /// Requested vertical alignment.
        v_align: VAlign,
    },

    /// The declarative loader saw a class tag it cannot build.
    #[error("unknown control class: {0}")]
    UnknownClass(String),

    /// A declarative description has no class tag.
    #[error("control description is missing its class tag")]
    MissingClass,

    /// A declarative description has neither `rect` nor `size`.
    #[error("control description for {0} has no rect or size")]
    MissingGeometry(String),

    /// A scrollbar lost its owning box.
    #[error("scrollbar {0} has no owning box")]
    DetachedScrollbar(String),

    /// A control pending destruction, or asked to be destroyed, has no parent.
    #[error("control {0} has no parent")]
    Orphaned(String),

    /// Attaching the child would make a control its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    CyclicAttach {
        /// Would-be parent id.
        parent: String,
        /// Would-be child id.
        child: String,
    },

    /// The control has already been destroyed.
    #[error("control {0} is destroyed")]
    Destroyed(String),

    /// A typed operation was applied to the wrong kind of control.
    #[error("control {id} is a {found:?}, expected {expected:?}")]
    KindMismatch {
        /// Control id.
        id: String,
        /// Kind the operation needs.
        expected: ControlKind,
        /// Actual kind.
        found: ControlKind,
    },

    /// A declarative property has a value outside its vocabulary.
    #[error("invalid value {value:?} for property {property}")]
    InvalidProperty {
        /// Property name.
        property: &'static str,
        /// Offending value.
        value: String,
    },

    /// A TOML document failed to parse.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for UiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for control tree operations.
pub type UiResult<T> = Result<T, UiError>;

//! The control tree.
//!
//! Controls are shared, reference-counted nodes. A parent owns its children
//! through its child list; the back-reference to the parent is weak.

mod core;
mod tree;

pub use self::core::{Control, ControlFlags, ControlKind, Tick};
pub(crate) use self::core::{generate_id, Role, DEFAULT_ID_PREFIX};

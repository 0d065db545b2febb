//! Diagram modeling on top of the command stack.
//!
//! Reference collaborators for the editor core: a [`Canvas`] holding shapes and the active
//! root, shape command handlers, the [`Modeling`] facade, and behaviors such as
//! [`RootElementsBehavior`] that track state along the command timeline.

pub mod behaviors;
pub mod canvas;
pub mod context;
pub mod editor;
pub mod handlers;
pub mod modeling;
pub mod resize;

pub use behaviors::RootElementsBehavior;
pub use canvas::{Canvas, Shape, SharedCanvas};
pub use editor::Editor;
pub use modeling::{CREATE_SHAPE, MOVE_SHAPE, Modeling, RESIZE_SHAPE};
pub use resize::{BoundsUpdate, Direction, resize_bounds};

//! Command handlers for shape editing.

mod create_shape;
mod move_shape;
mod resize_shape;

pub use create_shape::CreateShapeHandler;
pub use move_shape::MoveShapeHandler;
pub use resize_shape::ResizeShapeHandler;

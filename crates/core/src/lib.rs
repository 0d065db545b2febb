//! Diagram model building blocks.
//!
//! This crate contains **pure model** primitives (no event or command concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::ElementId;
pub use value_object::{Bounds, Delta, ValueObject};

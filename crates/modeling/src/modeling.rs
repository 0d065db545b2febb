//! High-level editing API.

use std::rc::Rc;

use serde_json::json;

use draftboard_commands::{CommandError, CommandStack, Execution};
use draftboard_core::{Bounds, Delta, ElementId};

use crate::canvas::SharedCanvas;
use crate::handlers::{CreateShapeHandler, MoveShapeHandler, ResizeShapeHandler};
use crate::resize::BoundsUpdate;

pub const CREATE_SHAPE: &str = "shape.create";
pub const MOVE_SHAPE: &str = "shape.move";
pub const RESIZE_SHAPE: &str = "shape.resize";

/// Builds command contexts and executes them on the stack.
#[derive(Debug, Clone)]
pub struct Modeling {
    stack: Rc<CommandStack>,
}

impl Modeling {
    pub fn new(stack: Rc<CommandStack>) -> Self {
        Self { stack }
    }

    /// Register the shape handlers on `stack`.
    pub fn register_handlers(stack: &CommandStack, canvas: &SharedCanvas) -> Result<(), CommandError> {
        stack.register_handler(CREATE_SHAPE, CreateShapeHandler::new(Rc::clone(canvas)))?;
        stack.register_handler(MOVE_SHAPE, MoveShapeHandler::new(Rc::clone(canvas)))?;
        stack.register_handler(RESIZE_SHAPE, ResizeShapeHandler::new(Rc::clone(canvas)))?;
        Ok(())
    }

    pub fn command_stack(&self) -> &Rc<CommandStack> {
        &self.stack
    }

    /// Create a shape under `parent` (the active root when `None`).
    ///
    /// Returns the new id, or `None` when the create was vetoed or its failure was
    /// swallowed by an error listener.
    pub fn create_shape(
        &self,
        id: Option<ElementId>,
        bounds: Bounds,
        parent: Option<&ElementId>,
    ) -> Result<Option<ElementId>, CommandError> {
        let id = id.unwrap_or_else(ElementId::generate);
        let mut context = json!({ "shape": { "id": id, "bounds": bounds } });
        if let Some(parent) = parent {
            context["parent"] = json!(parent);
        }
        match self.stack.execute(CREATE_SHAPE, context)? {
            Execution::Applied => Ok(Some(id)),
            Execution::Vetoed | Execution::Recovered => Ok(None),
        }
    }

    pub fn move_shape(&self, shape: &ElementId, delta: Delta) -> Result<Execution, CommandError> {
        self.stack
            .execute(MOVE_SHAPE, json!({ "shape": shape, "delta": delta }))
    }

    pub fn resize_shape(
        &self,
        shape: &ElementId,
        new_bounds: impl Into<BoundsUpdate>,
    ) -> Result<Execution, CommandError> {
        self.stack.execute(
            RESIZE_SHAPE,
            json!({ "shape": shape, "newBounds": new_bounds.into() }),
        )
    }
}

use serde_json::{Value, json};

use draftboard_commands::{CommandHandler, CommandStack, HandlerResult};
use draftboard_core::{Delta, ElementId};

use crate::canvas::SharedCanvas;
use crate::context::read;
use crate::modeling::MOVE_SHAPE;

/// Moves a shape by a delta, carrying its children along.
///
/// Context: `{ "shape", "delta" }`. Children are moved by nested `shape.move` commands
/// issued from `post_execute`, so they land in the same undo step and each is recorded
/// (and replayed) on its own.
#[derive(Debug, Clone)]
pub struct MoveShapeHandler {
    canvas: SharedCanvas,
}

impl MoveShapeHandler {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self { canvas }
    }

    fn translate(&self, context: &Value, invert: bool) -> HandlerResult<Vec<ElementId>> {
        let id: ElementId = read(context, "shape")?;
        let mut delta: Delta = read(context, "delta")?;
        if invert {
            delta = delta.inverse()?;
        }

        let mut canvas = self.canvas.borrow_mut();
        let bounds = canvas.bounds(&id)?.translate(delta)?;
        canvas.set_bounds(&id, bounds)?;
        Ok(vec![id])
    }
}

impl CommandHandler for MoveShapeHandler {
    fn can_execute(&self, context: &Value) -> bool {
        read::<Delta>(context, "delta").is_ok_and(|delta| !delta.is_zero())
    }

    fn execute(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>> {
        self.translate(context, false)
    }

    fn post_execute(&self, stack: &CommandStack, context: &mut Value) -> HandlerResult<()> {
        let id: ElementId = read(context, "shape")?;
        let delta: Delta = read(context, "delta")?;
        let children = self.canvas.borrow().children(&id);

        for child in children {
            stack.execute(MOVE_SHAPE, json!({ "shape": child, "delta": delta }))?;
        }
        Ok(())
    }

    fn revert(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>> {
        self.translate(context, true)
    }
}

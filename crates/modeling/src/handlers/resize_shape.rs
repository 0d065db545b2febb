use serde_json::Value;

use draftboard_commands::{CommandHandler, HandlerResult};
use draftboard_core::{Bounds, ElementId};

use crate::canvas::SharedCanvas;
use crate::context::{read, write};
use crate::resize::BoundsUpdate;

/// Changes the bounds of a shape.
///
/// Context: `{ "shape", "newBounds" }` where `newBounds` may be partial. The previous bounds
/// are stashed as `oldBounds` for revert.
#[derive(Debug, Clone)]
pub struct ResizeShapeHandler {
    canvas: SharedCanvas,
}

impl ResizeShapeHandler {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self { canvas }
    }
}

impl CommandHandler for ResizeShapeHandler {
    /// Refuses updates that would leave the shape with a negative size.
    fn can_execute(&self, context: &Value) -> bool {
        let (Ok(id), Ok(update)) = (
            read::<ElementId>(context, "shape"),
            read::<BoundsUpdate>(context, "newBounds"),
        ) else {
            return true;
        };
        match self.canvas.borrow().bounds(&id) {
            Ok(current) => update.apply_to(current).validate().is_ok(),
            Err(_) => true,
        }
    }

    fn execute(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>> {
        let id: ElementId = read(context, "shape")?;
        let update: BoundsUpdate = read(context, "newBounds")?;

        let mut canvas = self.canvas.borrow_mut();
        let old = canvas.bounds(&id)?;
        canvas.set_bounds(&id, update.apply_to(old))?;
        drop(canvas);

        write(context, "oldBounds", &old)?;
        Ok(vec![id])
    }

    fn revert(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>> {
        let id: ElementId = read(context, "shape")?;
        let old: Bounds = read(context, "oldBounds")?;
        self.canvas.borrow_mut().set_bounds(&id, old)?;
        Ok(vec![id])
    }
}

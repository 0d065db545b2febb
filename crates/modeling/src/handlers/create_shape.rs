use serde::{Deserialize, Serialize};
use serde_json::Value;

use draftboard_commands::{CommandHandler, HandlerResult};
use draftboard_core::{Bounds, ElementId};
use draftboard_events::ListenerError;

use crate::canvas::{Shape, SharedCanvas};
use crate::context::{read, read_opt, write};

/// `context.shape` of a create command.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShapeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ElementId>,
    bounds: Bounds,
}

/// Adds a shape to the canvas.
///
/// Context: `{ "shape": { "id"?, "bounds" }, "parent"? }`. A missing id is generated and a
/// missing parent defaults to the active root; both are written back so a redo recreates
/// the same element in the same place.
#[derive(Debug, Clone)]
pub struct CreateShapeHandler {
    canvas: SharedCanvas,
}

impl CreateShapeHandler {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self { canvas }
    }
}

impl CommandHandler for CreateShapeHandler {
    fn execute(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>> {
        let attrs: ShapeAttrs = read(context, "shape")?;
        attrs.bounds.validate()?;
        let id = attrs.id.unwrap_or_else(ElementId::generate);

        let mut canvas = self.canvas.borrow_mut();
        let parent = match read_opt::<ElementId>(context, "parent")? {
            Some(parent) => Some(parent),
            None => canvas.root_element().cloned(),
        };
        canvas.add_shape(Shape::new(id.clone(), attrs.bounds, parent.clone()))?;
        drop(canvas);

        write(
            context,
            "shape",
            &ShapeAttrs {
                id: Some(id.clone()),
                bounds: attrs.bounds,
            },
        )?;
        if let Some(parent) = parent {
            write(context, "parent", &parent)?;
        }
        Ok(vec![id])
    }

    fn revert(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>> {
        let attrs: ShapeAttrs = read(context, "shape")?;
        let Some(id) = attrs.id else {
            return Err(ListenerError::new("created shape has no id to remove"));
        };
        self.canvas.borrow_mut().remove_shape(&id)?;
        Ok(vec![id])
    }
}

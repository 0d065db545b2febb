//! In-memory diagram model: root elements, shapes and the active root.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use draftboard_core::{Bounds, DomainError, DomainResult, ElementId, Entity};

/// Canvas shared between handlers and behaviors of one editor.
pub type SharedCanvas = Rc<RefCell<Canvas>>;

/// A rectangular diagram element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    id: ElementId,
    bounds: Bounds,
    parent: Option<ElementId>,
}

impl Shape {
    pub fn new(id: ElementId, bounds: Bounds, parent: Option<ElementId>) -> Self {
        Self { id, bounds, parent }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn parent(&self) -> Option<&ElementId> {
        self.parent.as_ref()
    }
}

impl Entity for Shape {
    type Id = ElementId;

    fn id(&self) -> &ElementId {
        &self.id
    }
}

/// The drawing surface.
///
/// Holds the registered root elements, which one is active, and every shape. Handlers
/// mutate it; the command stack never looks inside.
#[derive(Debug, Default)]
pub struct Canvas {
    roots: Vec<ElementId>,
    active_root: Option<ElementId>,
    shapes: BTreeMap<ElementId, Shape>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedCanvas {
        Rc::new(RefCell::new(self))
    }

    /// Register a root element. The first root becomes the active one.
    pub fn add_root(&mut self, id: ElementId) -> DomainResult<()> {
        if self.roots.contains(&id) || self.shapes.contains_key(&id) {
            return Err(DomainError::conflict(format!("element `{id}` already exists")));
        }
        if self.active_root.is_none() {
            self.active_root = Some(id.clone());
        }
        self.roots.push(id);
        Ok(())
    }

    pub fn root_element(&self) -> Option<&ElementId> {
        self.active_root.as_ref()
    }

    /// Switch the active root; returns the previously active one.
    pub fn set_root_element(&mut self, id: &ElementId) -> DomainResult<Option<ElementId>> {
        if !self.roots.contains(id) {
            return Err(DomainError::not_found(id));
        }
        tracing::debug!(root = %id, "switching root element");
        Ok(self.active_root.replace(id.clone()))
    }

    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    pub fn add_shape(&mut self, shape: Shape) -> DomainResult<()> {
        if self.shapes.contains_key(&shape.id) || self.roots.contains(&shape.id) {
            return Err(DomainError::conflict(format!("element `{}` already exists", shape.id)));
        }
        if let Some(parent) = &shape.parent {
            if !self.contains(parent) {
                return Err(DomainError::not_found(parent));
            }
        }
        self.shapes.insert(shape.id.clone(), shape);
        Ok(())
    }

    /// Remove a shape that has no children left.
    pub fn remove_shape(&mut self, id: &ElementId) -> DomainResult<Shape> {
        if !self.children(id).is_empty() {
            return Err(DomainError::validation(format!("shape `{id}` still has children")));
        }
        self.shapes.remove(id).ok_or_else(|| DomainError::not_found(id))
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.shapes.contains_key(id) || self.roots.contains(id)
    }

    pub fn shape(&self, id: &ElementId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn bounds(&self, id: &ElementId) -> DomainResult<Bounds> {
        self.shape(id)
            .map(Shape::bounds)
            .ok_or_else(|| DomainError::not_found(id))
    }

    pub fn set_bounds(&mut self, id: &ElementId, bounds: Bounds) -> DomainResult<()> {
        bounds.validate()?;
        let shape = self
            .shapes
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(id))?;
        shape.bounds = bounds;
        Ok(())
    }

    /// Direct children of `id`, ordered by id.
    pub fn children(&self, id: &ElementId) -> Vec<ElementId> {
        self.shapes
            .values()
            .filter(|shape| shape.parent.as_ref() == Some(id))
            .map(|shape| shape.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ElementId {
        ElementId::new(raw).unwrap()
    }

    fn bounds(x: i64, y: i64, w: i64, h: i64) -> Bounds {
        Bounds::new(x, y, w, h).unwrap()
    }

    #[test]
    fn first_root_becomes_active() {
        let mut canvas = Canvas::new();
        canvas.add_root(id("root")).unwrap();
        canvas.add_root(id("sub")).unwrap();

        assert_eq!(canvas.root_element(), Some(&id("root")));
        assert_eq!(canvas.set_root_element(&id("sub")).unwrap(), Some(id("root")));
        assert!(canvas.set_root_element(&id("missing")).is_err());
    }

    #[test]
    fn shapes_need_existing_parents_and_unique_ids() {
        let mut canvas = Canvas::new();
        canvas.add_root(id("root")).unwrap();

        canvas
            .add_shape(Shape::new(id("a"), bounds(0, 0, 10, 10), Some(id("root"))))
            .unwrap();
        assert!(matches!(
            canvas.add_shape(Shape::new(id("a"), bounds(0, 0, 1, 1), None)),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            canvas.add_shape(Shape::new(id("b"), bounds(0, 0, 1, 1), Some(id("nope")))),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn children_block_removal() {
        let mut canvas = Canvas::new();
        canvas
            .add_shape(Shape::new(id("parent"), bounds(0, 0, 100, 100), None))
            .unwrap();
        canvas
            .add_shape(Shape::new(id("child"), bounds(10, 10, 10, 10), Some(id("parent"))))
            .unwrap();

        assert_eq!(canvas.children(&id("parent")), vec![id("child")]);
        assert!(canvas.remove_shape(&id("parent")).is_err());
        canvas.remove_shape(&id("child")).unwrap();
        canvas.remove_shape(&id("parent")).unwrap();
        assert_eq!(canvas.shapes().count(), 0);
    }

    #[test]
    fn set_bounds_validates() {
        let mut canvas = Canvas::new();
        canvas
            .add_shape(Shape::new(id("a"), bounds(0, 0, 10, 10), None))
            .unwrap();
        let invalid = Bounds {
            x: 0,
            y: 0,
            width: -1,
            height: 5,
        };
        assert!(canvas.set_bounds(&id("a"), invalid).is_err());
        assert_eq!(canvas.bounds(&id("a")).unwrap(), bounds(0, 0, 10, 10));
    }
}

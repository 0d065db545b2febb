use std::cell::RefCell;
use std::rc::Rc;

use draftboard_commands::{ELEMENTS_CHANGED, Execution};
use draftboard_core::{Bounds, Delta, ElementId};
use draftboard_events::{Event, Flow};
use draftboard_modeling::{BoundsUpdate, Canvas, Direction, Editor, Shape, resize_bounds};

fn id(raw: &str) -> ElementId {
    ElementId::new(raw).unwrap()
}

fn bounds(x: i64, y: i64, w: i64, h: i64) -> Bounds {
    Bounds::new(x, y, w, h).unwrap()
}

fn editor() -> Editor {
    draftboard_observability::init();

    let mut canvas = Canvas::new();
    canvas.add_root(id("root")).unwrap();
    canvas
        .add_shape(Shape::new(id("s1"), bounds(100, 100, 100, 100), Some(id("root"))))
        .unwrap();
    canvas
        .add_shape(Shape::new(id("s2"), bounds(300, 100, 100, 100), Some(id("root"))))
        .unwrap();
    Editor::new(canvas).unwrap()
}

fn size_of(editor: &Editor, shape: &str) -> (i64, i64) {
    let b = editor.canvas().borrow().bounds(&id(shape)).unwrap();
    (b.width, b.height)
}

#[test]
fn resize_changes_size_and_keeps_position() {
    let editor = editor();

    let outcome = editor
        .modeling()
        .resize_shape(&id("s2"), BoundsUpdate::size(124, 202))
        .unwrap();

    assert_eq!(outcome, Execution::Applied);
    assert_eq!(
        editor.canvas().borrow().bounds(&id("s2")).unwrap(),
        bounds(300, 100, 124, 202)
    );
}

#[test]
fn undo_and_redo_walk_through_every_size() {
    let editor = editor();
    let modeling = editor.modeling();
    let stack = editor.command_stack();

    modeling.resize_shape(&id("s2"), BoundsUpdate::size(124, 202)).unwrap();
    modeling.resize_shape(&id("s2"), BoundsUpdate::size(999, 999)).unwrap();
    assert_eq!(size_of(&editor, "s2"), (999, 999));

    assert!(stack.undo().unwrap());
    assert_eq!(size_of(&editor, "s2"), (124, 202));
    assert!(stack.undo().unwrap());
    assert_eq!(size_of(&editor, "s2"), (100, 100));
    assert!(!stack.can_undo());

    assert!(stack.redo().unwrap());
    assert_eq!(size_of(&editor, "s2"), (124, 202));
    assert!(stack.redo().unwrap());
    assert_eq!(size_of(&editor, "s2"), (999, 999));
    assert!(!stack.can_redo());
}

#[test]
fn resize_by_handle_uses_bounds_arithmetic() {
    let editor = editor();
    let current = editor.canvas().borrow().bounds(&id("s1")).unwrap();
    let target = resize_bounds(current, Direction::Sw, Delta::new(5, -15)).unwrap();

    editor.modeling().resize_shape(&id("s1"), target).unwrap();
    assert_eq!(
        editor.canvas().borrow().bounds(&id("s1")).unwrap(),
        bounds(105, 100, 95, 85)
    );

    editor.command_stack().undo().unwrap();
    assert_eq!(
        editor.canvas().borrow().bounds(&id("s1")).unwrap(),
        bounds(100, 100, 100, 100)
    );
}

#[test]
fn collapsing_resize_is_vetoed() {
    let editor = editor();

    let outcome = editor
        .modeling()
        .resize_shape(&id("s1"), BoundsUpdate::size(-10, 50))
        .unwrap();

    assert_eq!(outcome, Execution::Vetoed);
    assert_eq!(size_of(&editor, "s1"), (100, 100));
    assert!(!editor.command_stack().can_undo());
}

#[test]
fn resizing_a_missing_shape_fails_without_history() {
    let editor = editor();

    let result = editor
        .modeling()
        .resize_shape(&id("ghost"), BoundsUpdate::size(10, 10));

    assert!(result.is_err());
    assert!(!editor.command_stack().can_undo());
}

#[test]
fn changed_elements_are_announced() {
    let editor = editor();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    editor.bus().on(ELEMENTS_CHANGED, move |e: &mut Event| {
        s.borrow_mut().push(e.get("elements").cloned().unwrap_or_default());
        Ok(Flow::Continue)
    });

    editor
        .modeling()
        .resize_shape(&id("s1"), BoundsUpdate::size(10, 10))
        .unwrap();
    editor.command_stack().undo().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![serde_json::json!(["s1"]), serde_json::json!(["s1"])]
    );
}

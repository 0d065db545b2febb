use draftboard_core::{Bounds, ElementId};
use draftboard_modeling::{Canvas, Editor, Shape};

fn id(raw: &str) -> ElementId {
    ElementId::new(raw).unwrap()
}

fn editor() -> Editor {
    draftboard_observability::init();

    let mut canvas = Canvas::new();
    canvas.add_root(id("main")).unwrap();
    canvas.add_root(id("subprocess")).unwrap();
    canvas
        .add_shape(Shape::new(
            id("task"),
            Bounds::new(0, 0, 100, 80).unwrap(),
            Some(id("subprocess")),
        ))
        .unwrap();
    Editor::new(canvas).unwrap()
}

fn active_root(editor: &Editor) -> ElementId {
    editor.canvas().borrow().root_element().cloned().unwrap()
}

#[test]
fn undo_returns_to_the_root_a_command_ran_in() {
    let editor = editor();
    let canvas = editor.canvas();

    canvas.borrow_mut().set_root_element(&id("subprocess")).unwrap();
    editor
        .modeling()
        .resize_shape(&id("task"), Bounds::new(0, 0, 120, 80).unwrap())
        .unwrap();

    canvas.borrow_mut().set_root_element(&id("main")).unwrap();
    editor.command_stack().undo().unwrap();

    assert_eq!(active_root(&editor), id("subprocess"));
}

#[test]
fn redo_returns_to_the_stamped_root() {
    let editor = editor();
    let canvas = editor.canvas();

    canvas.borrow_mut().set_root_element(&id("subprocess")).unwrap();
    editor
        .modeling()
        .resize_shape(&id("task"), Bounds::new(0, 0, 120, 80).unwrap())
        .unwrap();
    editor.command_stack().undo().unwrap();

    canvas.borrow_mut().set_root_element(&id("main")).unwrap();
    editor.command_stack().redo().unwrap();

    assert_eq!(active_root(&editor), id("subprocess"));
    assert_eq!(
        canvas.borrow().bounds(&id("task")).unwrap().width,
        120
    );
}

#[test]
fn caller_named_root_is_activated_on_execute() {
    let editor = editor();

    editor
        .command_stack()
        .execute(
            draftboard_modeling::RESIZE_SHAPE,
            serde_json::json!({
                "shape": "task",
                "newBounds": { "width": 10 },
                "rootElement": "subprocess",
            }),
        )
        .unwrap();

    assert_eq!(active_root(&editor), id("subprocess"));
}

#[test]
fn detached_behavior_leaves_the_root_alone() {
    let editor = editor();
    editor.root_elements().detach();

    editor
        .command_stack()
        .execute(
            draftboard_modeling::RESIZE_SHAPE,
            serde_json::json!({
                "shape": "task",
                "newBounds": { "width": 10 },
                "rootElement": "subprocess",
            }),
        )
        .unwrap();

    assert_eq!(active_root(&editor), id("main"));
}

use std::rc::Rc;

use serde_json::Value;

use draftboard_commands::{CommandFilter, CommandInterceptor};
use draftboard_core::ElementId;
use draftboard_events::{Event, EventBus, Flow, ListenerError, ListenerId, ListenerResult};

use crate::canvas::SharedCanvas;

/// Context key carrying the root element a command belongs to.
pub const ROOT_ELEMENT_KEY: &str = "rootElement";

/// Keeps the active root element in step with the command timeline.
///
/// Every executed command is stamped with the root that was active when it ran (or, if the
/// caller named one, switches to it). Undo and redo then bring the user back to that root
/// before the change is reverted or replayed.
#[derive(Debug)]
pub struct RootElementsBehavior {
    interceptor: CommandInterceptor,
    listeners: [ListenerId; 2],
}

impl RootElementsBehavior {
    pub fn new(bus: Rc<EventBus>, canvas: SharedCanvas) -> Self {
        let interceptor = CommandInterceptor::new(bus);

        let on_executed = Rc::clone(&canvas);
        let executed = interceptor.executed(CommandFilter::All, move |event: &mut Event| {
            let Some(context) = event.context_mut() else {
                return Ok(Flow::Continue);
            };
            match stamped_root(context)? {
                Some(root) => {
                    on_executed.borrow_mut().set_root_element(&root)?;
                }
                None => {
                    let current = on_executed.borrow().root_element().cloned();
                    if let (Some(current), Value::Object(map)) = (current, context) {
                        map.insert(ROOT_ELEMENT_KEY.to_string(), Value::String(current.into()));
                    }
                }
            }
            Ok(Flow::Continue)
        });

        let revert = interceptor.revert(CommandFilter::All, move |event: &mut Event| -> ListenerResult {
            if let Some(root) = event.context().map(stamped_root).transpose()?.flatten() {
                canvas.borrow_mut().set_root_element(&root)?;
            }
            Ok(Flow::Continue)
        });

        Self {
            interceptor,
            listeners: [executed, revert],
        }
    }

    /// Stop tracking.
    pub fn detach(&self) {
        for listener in self.listeners {
            self.interceptor.off(listener);
        }
    }
}

fn stamped_root(context: &Value) -> Result<Option<ElementId>, ListenerError> {
    match context.get(ROOT_ELEMENT_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Ok(Some(ElementId::new(raw.as_str())?)),
        Some(other) => Err(ListenerError::new(format!(
            "{ROOT_ELEMENT_KEY} must be an element id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::canvas::Canvas;
    use draftboard_events::{CommandTopic, Stage};

    fn id(raw: &str) -> ElementId {
        ElementId::new(raw).unwrap()
    }

    fn setup() -> (Rc<EventBus>, SharedCanvas, RootElementsBehavior) {
        let bus = Rc::new(EventBus::new());
        let mut canvas = Canvas::new();
        canvas.add_root(id("root")).unwrap();
        canvas.add_root(id("sub")).unwrap();
        let canvas = canvas.shared();
        let behavior = RootElementsBehavior::new(Rc::clone(&bus), Rc::clone(&canvas));
        (bus, canvas, behavior)
    }

    fn fire(bus: &EventBus, stage: Stage, context: Value) -> Value {
        let mut event = Event::command(CommandTopic::new(stage, "any"), context);
        bus.fire(&mut event).unwrap();
        event.take_context()
    }

    #[test]
    fn executed_stamps_current_root() {
        let (bus, _canvas, _behavior) = setup();
        let context = fire(&bus, Stage::Executed, json!({}));
        assert_eq!(context, json!({ "rootElement": "root" }));
    }

    #[test]
    fn executed_switches_to_named_root() {
        let (bus, canvas, _behavior) = setup();
        fire(&bus, Stage::Executed, json!({ "rootElement": "sub" }));
        assert_eq!(canvas.borrow().root_element(), Some(&id("sub")));
    }

    #[test]
    fn revert_restores_stamped_root() {
        let (bus, canvas, _behavior) = setup();
        canvas.borrow_mut().set_root_element(&id("sub")).unwrap();

        fire(&bus, Stage::Revert, json!({ "rootElement": "root" }));
        assert_eq!(canvas.borrow().root_element(), Some(&id("root")));

        fire(&bus, Stage::Revert, json!({}));
        assert_eq!(canvas.borrow().root_element(), Some(&id("root")));
    }

    #[test]
    fn unknown_root_is_an_error() {
        let (bus, _canvas, _behavior) = setup();
        let mut event = Event::command(
            CommandTopic::new(Stage::Revert, "any"),
            json!({ "rootElement": "elsewhere" }),
        );
        assert!(bus.fire(&mut event).is_err());
    }

    #[test]
    fn detach_stops_tracking() {
        let (bus, _canvas, behavior) = setup();
        behavior.detach();
        assert_eq!(fire(&bus, Stage::Executed, json!({})), json!({}));
    }
}

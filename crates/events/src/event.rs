use serde_json::{Map, Value};

use crate::command::CommandTopic;
use crate::error::ListenerError;

/// Caller-supplied event data, mutable while the event is dispatched.
pub type Payload = Map<String, Value>;

/// Payload key holding the command name of a lifecycle event.
pub const COMMAND_KEY: &str = "command";

/// Payload key holding the command context of a lifecycle event.
pub const CONTEXT_KEY: &str = "context";

/// Dispatch key of an event.
///
/// - `Named` covers free-form types such as `"element.changed"`.
/// - `Error` is the synthetic channel the bus reports listener failures on.
/// - `Command` is a typed command lifecycle topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Named(String),
    Error,
    Command(CommandTopic),
}

impl EventType {
    /// Named event type; `"error"` maps onto the error channel.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == "error" {
            EventType::Error
        } else {
            EventType::Named(name)
        }
    }

    /// Topic whose listeners run after this type's own listeners, if any.
    pub fn fallback(&self) -> Option<EventType> {
        match self {
            EventType::Command(topic) => topic.wildcard().map(EventType::Command),
            _ => None,
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EventType::Named(name) => f.write_str(name),
            EventType::Error => f.write_str("error"),
            EventType::Command(topic) => core::fmt::Display::fmt(topic, f),
        }
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        EventType::named(value)
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        EventType::named(value)
    }
}

impl From<CommandTopic> for EventType {
    fn from(value: CommandTopic) -> Self {
        EventType::Command(value)
    }
}

/// What a listener asks the bus to do after it returns.
///
/// Prevention and propagation-stopping are independent: `PreventDefault` lets the
/// remaining listeners run, `StopPropagation` does not mark the event prevented.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Continue,
    PreventDefault,
    StopPropagation,
    /// Prevent default and stop propagation.
    Cancel,
}

impl Flow {
    pub fn prevents_default(self) -> bool {
        matches!(self, Flow::PreventDefault | Flow::Cancel)
    }

    pub fn stops_propagation(self) -> bool {
        matches!(self, Flow::StopPropagation | Flow::Cancel)
    }

    /// Combine two outcomes; each flag survives if either side sets it.
    pub fn and(self, other: Flow) -> Flow {
        match (
            self.prevents_default() || other.prevents_default(),
            self.stops_propagation() || other.stops_propagation(),
        ) {
            (true, true) => Flow::Cancel,
            (true, false) => Flow::PreventDefault,
            (false, true) => Flow::StopPropagation,
            (false, false) => Flow::Continue,
        }
    }
}

impl core::ops::BitOr for Flow {
    type Output = Flow;

    fn bitor(self, rhs: Flow) -> Flow {
        self.and(rhs)
    }
}

/// Result a listener returns; an `Err` is routed through the bus error channel.
pub type ListenerResult = Result<Flow, ListenerError>;

/// Mutable envelope passed to every listener of one dispatch.
///
/// Built right before a `fire` and dropped after; never stored long-term.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: EventType,
    payload: Payload,
    propagation_stopped: bool,
    default_prevented: bool,
    error: Option<ListenerError>,
}

impl Event {
    pub fn new(event_type: impl Into<EventType>) -> Self {
        Self::with_payload(event_type, Payload::new())
    }

    pub fn with_payload(event_type: impl Into<EventType>, payload: Payload) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            propagation_stopped: false,
            default_prevented: false,
            error: None,
        }
    }

    /// Build an event from a JSON value; object fields are merged into the payload,
    /// any other value is stored under `"data"`.
    pub fn from_value(event_type: impl Into<EventType>, value: Value) -> Self {
        let payload = match value {
            Value::Object(map) => map,
            Value::Null => Payload::new(),
            other => {
                let mut map = Payload::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self::with_payload(event_type, payload)
    }

    /// Lifecycle event for one command, carrying its name and context.
    pub fn command(topic: CommandTopic, context: Value) -> Self {
        let mut payload = Payload::new();
        if let Some(name) = topic.command() {
            payload.insert(COMMAND_KEY.to_string(), Value::String(name.to_string()));
        }
        payload.insert(CONTEXT_KEY.to_string(), context);
        Self::with_payload(EventType::Command(topic), payload)
    }

    /// Synthetic event announcing a listener failure on the error channel.
    pub fn error(error: ListenerError) -> Self {
        let mut payload = Payload::new();
        payload.insert("message".to_string(), Value::String(error.message().to_string()));
        if let Some(origin) = error.origin() {
            payload.insert("source".to_string(), Value::String(origin.to_string()));
        }
        let mut event = Self::with_payload(EventType::Error, payload);
        event.error = Some(error);
        event
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.payload.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.payload.insert(key.into(), value)
    }

    /// Name of the command a lifecycle event belongs to.
    pub fn command_name(&self) -> Option<&str> {
        self.payload.get(COMMAND_KEY).and_then(Value::as_str)
    }

    pub fn context(&self) -> Option<&Value> {
        self.payload.get(CONTEXT_KEY)
    }

    pub fn context_mut(&mut self) -> Option<&mut Value> {
        self.payload.get_mut(CONTEXT_KEY)
    }

    /// Remove the context from the payload, leaving `null` behind.
    pub fn take_context(&mut self) -> Value {
        self.payload
            .get_mut(CONTEXT_KEY)
            .map(Value::take)
            .unwrap_or(Value::Null)
    }

    /// The failure this event reports (error channel only).
    pub fn error_ref(&self) -> Option<&ListenerError> {
        self.error.as_ref()
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub(crate) fn apply(&mut self, flow: Flow) {
        if flow.prevents_default() {
            self.prevent_default();
        }
        if flow.stops_propagation() {
            self.stop_propagation();
        }
    }
}

impl From<EventType> for Event {
    fn from(value: EventType) -> Self {
        Event::new(value)
    }
}

impl From<&str> for Event {
    fn from(value: &str) -> Self {
        Event::new(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::Stage;

    #[test]
    fn flow_flags_compose() {
        assert_eq!(Flow::PreventDefault | Flow::StopPropagation, Flow::Cancel);
        assert_eq!(Flow::Continue | Flow::PreventDefault, Flow::PreventDefault);
        assert!(!Flow::StopPropagation.prevents_default());
        assert!(!Flow::PreventDefault.stops_propagation());
    }

    #[test]
    fn string_and_typed_construction_are_equivalent() {
        let a = Event::from_value("foo", json!({ "value": 1 }));
        let mut b = Event::new(EventType::named("foo"));
        b.insert("value", json!(1));
        assert_eq!(a.event_type(), b.event_type());
        assert_eq!(a.payload(), b.payload());
    }

    #[test]
    fn error_name_maps_to_error_channel() {
        assert_eq!(EventType::from("error"), EventType::Error);
        assert_eq!(EventType::Error.fallback(), None);
    }

    #[test]
    fn command_event_carries_name_and_context() {
        let mut event = Event::command(
            CommandTopic::new(Stage::Execute, "shape.move"),
            json!({ "id": "s1" }),
        );
        assert_eq!(event.command_name(), Some("shape.move"));
        assert_eq!(event.take_context(), json!({ "id": "s1" }));
        assert_eq!(event.context(), Some(&Value::Null));
    }
}

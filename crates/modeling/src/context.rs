//! Typed access to JSON command contexts.
//!
//! Handlers read the fields they need and write back only the fields they own, so
//! annotations other behaviors put on the same context survive.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use draftboard_commands::HandlerResult;
use draftboard_events::ListenerError;

/// Read a required field.
pub fn read<T: DeserializeOwned>(context: &Value, key: &str) -> HandlerResult<T> {
    let raw = context
        .get(key)
        .ok_or_else(|| ListenerError::new(format!("context.{key} is missing")))?;
    serde_json::from_value(raw.clone())
        .map_err(|err| ListenerError::new(format!("context.{key} is malformed: {err}")))
}

/// Read an optional field; `null` counts as absent.
pub fn read_opt<T: DeserializeOwned>(context: &Value, key: &str) -> HandlerResult<Option<T>> {
    match context.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => read(context, key).map(Some),
    }
}

/// Write a field; the context must be a JSON object.
pub fn write<T: Serialize>(context: &mut Value, key: &str, value: &T) -> HandlerResult<()> {
    let Value::Object(map) = context else {
        return Err(ListenerError::new("command context must be a JSON object"));
    };
    map.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(())
}

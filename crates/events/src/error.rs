//! Errors raised by listeners and routed through the bus.

use thiserror::Error;

use draftboard_core::DomainError;

use crate::event::EventType;

/// A failure raised by a listener (or a command handler) during dispatch.
///
/// Cloneable so the bus can hand a copy to `error` listeners and still re-raise the
/// original to the caller of `fire`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
    origin: Option<EventType>,
    reported: bool,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: None,
            reported: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Event type whose dispatch produced the failure, once the bus has seen it.
    pub fn origin(&self) -> Option<&EventType> {
        self.origin.as_ref()
    }

    /// Whether the failure already went through the `error` channel unrecovered.
    pub fn is_reported(&self) -> bool {
        self.reported
    }

    /// Attach the originating event type; the first origin wins.
    pub fn with_origin(mut self, origin: &EventType) -> Self {
        if self.origin.is_none() {
            self.origin = Some(origin.clone());
        }
        self
    }

    pub(crate) fn into_reported(mut self) -> Self {
        self.reported = true;
        self
    }
}

impl From<anyhow::Error> for ListenerError {
    fn from(value: anyhow::Error) -> Self {
        Self::new(format!("{value:#}"))
    }
}

impl From<DomainError> for ListenerError {
    fn from(value: DomainError) -> Self {
        Self::new(value.to_string())
    }
}

impl From<serde_json::Error> for ListenerError {
    fn from(value: serde_json::Error) -> Self {
        Self::new(format!("malformed payload: {value}"))
    }
}

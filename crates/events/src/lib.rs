//! Event dispatch for the editor core.
//!
//! - [`EventBus`]: priority-ordered, cancelable, synchronous pub/sub with an error channel.
//! - [`Event`]: the mutable envelope listeners receive.
//! - [`CommandTopic`] / [`Stage`]: typed keys for command lifecycle events.

pub mod bus;
pub mod command;
pub mod error;
pub mod event;

pub use bus::{DEFAULT_PRIORITY, EventBus, EventTypes, ListenerId};
pub use command::{CommandTopic, Stage};
pub use error::ListenerError;
pub use event::{COMMAND_KEY, CONTEXT_KEY, Event, EventType, Flow, ListenerResult, Payload};

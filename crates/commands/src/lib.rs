//! Transactional command execution on top of the event bus.
//!
//! - [`CommandStack`]: runs commands through their lifecycle and keeps undo/redo history
//!   as atomic action groups.
//! - [`CommandHandler`]: business logic for one command name.
//! - [`CommandInterceptor`]: declarative subscriptions to command lifecycle stages.

pub mod config;
pub mod error;
pub mod handler;
pub mod interceptor;
pub mod stack;

pub use config::CommandStackConfig;
pub use error::CommandError;
pub use handler::{CommandHandler, HandlerResult};
pub use interceptor::{CommandFilter, CommandInterceptor};
pub use stack::{CommandStack, ELEMENTS_CHANGED, Execution, STACK_CHANGED};

//! Command stack error model.

use thiserror::Error;

use draftboard_events::ListenerError;

/// Failure of a command stack operation.
///
/// Vetoed commands and history boundaries are not errors: `execute` reports a veto as
/// [`Execution::Vetoed`](crate::Execution::Vetoed), `undo`/`redo` at the ends of the
/// history return `Ok(false)`.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// No handler is registered under the command name. History is untouched.
    #[error("no handler registered for command `{0}`")]
    UnknownCommand(String),

    /// A handler is already registered under the command name.
    #[error("a handler for command `{0}` is already registered")]
    DuplicateHandler(String),

    /// A handler failed and no `error` listener recovered it.
    #[error("handler for `{command}` failed: {source}")]
    HandlerFailure {
        command: String,
        source: ListenerError,
    },

    /// A lifecycle listener failed and no `error` listener recovered it.
    #[error("command listener failed: {0}")]
    Listener(#[source] ListenerError),

    /// The operation is not allowed while the stack is executing or replaying.
    #[error("illegal `{operation}` while the command stack is busy")]
    Reentrant { operation: &'static str },
}

impl From<CommandError> for ListenerError {
    fn from(value: CommandError) -> Self {
        match value {
            CommandError::HandlerFailure { source, .. } | CommandError::Listener(source) => source,
            other => ListenerError::new(other.to_string()),
        }
    }
}

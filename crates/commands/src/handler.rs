use serde_json::Value;

use draftboard_core::ElementId;
use draftboard_events::ListenerError;

use crate::stack::CommandStack;

/// Result type of handler operations; failures travel through the bus error channel.
pub type HandlerResult<T> = Result<T, ListenerError>;

/// Business logic for one command name (command handler abstraction).
///
/// The stack owns orchestration (lifecycle events, history); a handler only knows how to
/// move the model forward and back.
///
/// ## Context
///
/// Every stage receives the same `context` the caller passed to
/// [`CommandStack::execute`]. Handlers may annotate it: `execute` typically records the
/// prior state (e.g. old bounds) that `revert` needs to invert the change. The annotated
/// context is what undo and redo later replay.
///
/// ## Contract
///
/// - `execute` must be a forward mutation derived entirely from `context`.
/// - `revert` must exactly invert it using only `context`.
/// - `execute` runs again on redo with the same context, so it must give the same result
///   when replayed.
/// - Both return the ids of the elements they touched; the stack reports them through
///   `elements.changed`.
///
/// ## Nested Commands
///
/// `pre_execute` and `post_execute` receive the stack and may call
/// [`CommandStack::execute`]; those commands join the caller's atomic group, so one undo
/// reverts them all. Nested commands are recorded on their own and replayed from history,
/// which is why `execute`/`revert` don't get the stack.
pub trait CommandHandler {
    /// Handler-side veto, consulted after the `canExecute` listeners allowed the command.
    fn can_execute(&self, _context: &Value) -> bool {
        true
    }

    fn pre_execute(&self, _stack: &CommandStack, _context: &mut Value) -> HandlerResult<()> {
        Ok(())
    }

    fn execute(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>>;

    fn post_execute(&self, _stack: &CommandStack, _context: &mut Value) -> HandlerResult<()> {
        Ok(())
    }

    fn revert(&self, context: &mut Value) -> HandlerResult<Vec<ElementId>>;
}

//! Command execution engine (undo/redo history of atomic action groups).
//!
//! This module implements the **command stack pattern** on top of the event bus. It runs
//! each command through its lifecycle, announcing every stage so behaviors can observe,
//! veto or extend it, and records what ran so it can be reverted and replayed.
//!
//! ## Command Execution Flow
//!
//! ```text
//! execute(name, context)
//!   ↓
//! 0. Open an action group (outermost call only; nested calls join the open group)
//!   ↓
//! 1. canExecute  ─ prevented or handler.can_execute() == false ─► Vetoed (nothing recorded)
//!   ↓
//! 2. preExecute  + handler.pre_execute()
//!   ↓
//! 3. execute     + handler.execute()  → action recorded in the open group
//!   ↓
//! 4. postExecute + handler.post_execute()   (may run nested commands → 1..4 again)
//!   ↓
//! 5. executed    for every recorded action (outermost call only)
//!   ↓
//! 6. Seal: drop the redo tail, push the group, advance the pointer
//! ```
//!
//! Undo replays the group below the pointer in reverse (`revert` → `handler.revert` →
//! `reverted`); redo replays the group at the pointer forward (`preExecute` → `execute` →
//! `handler.execute` → `executed`). A group is undone or redone as a whole.
//!
//! ## Failure Handling
//!
//! The stack does no local recovery. A handler failure is offered to the bus error
//! channel ([`EventBus::raise`]); if an `error` listener prevents default the failure is
//! swallowed and the command reports [`Execution::Recovered`], otherwise the failure
//! propagates as [`CommandError::HandlerFailure`]. When a failure reaches the outermost
//! `execute`, the open group is discarded and history is left as it was. A failed undo or
//! redo re-applies (or reverts) the actions of the group it already processed, then leaves
//! the pointer where it was.
//!
//! ## Re-entrancy
//!
//! Commands may run commands (from `pre_execute`/`post_execute` or lifecycle listeners);
//! a depth counter decides when the outermost call seals. Undo, redo and clear are refused
//! while a command runs, and `execute` is refused while undo/redo replays history.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Value, json};

use draftboard_core::ElementId;
use draftboard_events::{CommandTopic, Event, EventBus, EventType, ListenerError, Stage};

use crate::config::CommandStackConfig;
use crate::error::CommandError;
use crate::handler::CommandHandler;

/// Fired after history changed the model, with `{"elements": [ids]}`.
pub const ELEMENTS_CHANGED: &str = "elements.changed";

/// Fired after every history change, with `{"trigger": "execute" | "undo" | "redo" | "clear"}`.
pub const STACK_CHANGED: &str = "commandStack.changed";

/// Outcome of [`CommandStack::execute`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Execution {
    /// The command ran and was recorded.
    Applied,
    /// `canExecute` vetoed the command; nothing ran.
    Vetoed,
    /// A handler failed and an `error` listener recovered the failure.
    Recovered,
}

#[derive(Clone)]
struct Action {
    command: String,
    handler: Rc<dyn CommandHandler>,
    context: Value,
}

impl core::fmt::Debug for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Action")
            .field("command", &self.command)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Smallest undo/redo unit.
#[derive(Debug, Clone, Default)]
struct ActionGroup {
    id: u64,
    actions: Vec<Action>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Executing,
    Undoing,
    Redoing,
}

#[derive(Debug, Default)]
struct StackState {
    history: Vec<ActionGroup>,
    /// Points just past the last applied group; `history[index..]` is the redo tail.
    index: usize,
    current: Option<ActionGroup>,
    depth: usize,
    phase: Phase,
    dirty: Vec<ElementId>,
    next_group: u64,
}

impl StackState {
    fn ensure_idle(&self, operation: &'static str) -> Result<(), CommandError> {
        if self.phase == Phase::Idle {
            Ok(())
        } else {
            Err(CommandError::Reentrant { operation })
        }
    }
}

/// Transactional command engine with undo/redo.
///
/// Owns the handler registry and the history; shares the [`EventBus`] with every behavior
/// of the same editor instance. Handlers and listeners that run nested commands hold the
/// stack as `Rc<CommandStack>` (or a `Weak` to avoid cycles through the bus).
pub struct CommandStack {
    bus: Rc<EventBus>,
    config: CommandStackConfig,
    handlers: RefCell<HashMap<String, Rc<dyn CommandHandler>>>,
    state: RefCell<StackState>,
}

impl core::fmt::Debug for CommandStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        let mut handlers: Vec<String> = self.handlers.borrow().keys().cloned().collect();
        handlers.sort();
        f.debug_struct("CommandStack")
            .field("handlers", &handlers)
            .field("index", &state.index)
            .field("history", &state.history.len())
            .field("depth", &state.depth)
            .field("phase", &state.phase)
            .field("config", &self.config)
            .finish()
    }
}

impl CommandStack {
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self::with_config(bus, CommandStackConfig::default())
    }

    pub fn with_config(bus: Rc<EventBus>, config: CommandStackConfig) -> Self {
        Self {
            bus,
            config,
            handlers: RefCell::new(HashMap::new()),
            state: RefCell::new(StackState::default()),
        }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &CommandStackConfig {
        &self.config
    }

    pub fn register_handler<H>(&self, command: impl Into<String>, handler: H) -> Result<(), CommandError>
    where
        H: CommandHandler + 'static,
    {
        self.register_shared_handler(command, Rc::new(handler))
    }

    /// Register a handler instance that is shared with other owners.
    pub fn register_shared_handler(
        &self,
        command: impl Into<String>,
        handler: Rc<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        let command = command.into();
        let mut handlers = self.handlers.borrow_mut();
        if handlers.contains_key(&command) {
            return Err(CommandError::DuplicateHandler(command));
        }
        tracing::debug!(command = %command, "command handler registered");
        handlers.insert(command, handler);
        Ok(())
    }

    pub fn has_handler(&self, command: &str) -> bool {
        self.handlers.borrow().contains_key(command)
    }

    /// Execute `command` with `context`.
    ///
    /// Called while another command is running (from a handler or lifecycle listener), the
    /// command joins the running command's action group instead of starting a new one.
    pub fn execute(&self, command: &str, context: Value) -> Result<Execution, CommandError> {
        let handler = self.handler(command)?;

        let outermost = {
            let mut state = self.state.borrow_mut();
            if matches!(state.phase, Phase::Undoing | Phase::Redoing) {
                return Err(CommandError::Reentrant { operation: "execute" });
            }
            let outermost = state.depth == 0;
            if outermost {
                let id = state.next_group;
                state.next_group += 1;
                state.current = Some(ActionGroup {
                    id,
                    actions: Vec::new(),
                });
                state.phase = Phase::Executing;
            }
            state.depth += 1;
            outermost
        };

        tracing::debug!(command, outermost, "executing command");
        let result = self.run(command, handler, context);

        if !outermost {
            self.state.borrow_mut().depth -= 1;
            return result;
        }

        let result = result.and_then(|execution| self.announce_executed().map(|()| execution));

        let (group, dirty) = {
            let mut state = self.state.borrow_mut();
            state.depth = 0;
            state.phase = Phase::Idle;
            (
                state.current.take().unwrap_or_default(),
                std::mem::take(&mut state.dirty),
            )
        };

        match result {
            Ok(execution) => {
                self.commit(group, dirty)?;
                Ok(execution)
            }
            Err(err) => {
                tracing::warn!(command, group = group.id, error = %err, "command failed, discarding action group");
                Err(err)
            }
        }
    }

    /// Revert the last applied action group. Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&self) -> Result<bool, CommandError> {
        let (position, mut group) = {
            let mut state = self.state.borrow_mut();
            state.ensure_idle("undo")?;
            if state.index == 0 {
                return Ok(false);
            }
            state.phase = Phase::Undoing;
            let position = state.index - 1;
            (position, state.history[position].clone())
        };

        tracing::debug!(group = group.id, index = position, "undo");
        let result = self.revert_group(&mut group);

        {
            let mut state = self.state.borrow_mut();
            state.phase = Phase::Idle;
            if result.is_ok() {
                state.history[position] = group;
                state.index = position;
            }
        }

        self.notify("undo", result?)?;
        Ok(true)
    }

    /// Re-apply the next undone action group. Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&self) -> Result<bool, CommandError> {
        let (position, mut group) = {
            let mut state = self.state.borrow_mut();
            state.ensure_idle("redo")?;
            if state.index == state.history.len() {
                return Ok(false);
            }
            state.phase = Phase::Redoing;
            let position = state.index;
            (position, state.history[position].clone())
        };

        tracing::debug!(group = group.id, index = position, "redo");
        let result = self.replay_group(&mut group);

        {
            let mut state = self.state.borrow_mut();
            state.phase = Phase::Idle;
            if result.is_ok() {
                state.history[position] = group;
                state.index = position + 1;
            }
        }

        self.notify("redo", result?)?;
        Ok(true)
    }

    /// Drop all history.
    pub fn clear(&self) -> Result<(), CommandError> {
        {
            let mut state = self.state.borrow_mut();
            state.ensure_idle("clear")?;
            state.history.clear();
            state.index = 0;
        }
        tracing::debug!("command stack cleared");
        self.notify("clear", Vec::new())
    }

    pub fn can_undo(&self) -> bool {
        self.state.borrow().index > 0
    }

    pub fn can_redo(&self) -> bool {
        let state = self.state.borrow();
        state.index < state.history.len()
    }

    /// Number of groups `undo` can revert.
    pub fn undo_len(&self) -> usize {
        self.state.borrow().index
    }

    /// Number of groups `redo` can re-apply.
    pub fn redo_len(&self) -> usize {
        let state = self.state.borrow();
        state.history.len() - state.index
    }

    /// Whether a command is currently running.
    pub fn is_executing(&self) -> bool {
        self.state.borrow().depth > 0
    }

    fn handler(&self, command: &str) -> Result<Rc<dyn CommandHandler>, CommandError> {
        self.handlers
            .borrow()
            .get(command)
            .cloned()
            .ok_or_else(|| CommandError::UnknownCommand(command.to_string()))
    }

    fn run(
        &self,
        command: &str,
        handler: Rc<dyn CommandHandler>,
        mut context: Value,
    ) -> Result<Execution, CommandError> {
        let allowed = self.fire_stage(Stage::CanExecute, command, &mut context)?;
        if !allowed || !handler.can_execute(&context) {
            tracing::debug!(command, "command vetoed");
            return Ok(Execution::Vetoed);
        }

        self.fire_stage(Stage::PreExecute, command, &mut context)?;
        if let Err(err) = handler.pre_execute(self, &mut context) {
            return self.handler_failed(Stage::PreExecute, command, err);
        }

        self.fire_stage(Stage::Execute, command, &mut context)?;
        let touched = match handler.execute(&mut context) {
            Ok(touched) => touched,
            Err(err) => return self.handler_failed(Stage::Execute, command, err),
        };
        let slot = self.record(command, Rc::clone(&handler), touched);

        let outcome = self.post_execute(command, &*handler, &mut context);
        self.store_context(slot, context);
        outcome
    }

    fn post_execute(
        &self,
        command: &str,
        handler: &dyn CommandHandler,
        context: &mut Value,
    ) -> Result<Execution, CommandError> {
        self.fire_stage(Stage::PostExecute, command, context)?;
        if let Err(err) = handler.post_execute(self, context) {
            return self.handler_failed(Stage::PostExecute, command, err);
        }
        Ok(Execution::Applied)
    }

    /// Append an action to the open group; its context is stored once its stages finish.
    fn record(&self, command: &str, handler: Rc<dyn CommandHandler>, touched: Vec<ElementId>) -> usize {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        extend_unique(&mut state.dirty, touched);

        let group = state.current.get_or_insert_with(ActionGroup::default);
        group.actions.push(Action {
            command: command.to_string(),
            handler,
            context: Value::Null,
        });
        group.actions.len() - 1
    }

    fn store_context(&self, slot: usize, context: Value) {
        let mut state = self.state.borrow_mut();
        if let Some(action) = state.current.as_mut().and_then(|g| g.actions.get_mut(slot)) {
            action.context = context;
        }
    }

    /// Fire `executed` for every action of the open group, including actions that
    /// `executed` listeners add along the way.
    fn announce_executed(&self) -> Result<(), CommandError> {
        let mut slot = 0;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                state
                    .current
                    .as_mut()
                    .and_then(|g| g.actions.get_mut(slot))
                    .map(|a| (a.command.clone(), std::mem::take(&mut a.context)))
            };
            let Some((command, mut context)) = next else {
                return Ok(());
            };

            let fired = self.fire_stage(Stage::Executed, &command, &mut context);
            self.store_context(slot, context);
            fired?;
            slot += 1;
        }
    }

    fn commit(&self, group: ActionGroup, dirty: Vec<ElementId>) -> Result<(), CommandError> {
        if group.actions.is_empty() {
            return Ok(());
        }

        {
            let mut state = self.state.borrow_mut();
            let index = state.index;
            if index < state.history.len() {
                tracing::debug!(discarded = state.history.len() - index, "discarding redo tail");
                state.history.truncate(index);
            }

            tracing::debug!(group = group.id, actions = group.actions.len(), index, "action group sealed");
            state.history.push(group);
            state.index += 1;

            if let Some(limit) = self.config.history_limit() {
                while state.history.len() > limit {
                    state.history.remove(0);
                    state.index -= 1;
                }
            }
        }

        self.notify("execute", dirty)
    }

    /// Revert the group's actions last to first. On failure the actions already reverted
    /// are executed again, so the model matches the history that is left in place.
    fn revert_group(&self, group: &mut ActionGroup) -> Result<Vec<ElementId>, CommandError> {
        let mut dirty = Vec::new();
        let mut undone = Vec::new();
        for slot in (0..group.actions.len()).rev() {
            let action = &mut group.actions[slot];
            if let Err(err) = self.revert_action(slot, action, &mut dirty, &mut undone) {
                self.roll_forward(group, &undone);
                return Err(err);
            }
        }
        Ok(dirty)
    }

    fn revert_action(
        &self,
        slot: usize,
        action: &mut Action,
        dirty: &mut Vec<ElementId>,
        undone: &mut Vec<usize>,
    ) -> Result<(), CommandError> {
        self.fire_stage(Stage::Revert, &action.command, &mut action.context)?;
        match action.handler.revert(&mut action.context) {
            Ok(touched) => {
                extend_unique(dirty, touched);
                undone.push(slot);
            }
            Err(err) => {
                self.handler_failed(Stage::Revert, &action.command, err)?;
            }
        }
        self.fire_stage(Stage::Reverted, &action.command, &mut action.context)?;
        Ok(())
    }

    /// `undone` lists slots in the order they were reverted.
    fn roll_forward(&self, group: &mut ActionGroup, undone: &[usize]) {
        tracing::warn!(group = group.id, actions = undone.len(), "undo failed, re-applying reverted actions");
        for &slot in undone.iter().rev() {
            let action = &mut group.actions[slot];
            if let Err(err) = action.handler.execute(&mut action.context) {
                tracing::error!(command = %action.command, error = %err, "could not re-apply action after failed undo");
            }
        }
    }

    /// Re-apply the group's actions first to last. On failure the actions already applied
    /// are reverted again.
    fn replay_group(&self, group: &mut ActionGroup) -> Result<Vec<ElementId>, CommandError> {
        let mut dirty = Vec::new();
        let mut redone = Vec::new();
        for slot in 0..group.actions.len() {
            let action = &mut group.actions[slot];
            if let Err(err) = self.replay_action(slot, action, &mut dirty, &mut redone) {
                self.roll_back(group, &redone);
                return Err(err);
            }
        }
        Ok(dirty)
    }

    fn replay_action(
        &self,
        slot: usize,
        action: &mut Action,
        dirty: &mut Vec<ElementId>,
        redone: &mut Vec<usize>,
    ) -> Result<(), CommandError> {
        self.fire_stage(Stage::PreExecute, &action.command, &mut action.context)?;
        self.fire_stage(Stage::Execute, &action.command, &mut action.context)?;
        match action.handler.execute(&mut action.context) {
            Ok(touched) => {
                extend_unique(dirty, touched);
                redone.push(slot);
            }
            Err(err) => {
                self.handler_failed(Stage::Execute, &action.command, err)?;
            }
        }
        self.fire_stage(Stage::Executed, &action.command, &mut action.context)?;
        Ok(())
    }

    /// `redone` lists slots in the order they were applied.
    fn roll_back(&self, group: &mut ActionGroup, redone: &[usize]) {
        tracing::warn!(group = group.id, actions = redone.len(), "redo failed, reverting re-applied actions");
        for &slot in redone.iter().rev() {
            let action = &mut group.actions[slot];
            if let Err(err) = action.handler.revert(&mut action.context) {
                tracing::error!(command = %action.command, error = %err, "could not revert action after failed redo");
            }
        }
    }

    /// Dispatch one lifecycle stage; the context travels through the event and back.
    fn fire_stage(&self, stage: Stage, command: &str, context: &mut Value) -> Result<bool, CommandError> {
        let mut event = Event::command(CommandTopic::new(stage, command), std::mem::take(context));
        let fired = self.bus.fire(&mut event);
        *context = event.take_context();
        fired.map_err(CommandError::Listener)
    }

    fn handler_failed(
        &self,
        stage: Stage,
        command: &str,
        error: ListenerError,
    ) -> Result<Execution, CommandError> {
        let origin = EventType::Command(CommandTopic::new(stage, command));
        match self.bus.raise(error.with_origin(&origin)) {
            Ok(()) => {
                tracing::debug!(command, %stage, "handler failure recovered by error listener");
                Ok(Execution::Recovered)
            }
            Err(source) => Err(CommandError::HandlerFailure {
                command: command.to_string(),
                source,
            }),
        }
    }

    fn notify(&self, trigger: &'static str, dirty: Vec<ElementId>) -> Result<(), CommandError> {
        if !dirty.is_empty() {
            self.bus
                .emit(ELEMENTS_CHANGED, json!({ "elements": dirty }))
                .map_err(CommandError::Listener)?;
        }
        self.bus
            .emit(STACK_CHANGED, json!({ "trigger": trigger }))
            .map_err(CommandError::Listener)?;
        Ok(())
    }
}

fn extend_unique(into: &mut Vec<ElementId>, ids: Vec<ElementId>) {
    for id in ids {
        if !into.contains(&id) {
            into.push(id);
        }
    }
}

//! Event publishing/subscription (priority-ordered, cancelable, synchronous).
//!
//! This module provides the **event bus pattern** every editor component hangs off:
//! behaviors register listeners for event types, and whoever changes state fires events
//! that those listeners may observe, amend, veto or halt.
//!
//! ## Dispatch Rules
//!
//! - Listeners run in **descending priority**; equal priorities run in **registration order**.
//! - A listener returning [`Flow::PreventDefault`] (or calling [`Event::prevent_default`])
//!   marks the event prevented but the remaining listeners still run.
//! - A listener returning [`Flow::StopPropagation`] (or calling [`Event::stop_propagation`])
//!   halts the dispatch; nothing after it runs, whatever its priority.
//! - `fire` returns `Ok(false)` iff the event ended up prevented.
//!
//! ## Error Channel
//!
//! A listener returning `Err` is first reported on [`EventType::Error`]:
//!
//! ```text
//! listener ─ Err(e) ─► fire(error { e })
//!                          ├─ an error listener prevented default ─► swallow, keep dispatching
//!                          └─ otherwise ─────────────────────────────► return Err(e) from fire
//! ```
//!
//! Callers (the command stack among them) therefore need no local recovery: error policy
//! lives in whoever listens on the error channel.
//!
//! ## Threading
//!
//! The bus is single-threaded and re-entrant: listeners may fire further events and
//! register or remove listeners while a dispatch is running. Share it as `Rc<EventBus>`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::ListenerError;
use crate::event::{Event, EventType, ListenerResult};

/// Priority used when a registration does not name one.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Handle returned by a registration; pass it to [`EventBus::off`] to remove the listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One or more event types a registration targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypes(Vec<EventType>);

impl EventTypes {
    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.0.iter()
    }
}

impl From<EventType> for EventTypes {
    fn from(value: EventType) -> Self {
        Self(vec![value])
    }
}

impl From<&str> for EventTypes {
    fn from(value: &str) -> Self {
        Self(vec![value.into()])
    }
}

impl From<String> for EventTypes {
    fn from(value: String) -> Self {
        Self(vec![value.into()])
    }
}

impl From<crate::command::CommandTopic> for EventTypes {
    fn from(value: crate::command::CommandTopic) -> Self {
        Self(vec![value.into()])
    }
}

impl<T: Into<EventType>> From<Vec<T>> for EventTypes {
    fn from(value: Vec<T>) -> Self {
        Self(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<EventType>, const N: usize> From<[T; N]> for EventTypes {
    fn from(value: [T; N]) -> Self {
        Self(value.into_iter().map(Into::into).collect())
    }
}

type Callback = dyn Fn(&mut Event) -> ListenerResult;

struct Listener {
    id: ListenerId,
    priority: i32,
    /// Shared by every type of a `once` registration; set while (or after) it runs.
    once: Option<Rc<Cell<bool>>>,
    callback: Rc<Callback>,
    active: Cell<bool>,
}

/// Priority-ordered, cancelable, synchronous event bus.
///
/// Each editor instance owns one bus; components receive it as `Rc<EventBus>`.
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<HashMap<EventType, Vec<Rc<Listener>>>>,
    next_id: Cell<u64>,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let listeners = self.listeners.borrow();
        let counts: HashMap<String, usize> = listeners
            .iter()
            .map(|(ty, list)| (ty.to_string(), list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` at [`DEFAULT_PRIORITY`].
    pub fn on<F>(&self, types: impl Into<EventTypes>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.register(types.into(), DEFAULT_PRIORITY, false, Rc::new(callback))
    }

    /// Register `callback` at an explicit priority (higher runs first).
    pub fn on_with_priority<F>(
        &self,
        types: impl Into<EventTypes>,
        priority: i32,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.register(types.into(), priority, false, Rc::new(callback))
    }

    /// Register a listener that removes itself after its first successful run.
    pub fn once<F>(&self, types: impl Into<EventTypes>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.register(types.into(), DEFAULT_PRIORITY, true, Rc::new(callback))
    }

    pub fn once_with_priority<F>(
        &self,
        types: impl Into<EventTypes>,
        priority: i32,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.register(types.into(), priority, true, Rc::new(callback))
    }

    /// Remove registrations from `types`.
    ///
    /// With `Some(id)` only that registration goes; with `None` every listener of the
    /// given types is removed.
    pub fn off(&self, types: impl Into<EventTypes>, listener: Option<ListenerId>) {
        let types = types.into();
        let mut registry = self.listeners.borrow_mut();

        for ty in types.iter() {
            let Some(list) = registry.get_mut(ty) else {
                continue;
            };
            list.retain(|l| {
                let keep = listener.is_some_and(|id| l.id != id);
                if !keep {
                    l.active.set(false);
                }
                keep
            });
            if list.is_empty() {
                registry.remove(ty);
            }
        }
    }

    /// Remove a registration from every type it was registered for.
    pub fn remove_listener(&self, listener: ListenerId) {
        let mut registry = self.listeners.borrow_mut();
        registry.retain(|_, list| {
            list.retain(|l| {
                let keep = l.id != listener;
                if !keep {
                    l.active.set(false);
                }
                keep
            });
            !list.is_empty()
        });
    }

    pub fn listener_count(&self, ty: &EventType) -> usize {
        self.listeners.borrow().get(ty).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, ty: &EventType) -> bool {
        self.listener_count(ty) > 0
    }

    /// Fire a prepared event; the caller keeps it to inspect payload changes.
    ///
    /// Returns `Ok(true)` when the event was not prevented ("proceed").
    pub fn fire(&self, event: &mut Event) -> Result<bool, ListenerError> {
        let mut tiers = vec![event.event_type().clone()];
        if let Some(fallback) = event.event_type().fallback() {
            tiers.push(fallback);
        }

        'tiers: for tier in &tiers {
            for listener in self.snapshot(tier) {
                if event.is_propagation_stopped() {
                    break 'tiers;
                }
                if !listener.active.get() {
                    continue;
                }
                self.invoke(tier, &listener, event)?;
            }
        }

        Ok(!event.is_default_prevented())
    }

    /// Shorthand for firing `event_type` with a JSON payload.
    ///
    /// `emit("foo", json!({ "a": 1 }))` is equivalent to firing
    /// `Event::from_value("foo", json!({ "a": 1 }))`.
    pub fn emit(&self, event_type: impl Into<EventType>, payload: Value) -> Result<bool, ListenerError> {
        let mut event = Event::from_value(event_type, payload);
        self.fire(&mut event)
    }

    /// Offer a failure to the error channel.
    ///
    /// Returns `Ok(())` when an `error` listener prevented default (the failure is
    /// swallowed), `Err` with the original failure otherwise. A failure that already went
    /// through the channel unrecovered is returned as-is without a second report.
    pub fn raise(&self, error: ListenerError) -> Result<(), ListenerError> {
        if error.is_reported() {
            return Err(error);
        }

        let mut event = Event::error(error.clone());
        match self.fire(&mut event) {
            Ok(true) => Err(error.into_reported()),
            Ok(false) => {
                tracing::debug!(error = %error, "listener failure handled by error listener");
                Ok(())
            }
            Err(inner) => {
                tracing::warn!(error = %inner, "error listener failed");
                Err(error.into_reported())
            }
        }
    }

    fn register(
        &self,
        types: EventTypes,
        priority: i32,
        once: bool,
        callback: Rc<Callback>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let spent = once.then(|| Rc::new(Cell::new(false)));
        let mut registry = self.listeners.borrow_mut();
        for ty in types.iter() {
            let list = registry.entry(ty.clone()).or_default();
            // Insert after every listener of equal or higher priority to keep ties stable.
            let at = list
                .iter()
                .position(|l| l.priority < priority)
                .unwrap_or(list.len());
            list.insert(
                at,
                Rc::new(Listener {
                    id,
                    priority,
                    once: spent.clone(),
                    callback: Rc::clone(&callback),
                    active: Cell::new(true),
                }),
            );
        }

        tracing::trace!(listener = id.0, priority, once, "listener registered");
        id
    }

    fn snapshot(&self, ty: &EventType) -> Vec<Rc<Listener>> {
        self.listeners
            .borrow()
            .get(ty)
            .cloned()
            .unwrap_or_default()
    }

    fn invoke(&self, tier: &EventType, listener: &Listener, event: &mut Event) -> Result<(), ListenerError> {
        if let Some(spent) = &listener.once {
            // Claimed before the call so re-entrant fires skip it.
            if spent.replace(true) {
                return Ok(());
            }
        }
        tracing::trace!(event_type = %tier, listener = listener.id.0, "invoking listener");

        match (listener.callback)(event) {
            Ok(flow) => {
                event.apply(flow);
                if listener.once.is_some() {
                    self.remove_listener(listener.id);
                }
                Ok(())
            }
            Err(error) => {
                if let Some(spent) = &listener.once {
                    spent.set(false);
                }
                let error = error.with_origin(event.event_type());
                tracing::warn!(event_type = %tier, error = %error, "listener failed");

                // Failures inside error listeners are not re-reported.
                if *tier == EventType::Error {
                    return Err(error.into_reported());
                }
                self.raise(error)
            }
        }
    }
}

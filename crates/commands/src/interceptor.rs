//! Declarative subscriptions to command lifecycle stages.
//!
//! Behaviors that care about commands (context restoration, validation, derived geometry)
//! build a [`CommandInterceptor`] from the shared bus and subscribe per stage, without
//! knowing about each other or about the stack internals.

use std::rc::Rc;

use draftboard_events::{CommandTopic, DEFAULT_PRIORITY, Event, EventBus, EventType, ListenerId, ListenerResult, Stage};

/// Which commands a subscription applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFilter {
    /// Every command (the wildcard tier).
    All,
    /// Only the named commands. An empty list behaves like [`CommandFilter::All`].
    Commands(Vec<String>),
}

impl CommandFilter {
    fn topics(&self, stage: Stage) -> Vec<EventType> {
        match self {
            CommandFilter::Commands(names) if !names.is_empty() => names
                .iter()
                .map(|name| EventType::Command(CommandTopic::new(stage, name.as_str())))
                .collect(),
            _ => vec![EventType::Command(CommandTopic::any(stage))],
        }
    }
}

impl From<&str> for CommandFilter {
    fn from(value: &str) -> Self {
        CommandFilter::Commands(vec![value.to_string()])
    }
}

impl From<String> for CommandFilter {
    fn from(value: String) -> Self {
        CommandFilter::Commands(vec![value])
    }
}

impl From<Vec<&str>> for CommandFilter {
    fn from(value: Vec<&str>) -> Self {
        CommandFilter::Commands(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CommandFilter {
    fn from(value: [&str; N]) -> Self {
        CommandFilter::Commands(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Option<&str>> for CommandFilter {
    fn from(value: Option<&str>) -> Self {
        value.map_or(CommandFilter::All, CommandFilter::from)
    }
}

/// Registration helper for command lifecycle listeners.
///
/// Listeners receive the lifecycle [`Event`]; [`Event::command_name`] and
/// [`Event::context_mut`] give access to the command being processed.
#[derive(Debug, Clone)]
pub struct CommandInterceptor {
    bus: Rc<EventBus>,
}

impl CommandInterceptor {
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Subscribe to `stage` of the commands matching `filter`.
    ///
    /// `priority` defaults to [`DEFAULT_PRIORITY`], so independent behaviors at the same
    /// priority run in registration order.
    pub fn on<F>(
        &self,
        stage: Stage,
        filter: impl Into<CommandFilter>,
        priority: Option<i32>,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        let topics = filter.into().topics(stage);
        self.bus.on_with_priority(
            topics,
            priority.unwrap_or(DEFAULT_PRIORITY),
            callback,
        )
    }

    pub fn can_execute<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::CanExecute, filter, None, callback)
    }

    pub fn pre_execute<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::PreExecute, filter, None, callback)
    }

    pub fn execute<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::Execute, filter, None, callback)
    }

    pub fn post_execute<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::PostExecute, filter, None, callback)
    }

    pub fn executed<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::Executed, filter, None, callback)
    }

    pub fn revert<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::Revert, filter, None, callback)
    }

    pub fn reverted<F>(&self, filter: impl Into<CommandFilter>, callback: F) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.on(Stage::Reverted, filter, None, callback)
    }

    /// Drop a subscription made through this interceptor.
    pub fn off(&self, listener: ListenerId) {
        self.bus.remove_listener(listener);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use draftboard_events::Flow;

    fn recorder(interceptor: &CommandInterceptor, stage: Stage, filter: CommandFilter) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        interceptor.on(stage, filter, None, move |e: &mut Event| {
            s.borrow_mut().push(e.command_name().unwrap_or_default().to_string());
            Ok(Flow::Continue)
        });
        seen
    }

    fn fire(bus: &EventBus, stage: Stage, command: &str) {
        let mut event = Event::command(CommandTopic::new(stage, command), json!({}));
        bus.fire(&mut event).unwrap();
    }

    #[test]
    fn filters_by_single_name_list_or_all() {
        let bus = Rc::new(EventBus::new());
        let interceptor = CommandInterceptor::new(Rc::clone(&bus));

        let one = recorder(&interceptor, Stage::Executed, "a".into());
        let many = recorder(&interceptor, Stage::Executed, ["a", "b"].into());
        let all = recorder(&interceptor, Stage::Executed, CommandFilter::All);

        fire(&bus, Stage::Executed, "a");
        fire(&bus, Stage::Executed, "b");
        fire(&bus, Stage::Executed, "c");

        assert_eq!(*one.borrow(), vec!["a"]);
        assert_eq!(*many.borrow(), vec!["a", "b"]);
        assert_eq!(*all.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn stages_are_isolated() {
        let bus = Rc::new(EventBus::new());
        let interceptor = CommandInterceptor::new(Rc::clone(&bus));
        let reverts = recorder(&interceptor, Stage::Revert, CommandFilter::All);

        fire(&bus, Stage::Executed, "a");
        fire(&bus, Stage::Revert, "a");

        assert_eq!(*reverts.borrow(), vec!["a"]);
    }

    #[test]
    fn off_removes_every_topic_of_a_subscription() {
        let bus = Rc::new(EventBus::new());
        let interceptor = CommandInterceptor::new(Rc::clone(&bus));
        let id = interceptor.pre_execute(["a", "b"], |_: &mut Event| Ok(Flow::Continue));

        interceptor.off(id);

        assert!(!bus.has_listeners(&CommandTopic::new(Stage::PreExecute, "a").into()));
        assert!(!bus.has_listeners(&CommandTopic::new(Stage::PreExecute, "b").into()));
    }

    #[test]
    fn empty_name_list_means_all() {
        let bus = Rc::new(EventBus::new());
        let interceptor = CommandInterceptor::new(Rc::clone(&bus));
        let all = recorder(&interceptor, Stage::Reverted, CommandFilter::Commands(Vec::new()));

        fire(&bus, Stage::Reverted, "x");
        assert_eq!(*all.borrow(), vec!["x"]);
    }
}

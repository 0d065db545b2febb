//! Command lifecycle topics.
//!
//! The command stack announces every stage of a command on the bus. Instead of composing
//! `commandStack.<name>.<stage>` strings, a stage is a [`Stage`] variant paired with an
//! optional command name. A topic without a name is the **wildcard tier**: its listeners
//! observe the stage for every command.

/// One stage of a command's lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    CanExecute,
    PreExecute,
    Execute,
    PostExecute,
    Executed,
    Revert,
    Reverted,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::CanExecute,
        Stage::PreExecute,
        Stage::Execute,
        Stage::PostExecute,
        Stage::Executed,
        Stage::Revert,
        Stage::Reverted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::CanExecute => "canExecute",
            Stage::PreExecute => "preExecute",
            Stage::Execute => "execute",
            Stage::PostExecute => "postExecute",
            Stage::Executed => "executed",
            Stage::Revert => "revert",
            Stage::Reverted => "reverted",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bus key for a command lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandTopic {
    stage: Stage,
    command: Option<String>,
}

impl CommandTopic {
    /// Topic for `stage` of the command called `command`.
    pub fn new(stage: Stage, command: impl Into<String>) -> Self {
        Self {
            stage,
            command: Some(command.into()),
        }
    }

    /// Wildcard topic: `stage` of any command.
    pub fn any(stage: Stage) -> Self {
        Self {
            stage,
            command: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.command.is_none()
    }

    /// The wildcard topic a named topic falls back to after its own listeners ran.
    pub fn wildcard(&self) -> Option<CommandTopic> {
        self.command.as_ref().map(|_| CommandTopic::any(self.stage))
    }
}

impl core::fmt::Display for CommandTopic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.command {
            Some(name) => write!(f, "commandStack.{name}.{}", self.stage),
            None => write!(f, "commandStack.{}", self.stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_topic_falls_back_to_wildcard() {
        let topic = CommandTopic::new(Stage::Executed, "shape.resize");
        assert_eq!(topic.wildcard(), Some(CommandTopic::any(Stage::Executed)));
        assert_eq!(CommandTopic::any(Stage::Executed).wildcard(), None);
    }

    #[test]
    fn display_matches_legacy_event_names() {
        assert_eq!(
            CommandTopic::new(Stage::CanExecute, "shape.move").to_string(),
            "commandStack.shape.move.canExecute"
        );
        assert_eq!(CommandTopic::any(Stage::Revert).to_string(), "commandStack.revert");
    }
}

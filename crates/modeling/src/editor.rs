//! One editor instance: bus, stack, canvas and the behaviors wired between them.

use std::rc::Rc;

use draftboard_commands::{CommandError, CommandStack, CommandStackConfig};
use draftboard_events::EventBus;

use crate::behaviors::RootElementsBehavior;
use crate::canvas::{Canvas, SharedCanvas};
use crate::modeling::Modeling;

/// Owns the collaborators of a single diagram.
///
/// Nothing here is global; two editors never share listeners or history.
#[derive(Debug)]
pub struct Editor {
    bus: Rc<EventBus>,
    stack: Rc<CommandStack>,
    canvas: SharedCanvas,
    modeling: Modeling,
    root_elements: RootElementsBehavior,
}

impl Editor {
    pub fn new(canvas: Canvas) -> Result<Self, CommandError> {
        Self::with_config(canvas, CommandStackConfig::default())
    }

    pub fn with_config(canvas: Canvas, config: CommandStackConfig) -> Result<Self, CommandError> {
        let bus = Rc::new(EventBus::new());
        let stack = Rc::new(CommandStack::with_config(Rc::clone(&bus), config));
        let canvas = canvas.shared();

        Modeling::register_handlers(&stack, &canvas)?;
        let root_elements = RootElementsBehavior::new(Rc::clone(&bus), Rc::clone(&canvas));
        let modeling = Modeling::new(Rc::clone(&stack));

        tracing::info!(
            history_limit = ?stack.config().history_limit(),
            "editor initialized"
        );

        Ok(Self {
            bus,
            stack,
            canvas,
            modeling,
            root_elements,
        })
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn command_stack(&self) -> &Rc<CommandStack> {
        &self.stack
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    pub fn modeling(&self) -> &Modeling {
        &self.modeling
    }

    pub fn root_elements(&self) -> &RootElementsBehavior {
        &self.root_elements
    }
}

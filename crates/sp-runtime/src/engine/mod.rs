use std::collections::BTreeMap;
use std::rc::Rc;

use sp_core::{Position, RenderSink, State, Story};

mod boundary;
mod control_flow;
mod lifecycle;
mod step;

pub use lifecycle::{StoryEngineOptions, DEFAULT_MAX_STEPS_PER_WALK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Constructed, `start` not called yet.
    Idle,
    Running,
    AwaitingAdvance,
    AwaitingChoice,
    /// The current node ran out of steps or a jump target did not resolve.
    Halted,
    Ended,
}

impl EngineStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Halted | Self::Ended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepFlow {
    Next,
    Suspend,
    Transfer,
    Halt,
}

pub struct StoryEngine<S: RenderSink> {
    story: Rc<Story>,
    sink: S,
    max_steps_per_walk: usize,

    state: State,
    status: EngineStatus,
    current_node: Option<String>,
    cursor: usize,
    stage: BTreeMap<Position, String>,
}

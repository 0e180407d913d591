use std::rc::Rc;

use log::{debug, warn};
use sp_core::{resolve, RenderSink, SceneplayError};

use super::{EngineStatus, StepFlow, StoryEngine};

impl<S: RenderSink> StoryEngine<S> {
    /// Executes steps from the cursor until one suspends, halts, or ends.
    /// A failing step or a tripped guard leaves the engine `Halted`.
    pub(super) fn run_walk(&mut self) -> Result<(), SceneplayError> {
        self.status = EngineStatus::Running;
        let story = Rc::clone(&self.story);

        for _ in 0..self.max_steps_per_walk {
            let Some(node) = self.current_node.clone() else {
                self.status = EngineStatus::Halted;
                return Ok(());
            };

            let steps = match resolve(&story.nodes, &node) {
                Ok(steps) => steps,
                Err(error) => {
                    warn!("current node cannot be resolved: {}", error);
                    self.status = EngineStatus::Halted;
                    return Ok(());
                }
            };

            let Some(step) = steps.get(self.cursor) else {
                debug!(
                    "node \"{}\" exhausted after {} steps without a terminating step",
                    node,
                    steps.len()
                );
                self.status = EngineStatus::Halted;
                return Ok(());
            };

            let flow = match self.execute_step(step) {
                Ok(flow) => flow,
                Err(error) => {
                    warn!("step {} of \"{}\" failed: {}", self.cursor, node, error);
                    self.status = EngineStatus::Halted;
                    return Err(error);
                }
            };
            match flow {
                StepFlow::Next => self.cursor += 1,
                StepFlow::Transfer => {}
                StepFlow::Suspend => return Ok(()),
                StepFlow::Halt => {
                    self.status = EngineStatus::Halted;
                    return Ok(());
                }
            }
        }

        self.status = EngineStatus::Halted;
        Err(SceneplayError::with_location(
            "ENGINE_GUARD_EXCEEDED",
            format!(
                "Execution guard exceeded {} steps without waiting for the player.",
                self.max_steps_per_walk
            ),
            self.location(),
        ))
    }

    /// Moves to `target` with the cursor at 0. Returns false, leaving the
    /// position untouched, when the target does not resolve.
    pub(super) fn transfer_to(&mut self, target: &str) -> bool {
        if let Err(error) = resolve(&self.story.nodes, target) {
            warn!("{}: jump failed: {}", self.location(), error);
            return false;
        }
        debug!("{} -> \"{}\"", self.location(), target);
        self.current_node = Some(target.to_string());
        self.cursor = 0;
        true
    }

    pub(super) fn transfer_flow(&mut self, target: Option<&str>) -> StepFlow {
        let Some(target) = target else {
            warn!("{}: jump without a target node", self.location());
            return StepFlow::Halt;
        };
        if self.transfer_to(target) {
            StepFlow::Transfer
        } else {
            StepFlow::Halt
        }
    }
}

use std::rc::Rc;

use log::debug;
use sp_core::{resolve, RenderSink, SceneplayError, Step};

use super::{EngineStatus, StoryEngine};

impl<S: RenderSink> StoryEngine<S> {
    /// Continues past the dialogue or narration line being shown.
    pub fn advance(&mut self) -> Result<(), SceneplayError> {
        match self.status {
            EngineStatus::AwaitingAdvance => {
                self.cursor += 1;
                self.run_walk()
            }
            EngineStatus::Ended | EngineStatus::Halted => {
                debug!("advance ignored: story is {:?}", self.status);
                Ok(())
            }
            status => Err(SceneplayError::with_location(
                "ENGINE_NOT_AWAITING_ADVANCE",
                format!("advance is only valid while awaiting advance (status: {:?}).", status),
                self.location(),
            )),
        }
    }

    /// Picks option `index` of the pending choice. The option's effect runs
    /// before its jump.
    pub fn choose(&mut self, index: usize) -> Result<(), SceneplayError> {
        match self.status {
            EngineStatus::AwaitingChoice => {}
            EngineStatus::Ended | EngineStatus::Halted => {
                debug!("choose ignored: story is {:?}", self.status);
                return Ok(());
            }
            status => {
                return Err(SceneplayError::with_location(
                    "ENGINE_NOT_AWAITING_CHOICE",
                    format!("choose is only valid while awaiting a choice (status: {:?}).", status),
                    self.location(),
                ))
            }
        }

        let story = Rc::clone(&self.story);
        let node = self.current_node.as_deref().unwrap_or_default();
        let steps = resolve(&story.nodes, node)?;
        let Some(Step::Choice { options, .. }) = steps.get(self.cursor) else {
            return Err(SceneplayError::with_location(
                "ENGINE_CHOICE_STEP_MISSING",
                "Pending choice step is no longer at the cursor.",
                self.location(),
            ));
        };

        let Some(option) = options.get(index) else {
            return Err(SceneplayError::with_location(
                "ENGINE_CHOICE_INDEX",
                format!(
                    "Choice index {} is out of range ({} options).",
                    index,
                    options.len()
                ),
                self.location(),
            ));
        };

        if let Some(effect) = &option.effect {
            effect.call(&mut self.state)?;
        }

        match option.target.as_deref() {
            Some(target) => {
                if !self.transfer_to(target) {
                    self.status = EngineStatus::Halted;
                    return Ok(());
                }
            }
            None => self.cursor += 1,
        }
        self.run_walk()
    }
}

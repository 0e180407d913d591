use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, info};
use sp_core::{resolve, Position, RenderSink, SceneplayError, State, Story};

use super::{EngineStatus, StoryEngine};

pub const DEFAULT_MAX_STEPS_PER_WALK: usize = 10_000;

#[derive(Debug, Clone, Default)]
pub struct StoryEngineOptions {
    /// Upper bound on steps executed between two player signals.
    pub max_steps_per_walk: Option<usize>,
}

impl<S: RenderSink> StoryEngine<S> {
    pub fn new(story: Story, sink: S) -> Self {
        Self::with_options(story, sink, StoryEngineOptions::default())
    }

    pub fn with_options(story: Story, sink: S, options: StoryEngineOptions) -> Self {
        let state = story.initial_state();
        Self {
            story: Rc::new(story),
            sink,
            max_steps_per_walk: options
                .max_steps_per_walk
                .unwrap_or(DEFAULT_MAX_STEPS_PER_WALK),
            state,
            status: EngineStatus::Idle,
            current_node: None,
            cursor: 0,
            stage: BTreeMap::new(),
        }
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn current_node(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Which character currently stands at each occupied position.
    pub fn stage(&self) -> &BTreeMap<Position, String> {
        &self.stage
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn start(&mut self) -> Result<(), SceneplayError> {
        if self.status != EngineStatus::Idle {
            return Err(SceneplayError::new(
                "ENGINE_ALREADY_STARTED",
                "Engine has already been started; use restart instead.",
            ));
        }

        let start = self.story.start.clone();
        if let Err(error) = resolve(&self.story.nodes, &start) {
            return Err(SceneplayError::with_location(
                "ENGINE_START_NOT_FOUND",
                format!("Start node cannot be resolved: {}", error),
                start,
            ));
        }

        info!("starting story at \"{}\"", start);
        self.current_node = Some(start);
        self.cursor = 0;
        self.run_walk()
    }

    /// Throws away the playthrough and starts over from the story's start node.
    pub fn restart(&mut self) -> Result<(), SceneplayError> {
        debug!("restarting playthrough");
        self.reset();
        self.start()
    }

    fn reset(&mut self) {
        self.state = self.story.initial_state();
        self.status = EngineStatus::Idle;
        self.current_node = None;
        self.cursor = 0;
        self.stage.clear();
    }

    pub(super) fn location(&self) -> String {
        format!(
            "{}[{}]",
            self.current_node.as_deref().unwrap_or("<none>"),
            self.cursor
        )
    }
}

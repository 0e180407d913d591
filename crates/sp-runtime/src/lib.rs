//! Step-by-step playback of a [`sp_core::Story`].
//!
//! The engine walks the current node until a step needs the player
//! (dialogue, narration, choice), transfers control, or ends the story.
//! Player signals come back in through [`StoryEngine::advance`] and
//! [`StoryEngine::choose`].

mod engine;

pub use engine::{
    EngineStatus, StoryEngine, StoryEngineOptions, DEFAULT_MAX_STEPS_PER_WALK,
};
